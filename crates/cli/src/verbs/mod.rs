pub mod exit;
pub mod extract;
pub mod generate;
pub mod headers;
pub mod run;
pub mod test_suite;
