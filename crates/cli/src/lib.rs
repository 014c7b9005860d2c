pub mod config;
pub mod errors;
pub mod verbs;

use clap::{ArgMatches, Command};

pub use errors::CliError;
use verbs::{exit, extract, generate, headers, run, test_suite};

pub fn get_subcommands() -> Vec<Command> {
    vec![run::cli(), extract::cli(), generate::cli(), headers::cli(), test_suite::cli(), exit::cli()]
}

pub fn exec_subcommand(cmd: &str, args: &ArgMatches) -> Result<(), CliError> {
    match cmd {
        "run" => run::exec(args),
        "extract" => extract::exec(args),
        "generate" => generate::exec(args),
        "headers" => headers::exec(args),
        "test" => test_suite::exec(args),
        "exit" => exit::exec(args),
        unknown => panic!("unregistered subcommand `{unknown}`, not reachable past clap's own dispatch"),
    }
}
