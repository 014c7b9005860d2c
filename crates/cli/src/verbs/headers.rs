use clap::{ArgMatches, Command};

use crate::errors::CliError;

pub fn cli() -> Command {
    Command::new("headers").about("Print the collection layout this build expects the backend to maintain")
}

pub fn exec(_args: &ArgMatches) -> Result<(), CliError> {
    println!("One physical collection per root record class.");
    println!("Document shape: {{ _id, _key, _dataset, _t, _deleted, data }}");
    println!("Required index: {{ _key: 1, _dataset: 1, _id: -1 }}, realized as a single");
    println!("composite key `key \\0 dataset complement(id)` in ascending byte order.");
    println!("Secondary index: bare `_id`, for load_by_id and class-wide scans.");
    Ok(())
}
