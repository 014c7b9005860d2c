use clap::{ArgMatches, Command};

use crate::errors::CliError;

/// Accepted for parity with the verb list; this CLI is one-shot and non-interactive, so
/// there is no REPL loop for `exit` to break out of.
pub fn cli() -> Command {
    Command::new("exit").about("Terminate a REPL-style invocation")
}

pub fn exec(_args: &ArgMatches) -> Result<(), CliError> {
    Ok(())
}
