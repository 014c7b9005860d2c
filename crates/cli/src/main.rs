use chronostore_cli::{exec_subcommand, get_subcommands};
use clap::Command;

fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let matches = get_command().get_matches();
    let (cmd, subcommand_args) = matches.subcommand().expect("subcommand_required enforces this");

    match exec_subcommand(cmd, subcommand_args) {
        Ok(()) => {}
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn get_command() -> Command {
    Command::new("chronostore")
        .about("A temporal, dataset-layered record store")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommands(get_subcommands())
}
