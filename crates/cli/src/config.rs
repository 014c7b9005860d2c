use chronostore_core::StoreConfig;
use clap::{Arg, ArgMatches};

/// Flags shared by every verb that opens a store: none of this CLI's verbs run against a
/// shared, persistent instance (no disk backend ships in this repository), so each
/// invocation constructs a fresh in-memory [`StoreConfig`] from these flags alone.
pub fn store_args() -> Vec<Arg> {
    vec![
        Arg::new("read-only").long("read-only").action(clap::ArgAction::SetTrue).help("Reject all writes"),
        Arg::new("non-temporal")
            .long("non-temporal")
            .action(clap::ArgAction::SetTrue)
            .help("Disable the versioned read path; a read returns only the newest write per (key, dataset)"),
        Arg::new("pid")
            .long("pid")
            .value_parser(clap::value_parser!(u16))
            .help("Process-id tag for the id generator (default: current process id)"),
    ]
}

pub fn config_from_args(args: &ArgMatches) -> StoreConfig {
    let mut config = StoreConfig { read_only: args.get_flag("read-only"), non_temporal: args.get_flag("non-temporal"), ..StoreConfig::default() };
    if let Some(&pid) = args.get_one::<u16>("pid") {
        config.pid = pid;
    } else {
        config.pid = std::process::id() as u16;
    }
    config
}
