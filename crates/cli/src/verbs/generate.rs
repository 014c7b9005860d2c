use std::sync::Arc;

use chronostore_core::TemporalDataSource;
use chronostore_datastore::{CancelToken, DataSource, TemporalId};
use clap::{Arg, ArgMatches, Command};

use crate::config::{config_from_args, store_args};
use crate::errors::CliError;

pub fn cli() -> Command {
    Command::new("generate")
        .about("Create a dataset")
        .arg(Arg::new("dataset").long("dataset").required(true).help("Name of the dataset to create"))
        .arg(Arg::new("parents").long("parents").help("Comma-separated parent dataset names").default_value(""))
        .args(store_args())
}

pub fn exec(args: &ArgMatches) -> Result<(), CliError> {
    let name = args.get_one::<String>("dataset").expect("dataset is required");
    let parent_names = args.get_one::<String>("parents").map(String::as_str).unwrap_or_default();

    let source: Arc<dyn DataSource> = Arc::new(TemporalDataSource::new(config_from_args(args))?);
    let cancel = CancelToken::never();
    let parents = parent_names
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| source.get_data_set(name, TemporalId::EMPTY, &cancel))
        .collect::<Result<Vec<_>, _>>()?;

    let id = source.create_dataset(name, parents, TemporalId::EMPTY, &cancel)?;
    println!("{id}");
    Ok(())
}
