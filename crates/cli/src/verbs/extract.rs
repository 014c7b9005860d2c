use std::sync::Arc;

use chronostore_core::TemporalDataSource;
use chronostore_datastore::{CancelToken, DataSource, TemporalId};
use clap::{Arg, ArgMatches, Command};

use crate::config::{config_from_args, store_args};
use crate::errors::CliError;

// Each invocation opens a fresh in-memory store (no disk backend ships in this
// repository), so `extract` is chiefly useful composed after `run` against the same
// process, or as a documented stub for a future persistent backend.
pub fn cli() -> Command {
    Command::new("extract")
        .about("Load and print the winning record for a key in a dataset")
        .arg(Arg::new("key").required(true))
        .arg(Arg::new("class").long("class").default_value("Record").help("Record class tag"))
        .arg(Arg::new("dataset").long("dataset").required(true).help("Dataset name to load from"))
        .args(store_args())
}

pub fn exec(args: &ArgMatches) -> Result<(), CliError> {
    let key = args.get_one::<String>("key").expect("key is required");
    let class_tag = args.get_one::<String>("class").expect("has a default");
    let dataset_name = args.get_one::<String>("dataset").expect("dataset is required");

    let source: Arc<dyn DataSource> = Arc::new(TemporalDataSource::new(config_from_args(args))?);
    let cancel = CancelToken::never();
    let dataset = source.get_data_set(dataset_name, TemporalId::EMPTY, &cancel)?;

    match source.load_or_null(class_tag, key, dataset, &cancel)? {
        Some(record) => {
            let payload = record.payload.as_data().cloned().unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string()));
        }
        None => println!("nil"),
    }
    Ok(())
}
