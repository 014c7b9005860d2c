use std::fs;
use std::sync::Arc;

use chronostore_core::{StoreConfig, TemporalDataSource};
use chronostore_datastore::{CancelToken, DataSource, TemporalId};
use clap::{Arg, ArgMatches, Command};

use crate::config::{config_from_args, store_args};
use crate::errors::CliError;

/// A tiny line-oriented script for smoke-testing a store end to end: one directive per
/// line, `#`-prefixed lines and blank lines ignored.
///
///   `DATASET <name> [parent1,parent2,...]`  create a dataset
///   `USE <name>`                            switch the dataset later directives target
///   `SAVE <class> <key> <json>`             save a record
///   `DELETE <class> <key>`                  write a tombstone
///   `LOAD <class> <key>`                    load the winning record and print it
///
/// Every run starts inside the `Common` dataset, created fresh for the run.
pub fn cli() -> Command {
    Command::new("run")
        .about("Run a save/load/delete script against a fresh in-memory store")
        .arg(Arg::new("script").required(true).help("Path to the script file"))
        .args(store_args())
}

pub fn exec(args: &ArgMatches) -> Result<(), CliError> {
    let path = args.get_one::<String>("script").expect("script is required");
    let text = fs::read_to_string(path).map_err(|source| CliError::ScriptIo { path: path.clone(), source })?;

    let source: Arc<dyn DataSource> = Arc::new(TemporalDataSource::new(config_from_args(args))?);
    let cancel = CancelToken::never();
    let common = source.create_common(&cancel)?;
    let mut current = common;

    for (zero_based_line, raw) in text.lines().enumerate() {
        let line = zero_based_line + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.splitn(2, char::is_whitespace);
        let directive = parts.next().unwrap_or_default();
        let rest = parts.next().unwrap_or_default().trim();

        match directive {
            "DATASET" => {
                let mut fields = rest.splitn(2, char::is_whitespace);
                let name = fields.next().unwrap_or_default();
                if name.is_empty() {
                    return Err(syntax(path, line, "DATASET requires a name"));
                }
                let parents = fields
                    .next()
                    .unwrap_or_default()
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|name| source.get_data_set(name, TemporalId::EMPTY, &cancel))
                    .collect::<Result<Vec<_>, _>>()?;
                let id = source.create_dataset(name, parents, TemporalId::EMPTY, &cancel)?;
                println!("dataset {name} = {id}");
            }
            "USE" => {
                if rest.is_empty() {
                    return Err(syntax(path, line, "USE requires a dataset name"));
                }
                current = source.get_data_set(rest, TemporalId::EMPTY, &cancel)?;
            }
            "SAVE" => {
                let mut fields = rest.splitn(3, char::is_whitespace);
                let class_tag = fields.next().unwrap_or_default();
                let key = fields.next().unwrap_or_default();
                let json = fields.next().unwrap_or_default();
                if class_tag.is_empty() || key.is_empty() {
                    return Err(syntax(path, line, "SAVE requires <class> <key> <json>"));
                }
                let payload: serde_json::Value = serde_json::from_str(json)
                    .map_err(|source| CliError::ScriptPayload { path: path.clone(), line, source })?;
                let id = source.save(class_tag, key, payload, current, &cancel)?;
                println!("saved {class_tag} {key} = {id}");
            }
            "DELETE" => {
                let mut fields = rest.splitn(2, char::is_whitespace);
                let class_tag = fields.next().unwrap_or_default();
                let key = fields.next().unwrap_or_default();
                if class_tag.is_empty() || key.is_empty() {
                    return Err(syntax(path, line, "DELETE requires <class> <key>"));
                }
                let id = source.delete(class_tag, key, current, &cancel)?;
                println!("deleted {class_tag} {key} = {id}");
            }
            "LOAD" => {
                let mut fields = rest.splitn(2, char::is_whitespace);
                let class_tag = fields.next().unwrap_or_default();
                let key = fields.next().unwrap_or_default();
                if class_tag.is_empty() || key.is_empty() {
                    return Err(syntax(path, line, "LOAD requires <class> <key>"));
                }
                match source.load_or_null(class_tag, key, current, &cancel)? {
                    Some(record) => println!("{class_tag} {key} -> {}", record.payload.as_data().cloned().unwrap_or_default()),
                    None => println!("{class_tag} {key} -> nil"),
                }
            }
            other => return Err(syntax(path, line, &format!("unknown directive `{other}`"))),
        }
    }
    Ok(())
}

fn syntax(path: &str, line: usize, reason: &str) -> CliError {
    CliError::ScriptSyntax { path: path.to_owned(), line, reason: reason.to_owned() }
}
