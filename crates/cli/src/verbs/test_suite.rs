use std::sync::Arc;

use chronostore_core::{InMemoryBackend, StoreConfig, TemporalDataSource};
use chronostore_datastore::{CancelToken, DataSource, TemporalId};
use clap::{ArgMatches, Command};
use serde_json::json;

use crate::errors::CliError;

pub fn cli() -> Command {
    Command::new("test").about("Run the in-process seed scenario suite")
}

type Scenario = fn() -> Result<(), String>;

const SCENARIOS: &[(&str, Scenario)] = &[
    ("common dataset bootstrap", common_dataset_bootstrap),
    ("insert-update-read", insert_update_read),
    ("delete and re-save", delete_and_resave),
    ("dataset import override", dataset_import_override),
    ("imports cutoff", imports_cutoff),
    ("revision-time read-only", revision_time_read_only),
];

pub fn exec(_args: &ArgMatches) -> Result<(), CliError> {
    for (name, scenario) in SCENARIOS {
        match scenario() {
            Ok(()) => println!("ok   {name}"),
            Err(reason) => {
                println!("FAIL {name}: {reason}");
                return Err(CliError::ScenarioFailed { name: (*name).to_owned(), reason });
            }
        }
    }
    Ok(())
}

fn new_source() -> Arc<dyn DataSource> {
    Arc::new(TemporalDataSource::new(StoreConfig::default()).expect("default config is always valid"))
}

fn require(condition: bool, reason: &str) -> Result<(), String> {
    if condition { Ok(()) } else { Err(reason.to_owned()) }
}

fn common_dataset_bootstrap() -> Result<(), String> {
    let source = new_source();
    let cancel = CancelToken::never();
    let common = source.create_common(&cancel).map_err(|e| e.to_string())?;
    let looked_up = source.get_data_set("Common", TemporalId::EMPTY, &cancel).map_err(|e| e.to_string())?;
    require(looked_up == common, "get_data_set(\"Common\") did not return create_common's id")
}

fn insert_update_read() -> Result<(), String> {
    let source = new_source();
    let cancel = CancelToken::never();
    let common = source.create_common(&cancel).map_err(|e| e.to_string())?;
    source.save("A", "X", json!({"v": 1}), common, &cancel).map_err(|e| e.to_string())?;
    source.save("A", "X", json!({"v": 2}), common, &cancel).map_err(|e| e.to_string())?;
    let winner = source.load_or_null("A", "X", common, &cancel).map_err(|e| e.to_string())?;
    let v = winner.and_then(|r| r.payload.as_data().cloned()).and_then(|v| v.get("v").cloned());
    require(v == Some(json!(2)), "winning version was not v=2")
}

fn delete_and_resave() -> Result<(), String> {
    let source = new_source();
    let cancel = CancelToken::never();
    let common = source.create_common(&cancel).map_err(|e| e.to_string())?;
    source.save("A", "X", json!({"v": 1}), common, &cancel).map_err(|e| e.to_string())?;
    source.save("A", "X", json!({"v": 2}), common, &cancel).map_err(|e| e.to_string())?;
    source.delete("A", "X", common, &cancel).map_err(|e| e.to_string())?;
    require(source.load_or_null("A", "X", common, &cancel).map_err(|e| e.to_string())?.is_none(), "tombstone did not mask prior versions")?;
    source.save("A", "X", json!({"v": 3}), common, &cancel).map_err(|e| e.to_string())?;
    let winner = source.load_or_null("A", "X", common, &cancel).map_err(|e| e.to_string())?;
    let v = winner.and_then(|r| r.payload.as_data().cloned()).and_then(|v| v.get("v").cloned());
    require(v == Some(json!(3)), "re-save after tombstone was not visible")
}

fn dataset_import_override() -> Result<(), String> {
    let source = new_source();
    let cancel = CancelToken::never();
    let base = source.create_dataset("Base", vec![], TemporalId::EMPTY, &cancel).map_err(|e| e.to_string())?;
    let deriv = source.create_dataset("Deriv", vec![base], TemporalId::EMPTY, &cancel).map_err(|e| e.to_string())?;
    source.save("A", "Y", json!({"v": 10}), base, &cancel).map_err(|e| e.to_string())?;
    let via_deriv = source.load_or_null("A", "Y", deriv, &cancel).map_err(|e| e.to_string())?;
    require(
        via_deriv.and_then(|r| r.payload.as_data().cloned()).and_then(|v| v.get("v").cloned()) == Some(json!(10)),
        "Deriv did not see Base's write",
    )?;
    source.save("A", "Y", json!({"v": 20}), deriv, &cancel).map_err(|e| e.to_string())?;
    let via_deriv = source.load_or_null("A", "Y", deriv, &cancel).map_err(|e| e.to_string())?;
    require(
        via_deriv.and_then(|r| r.payload.as_data().cloned()).and_then(|v| v.get("v").cloned()) == Some(json!(20)),
        "Deriv's own write did not override Base's",
    )?;
    let via_base = source.load_or_null("A", "Y", base, &cancel).map_err(|e| e.to_string())?;
    require(
        via_base.and_then(|r| r.payload.as_data().cloned()).and_then(|v| v.get("v").cloned()) == Some(json!(10)),
        "Base read was affected by Deriv's write",
    )
}

fn imports_cutoff() -> Result<(), String> {
    let source = new_source();
    let cancel = CancelToken::never();
    let base = source.create_dataset("Base", vec![], TemporalId::EMPTY, &cancel).map_err(|e| e.to_string())?;
    let deriv = source.create_dataset("Deriv", vec![base], TemporalId::EMPTY, &cancel).map_err(|e| e.to_string())?;
    source.save("A", "Y", json!({"v": 10}), base, &cancel).map_err(|e| e.to_string())?;
    source.save("A", "Y", json!({"v": 20}), deriv, &cancel).map_err(|e| e.to_string())?;

    // Records the id right before Base's post-cutoff write without saving anything at it.
    let id_cut = source.save("A", "__marker", json!({}), base, &cancel).map_err(|e| e.to_string())?;
    source.delete("A", "__marker", base, &cancel).map_err(|e| e.to_string())?;
    source.save("A", "Y", json!({"v": 30}), base, &cancel).map_err(|e| e.to_string())?;
    source
        .save("DataSetDetail", &deriv.to_hex(), json!({"dataset_id": deriv, "imports_cutoff_time": id_cut}), TemporalId::EMPTY, &cancel)
        .map_err(|e| e.to_string())?;
    source.clear_dataset_cache();

    let via_deriv = source.load_or_null("A", "Y", deriv, &cancel).map_err(|e| e.to_string())?;
    let v = via_deriv.and_then(|r| r.payload.as_data().cloned()).and_then(|v| v.get("v").cloned());
    require(v == Some(json!(20)), "cutoff did not preserve Deriv's own write")?;
    require(v != Some(json!(30)), "Deriv saw Base's write made after the import cutoff")
}

fn revision_time_read_only() -> Result<(), String> {
    let backend = Arc::new(InMemoryBackend::new());
    let writable = TemporalDataSource::with_backend(backend.clone(), StoreConfig::default()).map_err(|e| e.to_string())?;
    let cancel = CancelToken::never();
    let common = writable.create_common(&cancel).map_err(|e| e.to_string())?;
    writable.save("A", "X", json!({"v": 1}), common, &cancel).map_err(|e| e.to_string())?;
    let after_first = writable.save("A", "X", json!({"v": 2}), common, &cancel).map_err(|e| e.to_string())?;

    let revised_config = StoreConfig { revised_before_id: Some(after_first), ..StoreConfig::default() };
    let revised = TemporalDataSource::with_backend(backend, revised_config).map_err(|e| e.to_string())?;
    require(revised.save("A", "X", json!({"v": 3}), TemporalId::EMPTY, &cancel).is_err(), "save was not rejected under revision cutoff")?;
    let winner = revised.load_or_null("A", "X", common, &cancel).map_err(|e| e.to_string())?;
    let v = winner.and_then(|r| r.payload.as_data().cloned()).and_then(|v| v.get("v").cloned());
    require(v == Some(json!(1)), "revision-time read did not see the pre-cutoff version")
}
