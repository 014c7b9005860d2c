use chronostore_core::{InMemoryBackend, StoreConfig, TemporalDataSource};
use chronostore_datastore::{CancelToken, DataSource, DatastoreError, OrderBy, Predicate, Query, TemporalId, CLASS_DATA_SOURCE};
use chronostore_testing::{save_json, TestContext};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

#[test]
fn common_dataset_bootstrap() {
    let ctx = TestContext::new().with_common();
    let looked_up = ctx.context.data_source.get_data_set("Common", TemporalId::EMPTY, &CancelToken::never()).unwrap();
    assert_eq!(looked_up, ctx.context.data_set);

    let lookup_list = ctx.context.data_source.build_lookup_list(looked_up, &CancelToken::never()).unwrap();
    assert_eq!(lookup_list.len(), 2);
    assert!(lookup_list.contains(&looked_up));
    assert!(lookup_list.contains(&TemporalId::EMPTY));
}

#[test]
fn insert_update_read() {
    let ctx = TestContext::new().with_common();
    save_json(&ctx.context, "A", "X", json!({"v": 1})).unwrap();
    save_json(&ctx.context, "A", "X", json!({"v": 2})).unwrap();
    let winner = ctx.context.data_source.load_or_null("A", "X", ctx.context.data_set, &CancelToken::never()).unwrap();
    let v = winner.and_then(|r| r.payload.as_data().cloned()).and_then(|v| v.get("v").cloned());
    assert_eq!(v, Some(json!(2)));
}

#[test]
fn delete_and_resave() {
    let ctx = TestContext::new().with_common();
    save_json(&ctx.context, "A", "X", json!({"v": 1})).unwrap();
    save_json(&ctx.context, "A", "X", json!({"v": 2})).unwrap();
    ctx.context.data_source.delete("A", "X", ctx.context.data_set, &CancelToken::never()).unwrap();
    assert!(ctx.context.data_source.load_or_null("A", "X", ctx.context.data_set, &CancelToken::never()).unwrap().is_none());
    save_json(&ctx.context, "A", "X", json!({"v": 3})).unwrap();
    let winner = ctx.context.data_source.load_or_null("A", "X", ctx.context.data_set, &CancelToken::never()).unwrap();
    let v = winner.and_then(|r| r.payload.as_data().cloned()).and_then(|v| v.get("v").cloned());
    assert_eq!(v, Some(json!(3)));
}

#[test]
fn dataset_import_override() {
    let ctx = TestContext::new();
    let source = &ctx.context.data_source;
    let base = source.create_dataset("Base", vec![], TemporalId::EMPTY, &CancelToken::never()).unwrap();
    let deriv = source.create_dataset("Deriv", vec![base], TemporalId::EMPTY, &CancelToken::never()).unwrap();

    source.save("A", "Y", json!({"v": 10}), base, &CancelToken::never()).unwrap();
    let via_deriv = source.load_or_null("A", "Y", deriv, &CancelToken::never()).unwrap();
    assert_eq!(via_deriv.and_then(|r| r.payload.as_data().cloned()).and_then(|v| v.get("v").cloned()), Some(json!(10)));

    source.save("A", "Y", json!({"v": 20}), deriv, &CancelToken::never()).unwrap();
    let via_deriv = source.load_or_null("A", "Y", deriv, &CancelToken::never()).unwrap();
    assert_eq!(via_deriv.and_then(|r| r.payload.as_data().cloned()).and_then(|v| v.get("v").cloned()), Some(json!(20)));

    let via_base = source.load_or_null("A", "Y", base, &CancelToken::never()).unwrap();
    assert_eq!(via_base.and_then(|r| r.payload.as_data().cloned()).and_then(|v| v.get("v").cloned()), Some(json!(10)));
}

#[test]
fn imports_cutoff_hides_later_base_writes_from_deriv() {
    let ctx = TestContext::new();
    let source = &ctx.context.data_source;
    let base = source.create_dataset("Base", vec![], TemporalId::EMPTY, &CancelToken::never()).unwrap();
    let deriv = source.create_dataset("Deriv", vec![base], TemporalId::EMPTY, &CancelToken::never()).unwrap();

    source.save("A", "Y", json!({"v": 10}), base, &CancelToken::never()).unwrap();
    source.save("A", "Y", json!({"v": 20}), deriv, &CancelToken::never()).unwrap();

    let id_cut = source.save("A", "__marker", json!({}), base, &CancelToken::never()).unwrap();
    source.delete("A", "__marker", base, &CancelToken::never()).unwrap();
    source.save("A", "Y", json!({"v": 30}), base, &CancelToken::never()).unwrap();

    source
        .save("DataSetDetail", &deriv.to_hex(), json!({"dataset_id": deriv, "imports_cutoff_time": id_cut}), TemporalId::EMPTY, &CancelToken::never())
        .unwrap();
    source.clear_dataset_cache();

    let via_deriv = source.load_or_null("A", "Y", deriv, &CancelToken::never()).unwrap();
    let v = via_deriv.and_then(|r| r.payload.as_data().cloned()).and_then(|v| v.get("v").cloned());
    assert_eq!(v, Some(json!(20)), "Deriv's own write must still win");

    let via_base = source.load_or_null("A", "Y", base, &CancelToken::never()).unwrap();
    let v = via_base.and_then(|r| r.payload.as_data().cloned()).and_then(|v| v.get("v").cloned());
    assert_eq!(v, Some(json!(30)), "Base itself is unaffected by an imports cutoff attached to Deriv");
}

#[test]
fn revision_time_read_only_sees_pre_cutoff_state_and_rejects_writes() {
    let backend = Arc::new(InMemoryBackend::new());
    let writable = TemporalDataSource::with_backend(backend.clone(), StoreConfig::default()).unwrap();
    let common = writable.create_common(&CancelToken::never()).unwrap();
    writable.save("A", "X", json!({"v": 1}), common, &CancelToken::never()).unwrap();
    let after_first = writable.save("A", "X", json!({"v": 2}), common, &CancelToken::never()).unwrap();
    writable.save("A", "X", json!({"v": 3}), common, &CancelToken::never()).unwrap();

    let revised_config = StoreConfig { revised_before_id: Some(after_first), ..StoreConfig::default() };
    let revised = TemporalDataSource::with_backend(backend, revised_config).unwrap();

    assert!(revised.save("A", "X", json!({"v": 4}), TemporalId::EMPTY, &CancelToken::never()).is_err());
    let winner = revised.load_or_null("A", "X", common, &CancelToken::never()).unwrap();
    let v = winner.and_then(|r| r.payload.as_data().cloned()).and_then(|v| v.get("v").cloned());
    assert_eq!(v, Some(json!(1)), "a revision-time view only sees versions minted before its cutoff");
}

#[test]
fn non_temporal_mode_returns_only_the_newest_write_per_key() {
    let config = StoreConfig { non_temporal: true, ..StoreConfig::default() };
    let ctx = TestContext::with_config(config).with_common();
    save_json(&ctx.context, "A", "X", json!({"v": 1})).unwrap();
    save_json(&ctx.context, "A", "X", json!({"v": 2})).unwrap();
    let winner = ctx.context.data_source.load_or_null("A", "X", ctx.context.data_set, &CancelToken::never()).unwrap();
    let v = winner.and_then(|r| r.payload.as_data().cloned()).and_then(|v| v.get("v").cloned());
    assert_eq!(v, Some(json!(2)));
}

#[test]
fn read_only_store_rejects_every_write() {
    let config = StoreConfig { read_only: true, ..StoreConfig::default() };
    let ctx = TestContext::with_config(config);
    assert!(ctx.context.data_source.save("A", "X", json!({"v": 1}), TemporalId::EMPTY, &CancelToken::never()).is_err());
    assert!(ctx.context.data_source.create_dataset("Extra", vec![], TemporalId::EMPTY, &CancelToken::never()).is_err());
}

#[test]
fn query_filters_and_orders_within_one_dataset() {
    let ctx = TestContext::new().with_common();
    save_json(&ctx.context, "A", "k1", json!({"n": 1})).unwrap();
    save_json(&ctx.context, "A", "k2", json!({"n": 2})).unwrap();
    save_json(&ctx.context, "A", "k3", json!({"n": 3})).unwrap();

    let query = Query::new().filter(Predicate::Gt("n".to_owned(), json!(1))).order_by(OrderBy::IdAsc);
    let results = ctx.context.data_source.query("A", ctx.context.data_set, query, &CancelToken::never()).unwrap();
    let values: Vec<_> = results.iter().filter_map(|r| r.payload.as_data()).filter_map(|v| v.get("n").cloned()).collect();
    assert_eq!(values, vec![json!(2), json!(3)]);
}

#[test]
fn load_by_id_ignores_lookup_visibility() {
    let ctx = TestContext::new().with_common();
    let id = save_json(&ctx.context, "A", "X", json!({"v": 1})).unwrap();
    let by_id = ctx.context.data_source.load_by_id("A", id, &CancelToken::never()).unwrap();
    assert!(by_id.is_some());
    assert!(ctx.context.data_source.load_by_id("Other", id, &CancelToken::never()).unwrap().is_none());
}

#[test]
fn a_raised_token_cancels_an_in_flight_save_without_writing() {
    let ctx = TestContext::new().with_common();
    let token = CancelToken::new();
    token.cancel();
    let err = ctx.context.data_source.save("A", "X", json!({"v": 1}), ctx.context.data_set, &token).unwrap_err();
    assert!(matches!(err, chronostore_datastore::DatastoreError::Canceled));
    let winner = ctx.context.data_source.load_or_null("A", "X", ctx.context.data_set, &CancelToken::never()).unwrap();
    assert!(winner.is_none(), "a canceled save must not have written anything");
}

#[test]
fn a_token_canceled_mid_scan_stops_a_query_in_progress() {
    let ctx = TestContext::new().with_common();
    save_json(&ctx.context, "A", "k1", json!({"n": 1})).unwrap();
    save_json(&ctx.context, "A", "k2", json!({"n": 2})).unwrap();
    let token = CancelToken::new();
    token.cancel();
    let err = ctx
        .context
        .data_source
        .query("A", ctx.context.data_set, Query::new(), &token)
        .unwrap_err();
    assert!(matches!(err, chronostore_datastore::DatastoreError::Canceled));
}

#[test]
fn a_key_containing_the_reserved_separator_is_rejected() {
    let ctx = TestContext::new().with_common();
    let err = ctx
        .context
        .data_source
        .save("A", "a;b", json!({"v": 1}), ctx.context.data_set, &CancelToken::never())
        .unwrap_err();
    assert!(matches!(err, chronostore_datastore::DatastoreError::KeyEncoding(_)));
}

#[test]
fn saving_a_root_only_class_outside_the_root_dataset_is_rejected() {
    let ctx = TestContext::new().with_common();
    let err = ctx
        .context
        .data_source
        .save(CLASS_DATA_SOURCE, "main", json!({}), ctx.context.data_set, &CancelToken::never())
        .unwrap_err();
    assert!(matches!(err, DatastoreError::MustSaveInRoot(class) if class == CLASS_DATA_SOURCE));
}

#[test]
fn create_dataset_outside_the_root_dataset_is_rejected() {
    let ctx = TestContext::new().with_common();
    let err = ctx
        .context
        .data_source
        .create_dataset("Nested", vec![], ctx.context.data_set, &CancelToken::never())
        .unwrap_err();
    assert!(matches!(err, DatastoreError::MustSaveInRoot(class) if class == chronostore_datastore::CLASS_DATASET));
}

#[test]
fn config_with_both_revision_bounds_set_is_a_conflict() {
    let config = StoreConfig {
        revised_before: Some(chrono::Utc::now()),
        revised_before_id: Some(TemporalId::EMPTY),
        ..StoreConfig::default()
    };
    assert!(matches!(config.revision_cutoff(), Err(DatastoreError::ConfigConflict)));
}

#[test]
fn create_dataset_with_a_nonexistent_parent_is_rejected() {
    let ctx = TestContext::new();
    let bogus_parent = TemporalId::from_parts(1, [9, 9, 9], 9, 9);
    let err = ctx
        .context
        .data_source
        .create_dataset("Child", vec![bogus_parent], TemporalId::EMPTY, &CancelToken::never())
        .unwrap_err();
    assert!(matches!(err, DatastoreError::DataSetNotFound(_)));
}
