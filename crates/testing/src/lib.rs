//! A disposable, scoped test harness for exercising a [`TemporalDataSource`] in
//! isolation: each [`TestContext`] owns a fresh in-memory store and tears it down when
//! dropped, unless told to keep the data.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use chronostore_core::{StoreConfig, TemporalDataSource};
use chronostore_datastore::{CancelToken, Context, DataSource, TemporalId};

static NEXT_PID: AtomicU16 = AtomicU16::new(1);

/// Scoped acquisition of a fresh, isolated data source for one test.
///
/// Construction creates an in-memory [`TemporalDataSource`] and a root [`Context`]
/// pointed at it. Dropping the context deletes everything the store holds, unless
/// [`TestContext::keep_test_data`] was called first — mirroring a disposable test
/// database that is released at scope exit rather than left for the next test to trip
/// over.
pub struct TestContext {
    pub context: Context,
    data_source: Arc<TemporalDataSource>,
    keep: bool,
}

impl TestContext {
    /// Builds a fresh store with a distinct `pid` so that ids minted by concurrently
    /// running tests never collide even though every test shares the all-zero machine
    /// tag of an in-process store.
    pub fn new() -> TestContext {
        TestContext::with_config(StoreConfig::default())
    }

    pub fn with_config(mut config: StoreConfig) -> TestContext {
        config.pid = NEXT_PID.fetch_add(1, Ordering::Relaxed);
        let data_source =
            Arc::new(TemporalDataSource::new(config).expect("test store config must be internally consistent"));
        let context = Context::new(data_source.clone() as Arc<dyn DataSource>, TemporalId::EMPTY);
        TestContext { context, data_source, keep: false }
    }

    /// Creates the `Common` dataset and re-scopes this context's `data_set` to it,
    /// matching the bootstrap every seed scenario starts from.
    pub fn with_common(mut self) -> TestContext {
        let common = self
            .context
            .data_source
            .create_common(&CancelToken::never())
            .expect("create_common must succeed on a fresh store");
        self.context = self.context.with_data_set(common);
        self
    }

    /// Suppresses the teardown this context would otherwise run on drop.
    pub fn keep_test_data(mut self) -> TestContext {
        self.keep = true;
        self
    }

    pub fn data_source(&self) -> &Arc<TemporalDataSource> {
        &self.data_source
    }
}

impl Default for TestContext {
    fn default() -> TestContext {
        TestContext::new()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        if !self.keep {
            let _ = self.data_source.delete_db();
        }
    }
}

/// Saves `value` under `key` into `context.data_set`, wrapping the `chronostore-datastore`
/// error in `anyhow` for tests that want `?` without matching on error kind.
pub fn save_json(context: &Context, class_tag: &str, key: &str, value: serde_json::Value) -> anyhow::Result<TemporalId> {
    tracing::debug!(class_tag, key, "test harness save");
    Ok(context.data_source.save(class_tag, key, value, context.data_set, &CancelToken::never())?)
}
