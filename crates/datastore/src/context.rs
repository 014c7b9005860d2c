use std::sync::Arc;

use chronostore_primitives::TemporalId;
use tracing::Span;

use crate::traits::DataSource;

/// Ambient state threaded through record construction: the data source, the "current"
/// dataset, and a structured-logging span.
///
/// `log` is realized as a `tracing::Span` rather than a separate handle object: `tracing`
/// is itself the ambient logger, and a span is the idiomatic way to attach the context's
/// fields (`data_set`) to every event emitted while the context is in scope.
///
/// No generated domain record type ships in this crate, so there is no `init(context)`
/// callback to wire up yet, and no verify/assert sink for it to call into; see
/// DESIGN.md for the record-construction model this is a placeholder for.
#[derive(Clone)]
pub struct Context {
    pub data_source: Arc<dyn DataSource>,
    pub data_set: TemporalId,
    span: Span,
}

impl Context {
    pub fn new(data_source: Arc<dyn DataSource>, data_set: TemporalId) -> Context {
        let span = tracing::info_span!("context", data_set = %data_set);
        Context { data_source, data_set, span }
    }

    /// Re-scopes this context to a different dataset, keeping the same data source.
    /// Used by records that need to read from or write to an imported dataset other
    /// than the one they were constructed with.
    pub fn with_data_set(&self, data_set: TemporalId) -> Context {
        let span = tracing::info_span!("context", data_set = %data_set);
        Context { data_source: self.data_source.clone(), data_set, span }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}
