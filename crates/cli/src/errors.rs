use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] chronostore_datastore::DatastoreError),

    #[error("{path}: {source}")]
    ScriptIo { path: String, #[source] source: std::io::Error },

    #[error("{path}:{line}: {reason}")]
    ScriptSyntax { path: String, line: usize, reason: String },

    #[error("{path}:{line}: malformed JSON payload: {source}")]
    ScriptPayload { path: String, line: usize, #[source] source: serde_json::Error },

    #[error("scenario `{name}` failed: {reason}")]
    ScenarioFailed { name: String, reason: String },
}
