use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid key element at position {position}: {reason}")]
    InvalidKeyElement { position: usize, reason: String },

    #[error("badly formatted value: {0}")]
    BadFormat(String),
}
