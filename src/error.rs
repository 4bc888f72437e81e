use thiserror::Error;

/// Unified error type for key decoding and shuffle runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A serialized key could not be parsed: truncated length prefix,
    /// a field overrunning its range, or a non UTF-8 field.
    #[error("Malformed key: {0}")]
    MalformedKey(String),
    /// A framed shuffle run record is truncated or fails its checksum.
    #[error("Corruption: {0}")]
    Corruption(String),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
