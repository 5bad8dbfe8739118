// Error types module

use thiserror::Error;

use crate::cache::CacheError;
use crate::decoder::DecodeError;
use crate::transport::TransportError;

/// Cause carried by a failure callback
///
/// Every fetch/decode/persist failure of a load is funnelled into one of these
/// categories before it reaches the listener.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Network unreachable, connect refused or timed out
    #[error("connection failed: {0}")]
    Connection(#[source] TransportError),

    /// Disk, stream or transport I/O failure (including non-success status)
    #[error("I/O failure: {0}")]
    Io(#[source] std::io::Error),

    /// Persisted or downloaded bytes could not be decoded
    #[error("decode failed: {0}")]
    Decode(#[source] DecodeError),

    /// Decoder hit its allocation ceiling
    #[error("out of memory while decoding: {0}")]
    OutOfMemory(String),

    /// The request itself was malformed or the loader misused
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// Disk cache refused to store the download
    #[error("cache failure: {0}")]
    Cache(#[source] CacheError),

    /// Anything outside the categories above (panicked decode worker, ...)
    #[error("uncategorized failure: {0}")]
    Uncategorized(String),
}

impl From<TransportError> for LoadError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Connect { .. } => LoadError::Connection(err),
            TransportError::Io(e) => LoadError::Io(e),
            other => LoadError::Io(std::io::Error::new(std::io::ErrorKind::Other, other)),
        }
    }
}

impl From<DecodeError> for LoadError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Io(e) => LoadError::Io(e),
            DecodeError::OutOfMemory(msg) => LoadError::OutOfMemory(msg),
            other => LoadError::Decode(other),
        }
    }
}

impl From<CacheError> for LoadError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::IoError(e) => LoadError::Io(e),
            other => LoadError::Cache(other),
        }
    }
}

impl LoadError {
    /// Categorize a failed download-and-persist of `uri`.
    ///
    /// A body read that timed out is a connection failure, same as a timeout
    /// before the response headers arrived.
    pub(crate) fn from_save(uri: &str, err: CacheError) -> Self {
        match err {
            CacheError::IoError(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                LoadError::Connection(TransportError::Connect {
                    uri: uri.to_string(),
                    message: e.to_string(),
                })
            }
            other => other.into(),
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::Io(err)
    }
}
