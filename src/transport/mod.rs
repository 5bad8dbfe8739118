//! Transport client
//!
//! Fetches the raw bytes behind an image uri. The body is handed back as a
//! stream so the disk cache can persist it without buffering the whole image.
//!
//! # Supported Sources
//!
//! - `http://` and `https://` - fetched with reqwest
//! - `file://path` and bare absolute paths - read from the local filesystem

mod file;
mod http;

pub use self::file::FileTransport;
pub use self::http::HttpTransport;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::collections::HashMap;
use thiserror::Error;

use crate::config::NetworkConfig;

/// Body returned by a transport. Dropping the stream closes the underlying
/// connection or file.
pub type ByteStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// Uri scheme classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
    File,
    Unknown,
}

impl Scheme {
    pub fn of(uri: &str) -> Self {
        let lower = uri.get(..8).unwrap_or(uri).to_ascii_lowercase();
        if lower.starts_with("https://") {
            Scheme::Https
        } else if lower.starts_with("http://") {
            Scheme::Http
        } else if lower.starts_with("file://") || uri.starts_with('/') {
            Scheme::File
        } else {
            Scheme::Unknown
        }
    }

    /// Strip the scheme prefix, leaving the path for `file://` uris
    pub fn crop(self, uri: &str) -> &str {
        match self {
            Scheme::File => uri.strip_prefix("file://").unwrap_or(uri),
            _ => uri,
        }
    }
}

/// Outgoing fetch
#[derive(Debug, Clone, Default)]
pub struct RequestData {
    pub uri: String,
    pub headers: Option<HashMap<String, String>>,
}

impl RequestData {
    pub fn new(uri: impl Into<String>, headers: Option<HashMap<String, String>>) -> Self {
        Self {
            uri: uri.into(),
            headers,
        }
    }
}

/// Fetch result
pub struct ResponseData {
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

impl std::fmt::Debug for ResponseData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseData")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

impl ResponseData {
    /// Build a response from an in-memory body
    pub fn from_bytes(bytes: Bytes) -> Self {
        Self {
            content_length: Some(bytes.len() as u64),
            body: Box::pin(futures::stream::once(async move { Ok(bytes) })),
        }
    }
}

/// Transport failures. Only `Connect` is the connection kind; everything else
/// is treated as I/O.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection to {uri} failed: {message}")]
    Connect { uri: String, message: String },

    #[error("unexpected status {status} from {uri}")]
    Status { uri: String, status: u16 },

    #[error("unsupported uri scheme: {0}")]
    UnsupportedScheme(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    pub fn is_connect(&self) -> bool {
        matches!(self, TransportError::Connect { .. })
    }
}

/// Fetches bytes for a uri
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: &RequestData) -> Result<ResponseData, TransportError>;
}

/// Routes each request to the http or file transport by scheme
pub struct DefaultTransport {
    http: HttpTransport,
    file: FileTransport,
}

impl DefaultTransport {
    pub fn new(config: &NetworkConfig) -> Result<Self, TransportError> {
        Ok(Self {
            http: HttpTransport::new(config)?,
            file: FileTransport,
        })
    }
}

#[async_trait]
impl Transport for DefaultTransport {
    async fn fetch(&self, request: &RequestData) -> Result<ResponseData, TransportError> {
        match Scheme::of(&request.uri) {
            Scheme::Http | Scheme::Https => self.http.fetch(request).await,
            Scheme::File => self.file.fetch(request).await,
            Scheme::Unknown => Err(TransportError::UnsupportedScheme(request.uri.clone())),
        }
    }
}
