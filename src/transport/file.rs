//! Local filesystem transport for `file://` uris and absolute paths

use async_trait::async_trait;
use bytes::Bytes;

use super::{RequestData, ResponseData, Scheme, Transport, TransportError};

/// Reads local files. A missing file is an I/O failure, not a connection one.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTransport;

#[async_trait]
impl Transport for FileTransport {
    async fn fetch(&self, request: &RequestData) -> Result<ResponseData, TransportError> {
        let path = Scheme::File.crop(&request.uri);
        let data = tokio::fs::read(path).await?;
        Ok(ResponseData::from_bytes(Bytes::from(data)))
    }
}
