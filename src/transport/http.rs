//! HTTP(S) transport backed by reqwest

use async_trait::async_trait;
use futures::TryStreamExt;

use super::{RequestData, ResponseData, Transport, TransportError};
use crate::config::NetworkConfig;

/// Fetches `http://` and `https://` uris
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a new transport with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Io` if the client cannot be built
    /// (e.g., TLS backend initialisation failure).
    pub fn new(config: &NetworkConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.read_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                TransportError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Failed to create HTTP client: {}", e),
                ))
            })?;

        Ok(Self { client })
    }

    fn classify(uri: &str, err: reqwest::Error) -> TransportError {
        if err.is_connect() || err.is_timeout() {
            TransportError::Connect {
                uri: uri.to_string(),
                message: err.to_string(),
            }
        } else {
            TransportError::Io(std::io::Error::new(std::io::ErrorKind::Other, err))
        }
    }

    /// Body stream errors surface as `io::Error`; keep timeouts recognisable
    fn body_error(err: reqwest::Error) -> std::io::Error {
        let kind = if err.is_timeout() {
            std::io::ErrorKind::TimedOut
        } else {
            std::io::ErrorKind::Other
        };
        std::io::Error::new(kind, err)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: &RequestData) -> Result<ResponseData, TransportError> {
        let mut builder = self.client.get(&request.uri);
        if let Some(headers) = &request.headers {
            for (name, value) in headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::classify(&request.uri, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                uri: request.uri.clone(),
                status: status.as_u16(),
            });
        }

        tracing::debug!(
            uri = %request.uri,
            status = status.as_u16(),
            content_length = ?response.content_length(),
            "Image response received"
        );

        let content_length = response.content_length();
        let body = response
            .bytes_stream()
            .map_err(Self::body_error);

        Ok(ResponseData {
            content_length,
            body: Box::pin(body),
        })
    }
}
