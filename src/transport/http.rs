//! reqwest-backed transport with client-certificate authentication.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};

use super::{Transport, TransportError, TransportRequest, soap};
use crate::xml::{Element, parse};

fn network(e: reqwest::Error) -> TransportError {
    TransportError::Network(e.to_string())
}

/// SOAP 1.2 over HTTPS, authenticated with the taxpayer's A1 certificate.
#[derive(Debug, Clone)]
pub struct HttpsTransport {
    client: reqwest::Client,
}

impl HttpsTransport {
    /// Build a transport from the PEM-encoded certificate (chain) and private
    /// key of the client identity.
    pub fn from_pem(certificate_pem: &[u8], private_key_pem: &[u8]) -> Result<Self, TransportError> {
        let mut pem = certificate_pem.to_vec();
        pem.push(b'\n');
        pem.extend_from_slice(private_key_pem);
        let identity = reqwest::Identity::from_pem(&pem)
            .map_err(|e| TransportError::Identity(e.to_string()))?;
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .identity(identity)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(network)?;
        Ok(Self { client })
    }

    /// Use a preconfigured client (identity, proxies, timeouts).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpsTransport {
    #[instrument(skip(self, request), fields(service = ?request.service, endpoint = %request.endpoint))]
    async fn send(&self, request: TransportRequest<'_>) -> Result<Element, TransportError> {
        let body = soap::wrap(request.service, request.body)
            .map_err(|e| TransportError::Envelope(e.to_string()))?;
        let limit = request.max_response_bytes;

        let resp = self
            .client
            .post(request.endpoint)
            .header(CONTENT_TYPE, request.service.content_type())
            .body(body)
            .send()
            .await
            .map_err(network)?;

        let status = resp.status();
        if let Some(len) = resp.content_length() {
            let size = usize::try_from(len).unwrap_or(usize::MAX);
            if size > limit {
                return Err(TransportError::MessageTooLarge { size, limit });
            }
        }
        let text = resp.text().await.map_err(network)?;
        if text.len() > limit {
            return Err(TransportError::MessageTooLarge {
                size: text.len(),
                limit,
            });
        }
        debug!(status = status.as_u16(), bytes = text.len(), "SOAP response received");

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope = parse(&text).map_err(|e| TransportError::Envelope(e.to_string()))?;
        soap::unwrap(request.service, &envelope)
    }
}
