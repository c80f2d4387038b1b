//! The transport collaborator.
//!
//! The core only hands a request element to a [`Transport`] and awaits the
//! response element. TLS, client certificates, timeouts and connection
//! handling belong to the implementation. With the `http` feature,
//! [`HttpsTransport`] talks SOAP 1.2 over reqwest.

#[cfg(feature = "http")]
mod http;
pub mod soap;

use async_trait::async_trait;
use thiserror::Error;

use crate::xml::Element;

#[cfg(feature = "http")]
pub use http::HttpsTransport;

/// Remote web service addressed by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// NFeDistribuicaoDFe, operation `nfeDistDFeInteresse`.
    Distribution,
    /// NFeRecepcaoEvento4, operation `nfeRecepcaoEvento`.
    EventReception,
}

/// One request handed to the transport.
#[derive(Debug, Clone, Copy)]
pub struct TransportRequest<'a> {
    pub service: Service,
    pub endpoint: &'a str,
    /// The SEFAZ message (`distDFeInt`, `envEvento`), without SOAP envelope.
    pub body: &'a Element,
    /// Responses larger than this should be refused.
    pub max_response_bytes: usize,
}

/// Failure raised by a transport. Propagated to callers unchanged.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// Connection, TLS or I/O failure.
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response exceeded the size hint.
    #[error("response of {size} bytes exceeds the limit of {limit} bytes")]
    MessageTooLarge { size: usize, limit: usize },

    /// The response envelope did not have the expected shape.
    #[error("unexpected response envelope: {0}")]
    Envelope(String),

    /// Invalid client identity (certificate or key).
    #[error("invalid client identity: {0}")]
    Identity(String),
}

/// Sends one SEFAZ message and returns the service's reply.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest<'_>) -> Result<Element, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: TransportRequest<'_>) -> Result<Element, TransportError> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, request: TransportRequest<'_>) -> Result<Element, TransportError> {
        (**self).send(request).await
    }
}
