use std::path::PathBuf;

use thiserror::Error;

use crate::transport::TransportError;

/// Crate-wide result alias.
pub type Result<T, E = SefazError> = std::result::Result<T, E>;

/// Errors that can occur while talking to the SEFAZ services.
///
/// Every failure aborts the current operation. Nothing is retried
/// internally; retry and backoff are the caller's policy.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SefazError {
    /// Malformed caller input, detected before any network call.
    #[error("invalid argument `{field}`: {message}")]
    InvalidArgument {
        /// Name of the offending parameter (e.g. "cnpj", "chave").
        field: &'static str,
        /// Human-readable description.
        message: String,
    },

    /// A precondition of the operation does not hold (e.g. the signing
    /// certificate is outside its validity window).
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The transport collaborator failed. Surfaced unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A response payload could not be decompressed or parsed.
    #[error("decode error: {0}")]
    Decode(String),

    /// The service answered with a status code other than the expected one.
    ///
    /// `code` and `reason` are the raw `cStat` / `xMotivo` values so they can
    /// be matched against the SEFAZ documentation.
    #[error("{code} - {reason}")]
    ServiceRejected {
        /// Raw `cStat`.
        code: String,
        /// Raw `xMotivo`.
        reason: String,
    },

    /// The signing credential carries no private key.
    #[error("signing certificate has no private key")]
    NoPrivateKey,

    /// Building or embedding the XML signature failed.
    #[error("failed to sign XML document: {0}")]
    Signature(String),

    /// Writing a document to disk failed.
    #[error("cannot write {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The event type code is not one of the supported manifestation events.
    #[error("unsupported event type: {0}")]
    UnsupportedEventType(String),
}

impl SefazError {
    pub(crate) fn invalid_argument(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn rejected(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ServiceRejected {
            code: code.into(),
            reason: reason.into(),
        }
    }

    /// The offending parameter name, for [`SefazError::InvalidArgument`].
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidArgument { field, .. } => Some(field),
            _ => None,
        }
    }

    /// The raw `cStat`, for [`SefazError::ServiceRejected`].
    pub fn status_code(&self) -> Option<&str> {
        match self {
            Self::ServiceRejected { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<crate::xml::XmlError> for SefazError {
    fn from(e: crate::xml::XmlError) -> Self {
        Self::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_displays_code_and_reason() {
        let e = SefazError::rejected("656", "Rejeicao: Consumo Indevido");
        assert_eq!(e.to_string(), "656 - Rejeicao: Consumo Indevido");
        assert_eq!(e.status_code(), Some("656"));
        assert_eq!(e.field(), None);
    }

    #[test]
    fn invalid_argument_names_field() {
        let e = SefazError::invalid_argument("cnpj", "must have 14 digits");
        assert_eq!(e.field(), Some("cnpj"));
        assert!(e.to_string().contains("cnpj"));
    }
}
