use std::fmt;

use super::error::SefazError;

/// A SEFAZ status code (`cStat`).
///
/// Only the codes that drive control flow are named; every other value is
/// kept verbatim in [`StatusCode::Other`] and treated as a rejection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 137: no document found for the interested party.
    NoDocuments,
    /// 138: document(s) found for the interested party.
    DocumentsFound,
    /// 128: event lot processed.
    LotProcessed,
    /// 135: event registered and linked to the NF-e.
    EventRegistered,
    /// Any other code.
    Other(String),
}

impl StatusCode {
    /// Classify a `cStat` value; unknown codes are kept verbatim.
    pub fn parse(code: &str) -> Self {
        match code.trim() {
            "137" => Self::NoDocuments,
            "138" => Self::DocumentsFound,
            "128" => Self::LotProcessed,
            "135" => Self::EventRegistered,
            other => Self::Other(other.to_string()),
        }
    }

    /// The three-digit code as received.
    pub fn code(&self) -> &str {
        match self {
            Self::NoDocuments => "137",
            Self::DocumentsFound => "138",
            Self::LotProcessed => "128",
            Self::EventRegistered => "135",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// `cStat` + `xMotivo` as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStatus {
    pub code: StatusCode,
    pub reason: String,
}

impl ServiceStatus {
    /// Status from a `cStat` and its `xMotivo`.
    pub fn new(code: &str, reason: impl Into<String>) -> Self {
        Self {
            code: StatusCode::parse(code),
            reason: reason.into(),
        }
    }

    /// Turn this status into a [`SefazError::ServiceRejected`].
    pub fn into_rejection(self) -> SefazError {
        SefazError::rejected(self.code.code(), self.reason)
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code, self.reason)
    }
}
