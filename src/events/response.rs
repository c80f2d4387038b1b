use chrono::{DateTime, FixedOffset};

use crate::core::{Result, SefazError, ServiceStatus, StatusCode};
use crate::distribution::parse_timestamp;
use crate::xml::Element;

/// Event-level fields of a registered event (`retEvento/infEvento`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventReceipt {
    pub status: ServiceStatus,
    /// `nProt`.
    pub protocol: Option<String>,
    /// `dhRegEvento`.
    pub registered_at: Option<DateTime<FixedOffset>>,
    /// `xEvento`.
    pub description: Option<String>,
    /// `chNFe` echoed by the service.
    pub document_key: Option<String>,
}

/// Outcome of an event submission. Rejections can happen at lot level
/// (`retEnvEvento/cStat` other than 128) or at event level
/// (`retEvento/infEvento/cStat` other than 135).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventResponse {
    Registered(EventReceipt),
    LotRejected { code: String, reason: String },
    EventRejected { code: String, reason: String },
}

impl EventResponse {
    /// `true` when both the lot and the event were accepted.
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered(_))
    }

    /// The receipt, or the lot/event rejection as [`SefazError::ServiceRejected`].
    pub fn into_result(self) -> Result<EventReceipt> {
        match self {
            Self::Registered(receipt) => Ok(receipt),
            Self::LotRejected { code, reason } | Self::EventRejected { code, reason } => {
                Err(SefazError::rejected(code, reason))
            }
        }
    }
}

fn status_of(el: &Element, context: &str) -> Result<ServiceStatus> {
    let code = el
        .child_text("cStat")
        .ok_or_else(|| SefazError::Decode(format!("{context} without cStat")))?;
    Ok(ServiceStatus::new(&code, el.child_text("xMotivo").unwrap_or_default()))
}

/// Interpret a `retEnvEvento` message.
pub fn parse_response(response: &Element) -> Result<EventResponse> {
    if response.local_name() != "retEnvEvento" {
        return Err(SefazError::Decode(format!(
            "expected retEnvEvento, got <{}>",
            response.name
        )));
    }
    let lot = status_of(response, "retEnvEvento")?;
    if lot.code != StatusCode::LotProcessed {
        return Ok(EventResponse::LotRejected {
            code: lot.code.code().to_string(),
            reason: lot.reason,
        });
    }

    let info = response
        .child("retEvento")
        .and_then(|r| r.child("infEvento"))
        .ok_or_else(|| SefazError::Decode("retEnvEvento without retEvento/infEvento".into()))?;
    let status = status_of(info, "retEvento/infEvento")?;
    if status.code != StatusCode::EventRegistered {
        return Ok(EventResponse::EventRejected {
            code: status.code.code().to_string(),
            reason: status.reason,
        });
    }

    let registered_at = info
        .child_text("dhRegEvento")
        .map(|t| parse_timestamp(&t))
        .transpose()?;
    Ok(EventResponse::Registered(EventReceipt {
        status,
        protocol: info.child_text("nProt"),
        registered_at,
        description: info.child_text("xEvento"),
        document_key: info.child_text("chNFe"),
    }))
}
