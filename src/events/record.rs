use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};

use crate::core::{DocumentKey, Environment, OrgCode, Result, SefazError, TaxpayerId};
use crate::xml::{Element, NFE_NAMESPACE, XmlWriter};

/// `versao` of `envEvento`, `evento`, `verEvento` and `detEvento`.
pub const EVENT_VERSION: &str = "1.00";

/// `idLote`: one event per lot, always lot 1.
pub const LOT_ID: &str = "000000000000001";

/// Wire format of `dhEvento`.
pub const EVENT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Highest sequence number that fits the two-digit identifier suffix.
pub const MAX_SEQUENCE: u32 = 99;

/// Recipient manifestation events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// 210200, confirms the operation took place.
    Confirmation,
    /// 210210, acknowledges the NF-e exists. Unlocks the full XML download.
    Awareness,
    /// 210220, the recipient does not recognize the operation.
    UnknownOperation,
    /// 210240, the operation was not carried out.
    NotPerformed,
}

impl EventType {
    pub const ALL: [EventType; 4] = [
        Self::Confirmation,
        Self::Awareness,
        Self::UnknownOperation,
        Self::NotPerformed,
    ];

    /// `tpEvento`.
    pub fn code(self) -> &'static str {
        match self {
            Self::Confirmation => "210200",
            Self::Awareness => "210210",
            Self::UnknownOperation => "210220",
            Self::NotPerformed => "210240",
        }
    }

    /// `descEvento`, as fixed by the event schema (no accents).
    pub fn description(self) -> &'static str {
        match self {
            Self::Confirmation => "Confirmacao da Operacao",
            Self::Awareness => "Ciencia da Operacao",
            Self::UnknownOperation => "Desconhecimento da Operacao",
            Self::NotPerformed => "Operacao nao Realizada",
        }
    }

    /// Look up an event type by its six-digit `tpEvento` code.
    pub fn from_code(code: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.code() == code.trim())
            .ok_or_else(|| SefazError::UnsupportedEventType(code.to_string()))
    }
}

impl FromStr for EventType {
    type Err = SefazError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_code(s)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.description())
    }
}

/// One manifestation event, ready to be serialized into `envEvento`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    event_type: EventType,
    issuer_org: OrgCode,
    environment: Environment,
    taxpayer: TaxpayerId,
    document_key: DocumentKey,
    timestamp: DateTime<FixedOffset>,
    sequence_number: u32,
    justification: Option<String>,
}

impl EventRecord {
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn issuer_org(&self) -> &OrgCode {
        &self.issuer_org
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn taxpayer(&self) -> &TaxpayerId {
        &self.taxpayer
    }

    pub fn document_key(&self) -> &DocumentKey {
        &self.document_key
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    /// `nSeqEvento`. Always 1 for [`EventType::Awareness`].
    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    pub fn justification(&self) -> Option<&str> {
        self.justification.as_deref()
    }

    /// `"ID"` + event type code + access key + two-digit sequence.
    pub fn identifier(&self) -> String {
        format!(
            "ID{}{}{:02}",
            self.event_type.code(),
            self.document_key,
            self.sequence_number
        )
    }

    /// The unsigned `envEvento` message.
    pub fn to_envelope(&self) -> Result<Element> {
        let id = self.identifier();
        let timestamp = self.timestamp.format(EVENT_TIMESTAMP_FORMAT).to_string();
        let sequence = self.sequence_number.to_string();

        let mut w = XmlWriter::new();
        w.start_element_with_attrs(
            "envEvento",
            &[("xmlns", NFE_NAMESPACE), ("versao", EVENT_VERSION)],
        )?;
        w.text_element("idLote", LOT_ID)?;
        w.start_element_with_attrs("evento", &[("versao", EVENT_VERSION)])?;
        w.start_element_with_attrs("infEvento", &[("Id", id.as_str())])?;
        w.text_element("cOrgao", self.issuer_org.as_str())?;
        w.text_element("tpAmb", self.environment.code())?;
        w.text_element(self.taxpayer.element_name(), self.taxpayer.as_str())?;
        w.text_element("chNFe", self.document_key.as_str())?;
        w.text_element("dhEvento", &timestamp)?;
        w.text_element("tpEvento", self.event_type.code())?;
        w.text_element("nSeqEvento", &sequence)?;
        w.text_element("verEvento", EVENT_VERSION)?;
        w.start_element_with_attrs("detEvento", &[("versao", EVENT_VERSION)])?;
        w.text_element("descEvento", self.event_type.description())?;
        w.optional_text_element("xJust", self.justification.as_deref())?;
        w.end_element("detEvento")?;
        w.end_element("infEvento")?;
        w.end_element("evento")?;
        w.end_element("envEvento")?;
        Ok(w.into_element()?)
    }
}

/// Builder for [`EventRecord`].
///
/// ```
/// use sefaz_dfe::core::{DocumentKey, TaxpayerId};
/// use sefaz_dfe::events::{EventRecordBuilder, EventType};
///
/// let key = DocumentKey::parse("35240112345678000195550010000000011000000019").unwrap();
/// let taxpayer = TaxpayerId::parse("12345678000195").unwrap();
/// let timestamp = chrono::DateTime::parse_from_rfc3339("2024-01-15T10:30:00-03:00").unwrap();
///
/// let record = EventRecordBuilder::new(EventType::Confirmation, taxpayer, key, timestamp)
///     .sequence(2)
///     .build()
///     .unwrap();
/// assert_eq!(
///     record.identifier(),
///     "ID2102003524011234567800019555001000000001100000001902"
/// );
/// ```
pub struct EventRecordBuilder {
    event_type: EventType,
    issuer_org: OrgCode,
    environment: Environment,
    taxpayer: TaxpayerId,
    document_key: DocumentKey,
    timestamp: DateTime<FixedOffset>,
    sequence_number: u32,
    justification: Option<String>,
}

impl EventRecordBuilder {
    /// Start a production record for `cOrgao` 91 with sequence 1.
    pub fn new(
        event_type: EventType,
        taxpayer: TaxpayerId,
        document_key: DocumentKey,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            event_type,
            issuer_org: OrgCode::national(),
            environment: Environment::Production,
            taxpayer,
            document_key,
            timestamp,
            sequence_number: 1,
            justification: None,
        }
    }

    /// Override the `cOrgao` the event is addressed to.
    pub fn issuer_org(mut self, org: OrgCode) -> Self {
        self.issuer_org = org;
        self
    }

    /// Override the `tpAmb` of the event.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Ignored for [`EventType::Awareness`], whose sequence is always 1.
    pub fn sequence(mut self, sequence_number: u32) -> Self {
        self.sequence_number = sequence_number;
        self
    }

    /// Attach an `xJust` text. Blank text is dropped at build time.
    pub fn justification(mut self, text: impl Into<String>) -> Self {
        self.justification = Some(text.into());
        self
    }

    /// Validate the sequence and produce the record.
    pub fn build(self) -> Result<EventRecord> {
        let sequence_number = match self.event_type {
            EventType::Awareness => 1,
            _ => self.sequence_number,
        };
        if !(1..=MAX_SEQUENCE).contains(&sequence_number) {
            return Err(SefazError::invalid_argument(
                "sequencia",
                format!("sequence must be between 1 and {MAX_SEQUENCE}, got {sequence_number}"),
            ));
        }
        Ok(EventRecord {
            event_type: self.event_type,
            issuer_org: self.issuer_org,
            environment: self.environment,
            taxpayer: self.taxpayer,
            document_key: self.document_key,
            timestamp: self.timestamp,
            sequence_number,
            justification: self.justification.filter(|j| !j.trim().is_empty()),
        })
    }
}
