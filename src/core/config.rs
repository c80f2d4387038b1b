use serde::{Deserialize, Serialize};

use super::error::Result;
use super::ids::OrgCode;

/// Production distribution endpoint (NFeDistribuicaoDFe).
pub const PRODUCTION_DISTRIBUTION_URL: &str =
    "https://www1.nfe.fazenda.gov.br/NFeDistribuicaoDFe/NFeDistribuicaoDFe.asmx";

/// Production event reception endpoint (NFeRecepcaoEvento4).
pub const PRODUCTION_EVENT_URL: &str =
    "https://www.nfe.fazenda.gov.br/NFeRecepcaoEvento4/NFeRecepcaoEvento4.asmx";

/// Homologation distribution endpoint.
pub const HOMOLOGATION_DISTRIBUTION_URL: &str =
    "https://hom1.nfe.fazenda.gov.br/NFeDistribuicaoDFe/NFeDistribuicaoDFe.asmx";

/// Homologation event reception endpoint.
pub const HOMOLOGATION_EVENT_URL: &str =
    "https://hom1.nfe.fazenda.gov.br/NFeRecepcaoEvento4/NFeRecepcaoEvento4.asmx";

/// Upper bound handed to the transport for response sizes.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 999_999_999;

/// Target environment (`tpAmb`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// 1: production, documents have fiscal validity.
    Production,
    /// 2: homologation (staging).
    Homologation,
}

impl Environment {
    /// `tpAmb` value: `1` production, `2` homologation.
    pub fn code(self) -> &'static str {
        match self {
            Self::Production => "1",
            Self::Homologation => "2",
        }
    }
}

/// Immutable per-client configuration.
///
/// ```
/// use sefaz_dfe::core::{ClientConfig, Environment};
///
/// let config = ClientConfig::homologation()
///     .with_manifest_org("35")
///     .unwrap();
/// assert_eq!(config.environment, Environment::Homologation);
/// assert_eq!(config.manifest_org.as_str(), "35");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub environment: Environment,
    /// NFeDistribuicaoDFe endpoint.
    pub distribution_endpoint: String,
    /// NFeRecepcaoEvento4 endpoint.
    pub event_endpoint: String,
    /// Organ receiving manifestation events (`cOrgao`), 91 by default.
    #[serde(default)]
    pub manifest_org: OrgCode,
    /// Response size hint passed to the transport.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

fn default_max_message_size() -> usize {
    DEFAULT_MAX_MESSAGE_SIZE
}

impl ClientConfig {
    /// National production endpoints, `cOrgao` 91.
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            distribution_endpoint: PRODUCTION_DISTRIBUTION_URL.to_string(),
            event_endpoint: PRODUCTION_EVENT_URL.to_string(),
            manifest_org: OrgCode::national(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// National homologation endpoints, `cOrgao` 91.
    pub fn homologation() -> Self {
        Self {
            environment: Environment::Homologation,
            distribution_endpoint: HOMOLOGATION_DISTRIBUTION_URL.to_string(),
            event_endpoint: HOMOLOGATION_EVENT_URL.to_string(),
            manifest_org: OrgCode::national(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Replace the NFeDistribuicaoDFe endpoint.
    pub fn with_distribution_endpoint(mut self, url: impl Into<String>) -> Self {
        self.distribution_endpoint = url.into();
        self
    }

    /// Replace the NFeRecepcaoEvento4 endpoint.
    pub fn with_event_endpoint(mut self, url: impl Into<String>) -> Self {
        self.event_endpoint = url.into();
        self
    }

    /// Set the organ receiving manifestation events. Fails on an unknown
    /// IBGE code.
    pub fn with_manifest_org(mut self, code: &str) -> Result<Self> {
        self.manifest_org = OrgCode::parse(code)?;
        Ok(self)
    }

    /// Cap on the size of a response body, in bytes.
    pub fn with_max_message_size(mut self, bytes: usize) -> Self {
        self.max_message_size = bytes;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::production()
    }
}
