//! The client handle every operation hangs off.

use chrono::Utc;

use crate::core::{ClientConfig, Result};
use crate::dsig::SigningCredential;
use crate::transport::Transport;

/// Client for the SEFAZ distribution and event services.
///
/// Holds immutable state only, so one instance can serve concurrent calls.
/// Operations live in [`distribution`](crate::distribution) and
/// [`events`](crate::events).
#[derive(Debug)]
pub struct SefazClient<T> {
    config: ClientConfig,
    credential: SigningCredential,
    transport: T,
}

impl<T: Transport> SefazClient<T> {
    /// Nothing is validated until the first call.
    pub fn new(config: ClientConfig, credential: SigningCredential, transport: T) -> Self {
        Self {
            config,
            credential,
            transport,
        }
    }

    /// Configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Credential used for signing and the validity check.
    pub fn credential(&self) -> &SigningCredential {
        &self.credential
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Refuse to talk to the service with a certificate outside its
    /// validity window.
    pub(crate) fn check_credential(&self) -> Result<()> {
        self.credential.check_validity(Utc::now())
    }
}
