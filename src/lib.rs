//! # sefaz-dfe
//!
//! Client for the Brazilian SEFAZ NF-e web services used by the recipient
//! of an invoice: document distribution (NFeDistribuicaoDFe) and
//! manifestation events (NFeRecepcaoEvento4).
//!
//! Documents are tracked by NSU, the per-taxpayer sequence number the
//! service assigns. [`SefazClient::fetch_all`] walks the stream from a
//! watermark; events are signed with enveloped XML-DSig (RSA-SHA1) before
//! submission. The network is reached through the [`transport::Transport`]
//! trait; enable `http` for the reqwest implementation.
//!
//! ## Quick Start
//!
//! ```no_run
//! # #[cfg(feature = "http")]
//! # async fn demo() -> sefaz_dfe::core::Result<()> {
//! use sefaz_dfe::core::ClientConfig;
//! use sefaz_dfe::dsig::{SigningCredential, Validity};
//! use sefaz_dfe::events::EventType;
//! use sefaz_dfe::transport::HttpsTransport;
//! use sefaz_dfe::SefazClient;
//!
//! let cert = std::fs::read_to_string("cert.pem").unwrap();
//! let key = std::fs::read_to_string("key.pem").unwrap();
//! let validity = Validity {
//!     not_before: "2024-01-01T00:00:00Z".parse().unwrap(),
//!     not_after: "2025-01-01T00:00:00Z".parse().unwrap(),
//! };
//! let credential = SigningCredential::from_pem(&cert, Some(&key), validity)?;
//! let transport = HttpsTransport::from_pem(cert.as_bytes(), key.as_bytes())?;
//! let client = SefazClient::new(ClientConfig::production(), credential, transport);
//!
//! let result = client.fetch_all("35", "12345678000195", 0, true).await?;
//! for doc in &result {
//!     println!("{:?} {}", doc.sequence_number, doc.schema);
//! }
//! // resume from result.last_sequence_number next time
//!
//! client
//!     .submit_event(
//!         "12345678000195",
//!         "35240112345678000195550010000000011000000019",
//!         EventType::Awareness,
//!         1,
//!         None,
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Client, distribution, events, XML signing, transport trait |
//! | `http` | `HttpsTransport`: SOAP 1.2 over reqwest/rustls with a client certificate |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod client;

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod distribution;

#[cfg(feature = "core")]
pub mod dsig;

#[cfg(feature = "core")]
pub mod events;

#[cfg(feature = "core")]
pub mod transport;

#[cfg(feature = "core")]
pub mod xml;

#[cfg(feature = "core")]
pub use crate::client::SefazClient;
#[cfg(feature = "core")]
pub use crate::core::*;
