use chrono::Local;
use tracing::{info, instrument, warn};

use super::record::{EventRecord, EventRecordBuilder, EventType};
use super::response::{EventReceipt, EventResponse, parse_response};
use crate::client::SefazClient;
use crate::core::{DocumentKey, Result, TaxpayerId};
use crate::dsig::sign;
use crate::transport::{Service, Transport, TransportRequest};

/// Element that carries the event signature.
const SIGNED_ELEMENT: &str = "infEvento";

impl<T: Transport> SefazClient<T> {
    /// Register a manifestation event for an NF-e addressed to `taxpayer`.
    ///
    /// `sequence` orders repeated events of the same type (1..=99); it is
    /// forced to 1 for [`EventType::Awareness`]. The event is stamped with
    /// the local time, signed on `infEvento` and sent to the configured
    /// event endpoint.
    ///
    /// # Errors
    ///
    /// Invalid identifiers or sequence fail with
    /// [`SefazError::InvalidArgument`](crate::core::SefazError::InvalidArgument)
    /// before anything is sent. A lot or event rejection fails with
    /// [`SefazError::ServiceRejected`](crate::core::SefazError::ServiceRejected)
    /// carrying the code of the level that failed.
    #[instrument(skip(self, justification), fields(event = event_type.code()))]
    pub async fn submit_event(
        &self,
        taxpayer: &str,
        document_key: &str,
        event_type: EventType,
        sequence: u32,
        justification: Option<&str>,
    ) -> Result<EventReceipt> {
        let taxpayer = TaxpayerId::parse(taxpayer)?;
        let document_key = DocumentKey::parse(document_key)?;
        let mut builder =
            EventRecordBuilder::new(event_type, taxpayer, document_key, Local::now().fixed_offset())
                .issuer_org(self.config().manifest_org.clone())
                .environment(self.config().environment)
                .sequence(sequence);
        if let Some(text) = justification {
            builder = builder.justification(text);
        }
        let record = builder.build()?;
        self.send_event(&record).await?.into_result()
    }

    /// Sign and send a prepared event, returning the two-level outcome
    /// without turning rejections into errors.
    #[instrument(skip(self, record), fields(id = %record.identifier()))]
    pub async fn send_event(&self, record: &EventRecord) -> Result<EventResponse> {
        self.check_credential()?;
        let envelope = record.to_envelope()?;
        let signed = sign(&envelope, SIGNED_ELEMENT, "Id", self.credential())?;

        let response = self
            .transport()
            .send(TransportRequest {
                service: Service::EventReception,
                endpoint: &self.config().event_endpoint,
                body: &signed,
                max_response_bytes: self.config().max_message_size,
            })
            .await?;

        let outcome = parse_response(&response)?;
        match &outcome {
            EventResponse::Registered(receipt) => {
                info!(protocol = ?receipt.protocol, "event registered");
            }
            EventResponse::LotRejected { code, reason } => {
                warn!(%code, %reason, "event lot rejected");
            }
            EventResponse::EventRejected { code, reason } => {
                warn!(%code, %reason, "event rejected");
            }
        }
        Ok(outcome)
    }
}
