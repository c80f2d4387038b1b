//! Recipient manifestation events (NFeRecepcaoEvento4).

mod record;
mod response;
mod submit;

pub use record::{
    EVENT_TIMESTAMP_FORMAT, EVENT_VERSION, EventRecord, EventRecordBuilder, EventType, LOT_ID,
    MAX_SEQUENCE,
};
pub use response::{EventReceipt, EventResponse, parse_response};
