//! Document distribution (NFeDistribuicaoDFe): batches by watermark, by
//! NSU and by access key, plus the full retrieval loop.

mod client;
pub mod codec;
mod message;
mod pagination;

use crate::core::DocumentKey;

pub use message::{
    DISTRIBUTION_VERSION, RESPONSE_TIMESTAMP_FORMAT, build_request, parse_response,
    parse_timestamp,
};
pub use pagination::paginate;

/// What a single distribution call asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistributionQuery {
    /// Documents after the given NSU (`distNSU/ultNSU`). 0 means the last
    /// 90 days.
    FromWatermark(u64),
    /// The single document stored under an NSU (`consNSU/NSU`).
    BySequence(u64),
    /// Documents for an access key (`consChNFe/chNFe`).
    ByKey(DocumentKey),
}
