//! Watermark-driven retrieval of the whole NSU stream.

use std::collections::HashSet;
use std::future::Future;

use tracing::{debug, info, warn};

use crate::core::{AccumulatedResult, BatchResult, Result, StatusCode};

/// Run the retrieval loop over `fetch`, which issues one "from watermark"
/// query for the given NSU.
///
/// The watermark and maximum are taken from every response before its
/// status is classified. 137 contributes nothing, 138 appends the batch's
/// documents not seen before (by NSU), anything else aborts with
/// [`SefazError::ServiceRejected`](crate::core::SefazError::ServiceRejected)
/// and drops what was accumulated. The loop continues while `all_batches`
/// is set and the watermark is below the maximum.
pub async fn paginate<F, Fut>(start: u64, all_batches: bool, mut fetch: F) -> Result<AccumulatedResult>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<BatchResult>>,
{
    let mut last = start;
    let mut max = start;
    let mut documents = Vec::new();
    let mut seen = HashSet::new();
    let mut batches = 0usize;

    loop {
        let batch = fetch(last).await?;
        batches += 1;

        let previous = last;
        if let Some(n) = batch.last_sequence_number {
            last = n;
        }
        if let Some(m) = batch.max_sequence_number {
            max = m;
        }
        let response_timestamp = batch.response_timestamp;

        match batch.status.code {
            StatusCode::NoDocuments => {
                debug!(ult_nsu = last, max_nsu = max, "no documents in batch");
            }
            StatusCode::DocumentsFound => {
                debug!(
                    ult_nsu = last,
                    max_nsu = max,
                    documents = batch.documents.len(),
                    "documents found"
                );
                let before = documents.len();
                let offered = batch.documents.len();
                documents.extend(
                    batch
                        .documents
                        .into_iter()
                        .filter(|d| d.sequence_number.is_none_or(|nsu| seen.insert(nsu))),
                );
                let kept = documents.len() - before;
                if kept < offered {
                    debug!(skipped = offered - kept, "dropped documents already accumulated");
                }
            }
            _ => return Err(batch.status.into_rejection()),
        }

        if !(all_batches && last < max) {
            info!(
                batches,
                documents = documents.len(),
                ult_nsu = last,
                max_nsu = max,
                "distribution query finished"
            );
            return Ok(AccumulatedResult {
                response_timestamp,
                last_sequence_number: last,
                max_sequence_number: max,
                documents,
            });
        }
        if last <= previous {
            warn!(
                watermark = last,
                max_nsu = max,
                "watermark did not advance; querying the same position again"
            );
        }
    }
}
