use tracing::{debug, instrument};

use super::DistributionQuery;
use super::message::{build_request, parse_response};
use super::pagination::paginate;
use crate::client::SefazClient;
use crate::core::{
    AccumulatedResult, BatchResult, Document, DocumentKey, RegionCode, Result, StatusCode,
    TaxpayerId,
};
use crate::transport::{Service, Transport, TransportRequest};

impl<T: Transport> SefazClient<T> {
    /// Issue one distribution query and return the decoded batch.
    ///
    /// The batch is returned whatever its status; use
    /// [`fetch_all`](Self::fetch_all) for the classified loop.
    #[instrument(skip(self))]
    pub async fn retrieve_batch(
        &self,
        region: &str,
        taxpayer: &str,
        query: &DistributionQuery,
    ) -> Result<BatchResult> {
        let region = RegionCode::parse(region)?;
        let taxpayer = TaxpayerId::parse(taxpayer)?;
        self.check_credential()?;
        self.distribution_call(&region, &taxpayer, query).await
    }

    /// Retrieve the taxpayer's documents from the watermark `start`
    /// (0 = last 90 days).
    ///
    /// With `all_batches` the query is repeated from each returned
    /// `ultNSU` until it reaches `maxNSU`.
    ///
    /// Large, frequent queries may get the taxpayer temporarily blocked by
    /// the service. Avoid starting from 0 more than once per hour.
    #[instrument(skip(self))]
    pub async fn fetch_all(
        &self,
        region: &str,
        taxpayer: &str,
        start: u64,
        all_batches: bool,
    ) -> Result<AccumulatedResult> {
        let region = RegionCode::parse(region)?;
        let taxpayer = TaxpayerId::parse(taxpayer)?;
        self.check_credential()?;

        let (region, taxpayer) = (&region, &taxpayer);
        paginate(start, all_batches, |nsu| async move {
            self.distribution_call(region, taxpayer, &DistributionQuery::FromWatermark(nsu))
                .await
        })
        .await
    }

    /// Fetch the authorized NF-e (`procNFe_*`) for an access key.
    ///
    /// Fails with the batch's `cStat`/`xMotivo` when the service has no full
    /// document for the key, e.g. before the recipient acknowledged it.
    #[instrument(skip(self))]
    pub async fn download_document(
        &self,
        region: &str,
        taxpayer: &str,
        document_key: &str,
    ) -> Result<Document> {
        let region = RegionCode::parse(region)?;
        let taxpayer = TaxpayerId::parse(taxpayer)?;
        let key = DocumentKey::parse(document_key)?;
        self.check_credential()?;

        let batch = self
            .distribution_call(&region, &taxpayer, &DistributionQuery::ByKey(key))
            .await?;
        if batch.status.code != StatusCode::DocumentsFound {
            return Err(batch.status.into_rejection());
        }
        let BatchResult {
            status, documents, ..
        } = batch;
        documents
            .into_iter()
            .find(Document::is_authorized_document)
            .ok_or_else(|| status.into_rejection())
    }

    /// Fetch the single document stored under `nsu`.
    #[instrument(skip(self))]
    pub async fn query_sequence(&self, region: &str, taxpayer: &str, nsu: u64) -> Result<Document> {
        let region = RegionCode::parse(region)?;
        let taxpayer = TaxpayerId::parse(taxpayer)?;
        self.check_credential()?;

        let batch = self
            .distribution_call(&region, &taxpayer, &DistributionQuery::BySequence(nsu))
            .await?;
        if batch.status.code != StatusCode::DocumentsFound {
            return Err(batch.status.into_rejection());
        }
        let BatchResult {
            status, documents, ..
        } = batch;
        documents
            .into_iter()
            .next()
            .ok_or_else(|| status.into_rejection())
    }

    async fn distribution_call(
        &self,
        region: &RegionCode,
        taxpayer: &TaxpayerId,
        query: &DistributionQuery,
    ) -> Result<BatchResult> {
        let body = build_request(self.config().environment, region, taxpayer, query)?;
        let response = self
            .transport()
            .send(TransportRequest {
                service: Service::Distribution,
                endpoint: &self.config().distribution_endpoint,
                body: &body,
                max_response_bytes: self.config().max_message_size,
            })
            .await?;
        let batch = parse_response(&response)?;
        debug!(
            status = %batch.status,
            documents = batch.documents.len(),
            ult_nsu = ?batch.last_sequence_number,
            max_nsu = ?batch.max_sequence_number,
            "distribution batch received"
        );
        Ok(batch)
    }
}
