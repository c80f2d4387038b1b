use std::fmt;
use std::path::Path;

use chrono::{DateTime, FixedOffset};

use super::error::{Result, SefazError};
use super::status::ServiceStatus;
use crate::xml::Element;

/// A document or event delivered by the distribution service.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Position in the taxpayer's NSU stream. Absent for some validation
    /// documents.
    pub sequence_number: Option<u64>,
    /// Schema of the XML (e.g. `procNFe_v4.00.xsd`, `resEvento_v1.01.xsd`).
    pub schema: String,
    /// Parsed XML.
    pub content: Element,
    /// The decompressed XML exactly as the service produced it.
    pub raw: String,
}

impl Document {
    /// Whether this is an authorized NF-e (`procNFe_*` schema) as opposed to
    /// a summary or an event.
    pub fn is_authorized_document(&self) -> bool {
        self.schema.starts_with("procNFe_")
    }

    /// Full XML text.
    pub fn xml(&self) -> &str {
        &self.raw
    }

    /// Save the XML as UTF-8 without BOM, byte-identical to the download from
    /// the SEFAZ portal.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.raw.as_bytes()).map_err(|source| SefazError::Storage {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Outcome of one retrieval cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    /// `dhResp`.
    pub response_timestamp: DateTime<FixedOffset>,
    /// `ultNSU`: resume point for the next call.
    pub last_sequence_number: Option<u64>,
    /// `maxNSU`: highest NSU known to the service at response time.
    pub max_sequence_number: Option<u64>,
    pub status: ServiceStatus,
    /// Documents in service order; empty when the batch has none.
    pub documents: Vec<Document>,
}

/// Documents accumulated across one or more batches.
///
/// Iterating yields the documents in batch-then-intra-batch order.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatedResult {
    /// `dhResp` of the most recent batch.
    pub response_timestamp: DateTime<FixedOffset>,
    /// Last NSU consumed; pass it as the start of the next query.
    pub last_sequence_number: u64,
    /// Highest NSU known to the service.
    pub max_sequence_number: u64,
    pub documents: Vec<Document>,
}

impl AccumulatedResult {
    /// Number of accumulated documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// `true` when no documents were accumulated.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// True when the watermark has caught up with the service.
    pub fn is_complete(&self) -> bool {
        self.last_sequence_number >= self.max_sequence_number
    }

    /// Documents in NSU order.
    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }
}

impl IntoIterator for AccumulatedResult {
    type Item = Document;
    type IntoIter = std::vec::IntoIter<Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.into_iter()
    }
}

impl<'a> IntoIterator for &'a AccumulatedResult {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}

impl From<AccumulatedResult> for Vec<Document> {
    fn from(result: AccumulatedResult) -> Self {
        result.documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(schema: &str) -> Document {
        let raw = "<resNFe><chNFe>1</chNFe></resNFe>".to_string();
        Document {
            sequence_number: Some(1),
            schema: schema.into(),
            content: crate::xml::parse(&raw).unwrap(),
            raw,
        }
    }

    #[test]
    fn authorized_document_detection() {
        assert!(doc("procNFe_v4.00.xsd").is_authorized_document());
        assert!(!doc("resNFe_v1.01.xsd").is_authorized_document());
    }

    #[test]
    fn save_writes_raw_without_bom() {
        let d = doc("resNFe_v1.01.xsd");
        let path = std::env::temp_dir().join(format!("sefaz-dfe-save-{}.xml", std::process::id()));
        d.save(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(bytes, d.raw.as_bytes());
        assert_ne!(&bytes[..3], b"\xEF\xBB\xBF");
    }

    #[test]
    fn save_reports_storage_failure() {
        let d = doc("resNFe_v1.01.xsd");
        let path = std::env::temp_dir()
            .join(format!("sefaz-dfe-missing-{}", std::process::id()))
            .join("nota.xml");
        let err = d.save(&path).unwrap_err();
        assert!(matches!(
            err,
            SefazError::Storage { path: ref p, ref source }
                if *p == path && source.kind() == std::io::ErrorKind::NotFound
        ));
        assert!(err.to_string().contains("nota.xml"));
    }

    #[test]
    fn accumulated_result_iterates_in_order() {
        let ts = DateTime::parse_from_rfc3339("2024-01-10T10:00:00-03:00").unwrap();
        let result = AccumulatedResult {
            response_timestamp: ts,
            last_sequence_number: 5,
            max_sequence_number: 5,
            documents: vec![doc("a"), doc("b")],
        };
        assert!(result.is_complete());
        let schemas: Vec<_> = (&result).into_iter().map(|d| d.schema.as_str()).collect();
        assert_eq!(schemas, ["a", "b"]);
        let docs: Vec<Document> = result.into();
        assert_eq!(docs.len(), 2);
    }
}
