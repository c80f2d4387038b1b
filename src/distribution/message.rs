//! `distDFeInt` requests and `retDistDFeInt` responses.

use chrono::{DateTime, FixedOffset};

use super::DistributionQuery;
use super::codec::decode_doc_zip;
use crate::core::{
    BatchResult, Environment, RegionCode, Result, SefazError, ServiceStatus, StatusCode,
    TaxpayerId, format_nsu, parse_nsu,
};
use crate::xml::{Element, NFE_NAMESPACE, XmlWriter};

/// `versao` of the distribution layout.
pub const DISTRIBUTION_VERSION: &str = "1.01";

/// Wire format of `dhResp`.
pub const RESPONSE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Build the `distDFeInt` message for one query.
pub fn build_request(
    environment: Environment,
    region: &RegionCode,
    taxpayer: &TaxpayerId,
    query: &DistributionQuery,
) -> Result<Element> {
    let mut w = XmlWriter::new();
    w.start_element_with_attrs(
        "distDFeInt",
        &[("xmlns", NFE_NAMESPACE), ("versao", DISTRIBUTION_VERSION)],
    )?;
    w.text_element("tpAmb", environment.code())?;
    w.text_element("cUFAutor", region.as_str())?;
    w.text_element(taxpayer.element_name(), taxpayer.as_str())?;
    match query {
        DistributionQuery::FromWatermark(nsu) => {
            w.start_element("distNSU")?;
            w.text_element("ultNSU", &format_nsu(*nsu))?;
            w.end_element("distNSU")?;
        }
        DistributionQuery::BySequence(nsu) => {
            w.start_element("consNSU")?;
            w.text_element("NSU", &format_nsu(*nsu))?;
            w.end_element("consNSU")?;
        }
        DistributionQuery::ByKey(key) => {
            w.start_element("consChNFe")?;
            w.text_element("chNFe", key.as_str())?;
            w.end_element("consChNFe")?;
        }
    }
    w.end_element("distDFeInt")?;
    Ok(w.into_element()?)
}

fn required(el: &Element, name: &str) -> Result<String> {
    el.child_text(name)
        .ok_or_else(|| SefazError::Decode(format!("retDistDFeInt without {name}")))
}

fn optional_nsu(el: &Element, name: &str) -> Result<Option<u64>> {
    match el.child_text(name) {
        None => Ok(None),
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) => parse_nsu(&text)
            .map(Some)
            .ok_or_else(|| SefazError::Decode(format!("invalid {name} '{text}'"))),
    }
}

/// Parse a `dhResp` value.
pub fn parse_timestamp(text: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_str(text.trim(), RESPONSE_TIMESTAMP_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(text.trim()))
        .map_err(|e| SefazError::Decode(format!("invalid dhResp '{text}': {e}")))
}

/// Parse a `retDistDFeInt` response.
///
/// Documents are decoded for successful responses only. A 138 response
/// without `ultNSU`/`maxNSU` is a decode error; rejections may omit them.
pub fn parse_response(response: &Element) -> Result<BatchResult> {
    if response.local_name() != "retDistDFeInt" {
        return Err(SefazError::Decode(format!(
            "expected retDistDFeInt, got <{}>",
            response.name
        )));
    }
    let status = ServiceStatus::new(&required(response, "cStat")?, required(response, "xMotivo")?);
    let response_timestamp = parse_timestamp(&required(response, "dhResp")?)?;
    let last_sequence_number = optional_nsu(response, "ultNSU")?;
    let max_sequence_number = optional_nsu(response, "maxNSU")?;

    let is_success = matches!(
        status.code,
        StatusCode::NoDocuments | StatusCode::DocumentsFound
    );
    if is_success && (last_sequence_number.is_none() || max_sequence_number.is_none()) {
        return Err(SefazError::Decode(
            "successful retDistDFeInt without ultNSU/maxNSU".into(),
        ));
    }

    let mut documents = Vec::new();
    if status.code == StatusCode::DocumentsFound {
        if let Some(lot) = response.child("loteDistDFeInt") {
            for zip in lot.children_named("docZip") {
                let nsu = match zip.attribute("NSU") {
                    Some(v) => Some(parse_nsu(v).ok_or_else(|| {
                        SefazError::Decode(format!("invalid docZip NSU '{v}'"))
                    })?),
                    None => None,
                };
                let schema = zip.attribute("schema").unwrap_or_default();
                documents.push(decode_doc_zip(nsu, schema, &zip.text())?);
            }
        }
    }

    Ok(BatchResult {
        response_timestamp,
        last_sequence_number,
        max_sequence_number,
        status,
        documents,
    })
}
