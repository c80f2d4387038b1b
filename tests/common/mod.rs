//! Shared helpers for the integration tests: a scripted transport, test
//! credentials and canned SEFAZ responses.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{TimeZone, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use sefaz_dfe::SefazClient;
use sefaz_dfe::core::ClientConfig;
use sefaz_dfe::dsig::{SigningCredential, Validity};
use sefaz_dfe::transport::{Service, Transport, TransportError, TransportRequest};
use sefaz_dfe::xml::{Element, parse};

pub const CERT_PEM: &str = include_str!("../fixtures/cert.pem");
pub const KEY_PEM: &str = include_str!("../fixtures/key.pem");

pub const REGION: &str = "35";
pub const CNPJ: &str = "12345678000195";
pub const KEY: &str = "35240112345678000195550010000000011000000019";

/// A request as seen by the transport.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub service: Service,
    pub endpoint: String,
    pub body: Element,
    pub max_response_bytes: usize,
}

/// Replays scripted responses in order and records every request.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Element, TransportError>>>,
    requests: Mutex<Vec<Recorded>>,
    calls: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, xml: &str) -> Self {
        let el = parse(xml).expect("scripted response must be well-formed");
        self.responses.lock().unwrap().push_back(Ok(el));
        self
    }

    pub fn fail(self, err: TransportError) -> Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest<'_>) -> Result<Element, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(Recorded {
            service: request.service,
            endpoint: request.endpoint.to_string(),
            body: request.body.clone(),
            max_response_bytes: request.max_response_bytes,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no scripted response".into())))
    }
}

pub fn validity(from: i32, to: i32) -> Validity {
    Validity {
        not_before: Utc.with_ymd_and_hms(from, 1, 1, 0, 0, 0).unwrap(),
        not_after: Utc.with_ymd_and_hms(to, 1, 1, 0, 0, 0).unwrap(),
    }
}

pub fn credential() -> SigningCredential {
    SigningCredential::from_pem(CERT_PEM, Some(KEY_PEM), validity(2000, 2100)).unwrap()
}

pub fn expired_credential() -> SigningCredential {
    SigningCredential::from_pem(CERT_PEM, Some(KEY_PEM), validity(2000, 2001)).unwrap()
}

pub fn client(mock: &Arc<MockTransport>) -> SefazClient<Arc<MockTransport>> {
    SefazClient::new(ClientConfig::homologation(), credential(), Arc::clone(mock))
}

pub fn gzip_base64(xml: &str) -> String {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(xml.as_bytes()).unwrap();
    STANDARD.encode(enc.finish().unwrap())
}

/// `(NSU, schema, xml)` of one scripted document.
pub type Doc<'a> = (u64, &'a str, &'a str);

pub fn summary(nsu: u64) -> String {
    format!(
        r#"<resNFe xmlns="http://www.portalfiscal.inf.br/nfe" versao="1.01"><chNFe>{KEY}</chNFe><vNF>{nsu}.00</vNF></resNFe>"#
    )
}

pub fn dist_response(code: &str, reason: &str, last: u64, max: u64, docs: &[Doc<'_>]) -> String {
    let mut lot = String::new();
    if !docs.is_empty() {
        lot.push_str("<loteDistDFeInt>");
        for (nsu, schema, xml) in docs {
            lot.push_str(&format!(
                r#"<docZip NSU="{nsu:015}" schema="{schema}">{}</docZip>"#,
                gzip_base64(xml)
            ));
        }
        lot.push_str("</loteDistDFeInt>");
    }
    format!(
        r#"<retDistDFeInt xmlns="http://www.portalfiscal.inf.br/nfe" versao="1.01"><tpAmb>2</tpAmb><verAplic>1.4.0</verAplic><cStat>{code}</cStat><xMotivo>{reason}</xMotivo><dhResp>2024-01-15T10:30:00-03:00</dhResp><ultNSU>{last:015}</ultNSU><maxNSU>{max:015}</maxNSU>{lot}</retDistDFeInt>"#
    )
}

pub fn rejection(code: &str, reason: &str) -> String {
    format!(
        r#"<retDistDFeInt xmlns="http://www.portalfiscal.inf.br/nfe" versao="1.01"><tpAmb>2</tpAmb><verAplic>1.4.0</verAplic><cStat>{code}</cStat><xMotivo>{reason}</xMotivo><dhResp>2024-01-15T10:30:00-03:00</dhResp></retDistDFeInt>"#
    )
}

pub fn event_response(lot: &str, event: &str, reason: &str) -> String {
    format!(
        r#"<retEnvEvento xmlns="http://www.portalfiscal.inf.br/nfe" versao="1.00"><idLote>1</idLote><tpAmb>2</tpAmb><verAplic>AN_1.0</verAplic><cOrgao>91</cOrgao><cStat>{lot}</cStat><xMotivo>Lote de evento processado</xMotivo><retEvento versao="1.00"><infEvento><tpAmb>2</tpAmb><verAplic>AN_1.0</verAplic><cOrgao>91</cOrgao><cStat>{event}</cStat><xMotivo>{reason}</xMotivo><chNFe>{KEY}</chNFe><tpEvento>210210</tpEvento><xEvento>Ciencia da Operacao</xEvento><nSeqEvento>1</nSeqEvento><dhRegEvento>2024-01-15T10:31:02-03:00</dhRegEvento><nProt>891240000000001</nProt></infEvento></retEvento></retEnvEvento>"#
    )
}
