//! Property-based tests for the wire-level building blocks.
//!
//! Run with: `cargo test --test proptest_tests`

mod common;

use common::{CNPJ, KEY};
use flate2::Compression;
use flate2::write::GzEncoder;
use proptest::prelude::*;
use sefaz_dfe::core::{DocumentKey, NSU_WIDTH, TaxpayerId, format_nsu, parse_nsu};
use sefaz_dfe::distribution::codec::decode;
use sefaz_dfe::events::{EventRecordBuilder, EventType};
use std::io::Write;

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

proptest! {
    #[test]
    fn codec_returns_exact_text(text in "[a-zA-Z0-9 çãéÇÃÉ&<>\n\t-]{0,200}") {
        let xml = format!(
            "<resNFe xmlns=\"http://www.portalfiscal.inf.br/nfe\"><xNome>{}</xNome></resNFe>",
            escape(&text)
        );
        let (raw, el) = decode(&gzip(xml.as_bytes())).unwrap();
        prop_assert_eq!(&raw, &xml);
        prop_assert_eq!(el.child_text("xNome").unwrap_or_default(), text);
    }

    #[test]
    fn garbage_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode(&bytes);
        let _ = decode(&gzip(&bytes));
    }

    #[test]
    fn nsu_padding(n in 0u64..1_000_000_000_000_000) {
        let s = format_nsu(n);
        prop_assert_eq!(s.len(), NSU_WIDTH);
        prop_assert_eq!(parse_nsu(&s), Some(n));
    }

    #[test]
    fn event_identifier_shape(seq in 1u32..=99, idx in 0usize..4) {
        let event_type = EventType::ALL[idx];
        let record = EventRecordBuilder::new(
            event_type,
            TaxpayerId::parse(CNPJ).unwrap(),
            DocumentKey::parse(KEY).unwrap(),
            chrono::DateTime::parse_from_rfc3339("2024-01-15T10:30:00-03:00").unwrap(),
        )
        .sequence(seq)
        .build()
        .unwrap();
        let id = record.identifier();
        let expected_seq = if event_type == EventType::Awareness { 1 } else { seq };
        prop_assert_eq!(id.len(), 2 + 6 + 44 + 2);
        prop_assert_eq!(id, format!("ID{}{}{:02}", event_type.code(), KEY, expected_seq));
    }

    #[test]
    fn document_key_length(digits in "[0-9]{1,60}") {
        prop_assert_eq!(DocumentKey::parse(&digits).is_ok(), digits.len() == 44);
    }
}
