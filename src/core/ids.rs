use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{Result, SefazError};

/// IBGE codes of the 27 federative units.
const UF_CODES: &[&str] = &[
    "11", "12", "13", "14", "15", "16", "17", // Norte
    "21", "22", "23", "24", "25", "26", "27", "28", "29", // Nordeste
    "31", "32", "33", "35", // Sudeste
    "41", "42", "43", // Sul
    "50", "51", "52", "53", // Centro-Oeste
];

/// Organs that receive events besides the states: 90 (SUFRAMA) and
/// 91 (Ambiente Nacional).
const EXTRA_ORG_CODES: &[&str] = &["90", "91"];

/// Width of an NSU on the wire.
pub const NSU_WIDTH: usize = 15;

fn is_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

/// Left-pad a sequence number to the protocol width of 15 digits.
pub fn format_nsu(nsu: u64) -> String {
    format!("{nsu:0>NSU_WIDTH$}")
}

/// Parse a (possibly zero-padded) sequence number.
pub fn parse_nsu(s: &str) -> Option<u64> {
    let t = s.trim();
    if t.is_empty() || !t.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    t.parse().ok()
}

/// IBGE code of the requester's federative unit (`cUFAutor`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegionCode(String);

impl RegionCode {
    /// Validate a two-digit IBGE state code.
    pub fn parse(code: &str) -> Result<Self> {
        if code.trim().is_empty() {
            return Err(SefazError::invalid_argument("cUF", "region code is empty"));
        }
        if code.len() != 2 {
            return Err(SefazError::invalid_argument(
                "cUF",
                "region code must have two digits",
            ));
        }
        if !UF_CODES.contains(&code) {
            return Err(SefazError::invalid_argument(
                "cUF",
                format!("unknown IBGE region code '{code}'"),
            ));
        }
        Ok(Self(code.to_string()))
    }

    /// The code as sent in `cUFAutor`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Code of the organ that receives manifestation events (`cOrgao`).
///
/// Any state code, 90 or 91. The national environment (91) is the usual
/// receiver of recipient manifestation events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrgCode(String);

impl OrgCode {
    /// Ambiente Nacional.
    pub fn national() -> Self {
        Self("91".to_string())
    }

    /// Validate a two-digit `cOrgao` (a state code or 91).
    pub fn parse(code: &str) -> Result<Self> {
        if UF_CODES.contains(&code) || EXTRA_ORG_CODES.contains(&code) {
            Ok(Self(code.to_string()))
        } else {
            Err(SefazError::invalid_argument(
                "cOrgao",
                format!("invalid IBGE organ code '{code}'"),
            ))
        }
    }

    /// The code as sent in `cOrgao`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OrgCode {
    fn default() -> Self {
        Self::national()
    }
}

impl TryFrom<String> for OrgCode {
    type Error = SefazError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<OrgCode> for String {
    fn from(code: OrgCode) -> Self {
        code.0
    }
}

impl fmt::Display for OrgCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Taxpayer identifier (CNPJ, 14 digits, no mask).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaxpayerId(String);

impl TaxpayerId {
    /// Validate a 14-digit CNPJ given without punctuation.
    pub fn parse(cnpj: &str) -> Result<Self> {
        if cnpj.trim().is_empty() {
            return Err(SefazError::invalid_argument("cnpj", "CNPJ is empty"));
        }
        if !is_digits(cnpj, 14) {
            return Err(SefazError::invalid_argument(
                "cnpj",
                "CNPJ must have 14 digits",
            ));
        }
        Ok(Self(cnpj.to_string()))
    }

    /// The CNPJ digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Element name carrying the id on the wire.
    pub fn element_name(&self) -> &'static str {
        "CNPJ"
    }
}

impl fmt::Display for TaxpayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 44-digit NF-e access key (`chNFe`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey(String);

/// The fields packed into a [`DocumentKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyComponents<'a> {
    /// IBGE code of the issuer's state.
    pub uf: &'a str,
    /// Issue year and month, `AAMM`.
    pub year_month: &'a str,
    /// Issuer CNPJ.
    pub issuer_cnpj: &'a str,
    /// Document model (55 = NF-e, 65 = NFC-e).
    pub model: &'a str,
    pub series: &'a str,
    pub number: &'a str,
    /// Emission type (`tpEmis`).
    pub emission_type: &'a str,
    /// Random numeric code (`cNF`).
    pub numeric_code: &'a str,
    pub check_digit: &'a str,
}

impl DocumentKey {
    /// Validate a 44-digit access key (length and digits only).
    pub fn parse(key: &str) -> Result<Self> {
        if key.trim().is_empty() {
            return Err(SefazError::invalid_argument("chave", "access key is empty"));
        }
        if !is_digits(key, 44) {
            return Err(SefazError::invalid_argument(
                "chave",
                "access key must have 44 digits",
            ));
        }
        Ok(Self(key.to_string()))
    }

    /// The 44 key digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split the key into its fixed-width fields.
    pub fn components(&self) -> KeyComponents<'_> {
        let k = self.0.as_str();
        KeyComponents {
            uf: &k[0..2],
            year_month: &k[2..6],
            issuer_cnpj: &k[6..20],
            model: &k[20..22],
            series: &k[22..25],
            number: &k[25..34],
            emission_type: &k[34..35],
            numeric_code: &k[35..43],
            check_digit: &k[43..44],
        }
    }

    /// Modulo-11 check over the first 43 digits.
    pub fn has_valid_check_digit(&self) -> bool {
        let digits = self.0.as_bytes();
        let mut weight = 2u32;
        let mut sum = 0u32;
        for b in digits[..43].iter().rev() {
            sum += u32::from(b - b'0') * weight;
            weight = if weight == 9 { 2 } else { weight + 1 };
        }
        let expected = match sum % 11 {
            0 | 1 => 0,
            r => 11 - r,
        };
        u32::from(digits[43] - b'0') == expected
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
