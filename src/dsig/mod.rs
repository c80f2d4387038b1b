//! Enveloped XML-DSig signatures (RSA-SHA1, inclusive C14N 1.0) as
//! required by the SEFAZ event web services.
//!
//! ```no_run
//! use sefaz_dfe::dsig::{SigningCredential, Validity, sign, verify};
//! use sefaz_dfe::xml::parse;
//! # fn demo(validity: Validity) -> sefaz_dfe::core::Result<()> {
//! let credential = SigningCredential::from_pem(
//!     &std::fs::read_to_string("cert.pem").unwrap(),
//!     Some(&std::fs::read_to_string("key.pem").unwrap()),
//!     validity,
//! )?;
//! let doc = parse(r#"<evento><infEvento Id="ID1"/></evento>"#)?;
//! let signed = sign(&doc, "infEvento", "Id", &credential)?;
//! verify(&signed, &credential.public_key().unwrap())?;
//! # Ok(())
//! # }
//! ```

mod credential;
mod sign;
mod verify;

pub use credential::{SigningCredential, Validity};
pub use sign::sign;
pub use verify::verify;

/// `SignatureMethod` algorithm URI.
pub const RSA_SHA1: &str = "http://www.w3.org/2000/09/xmldsig#rsa-sha1";

/// `DigestMethod` algorithm URI.
pub const SHA1_DIGEST: &str = "http://www.w3.org/2000/09/xmldsig#sha1";

/// Enveloped-signature transform URI.
pub const ENVELOPED_SIGNATURE_TRANSFORM: &str =
    "http://www.w3.org/2000/09/xmldsig#enveloped-signature";
