use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha1::{Digest, Sha1};

use super::sign::{is_signature, reference_digest};
use super::{ENVELOPED_SIGNATURE_TRANSFORM, RSA_SHA1, SHA1_DIGEST};
use crate::core::{Result, SefazError};
use crate::xml::{C14N_ALGORITHM, Element, canonicalize, inherited_namespaces};

fn invalid(message: impl Into<String>) -> SefazError {
    SefazError::Signature(message.into())
}

fn algorithm_of<'a>(parent: &'a Element, child: &str) -> Result<&'a str> {
    parent
        .child(child)
        .and_then(|e| e.attribute("Algorithm"))
        .ok_or_else(|| invalid(format!("missing {child}/@Algorithm")))
}

fn expect_algorithm(parent: &Element, child: &str, expected: &str) -> Result<()> {
    let found = algorithm_of(parent, child)?;
    if found != expected {
        return Err(invalid(format!("unsupported {child} `{found}`")));
    }
    Ok(())
}

/// Check the first enveloped signature in `document` against `public_key`.
///
/// Only the profile produced by [`sign`](super::sign) is accepted: C14N 1.0,
/// RSA-SHA1, SHA-1 digest, a single same-document `Reference` by `Id`.
pub fn verify(document: &Element, public_key: &RsaPublicKey) -> Result<()> {
    let signature_path = document
        .find_path(is_signature)
        .ok_or_else(|| invalid("no Signature element"))?;
    let signature = document
        .at_path(&signature_path)
        .ok_or_else(|| invalid("no Signature element"))?;
    let signed_info = signature
        .child("SignedInfo")
        .ok_or_else(|| invalid("missing SignedInfo"))?;

    expect_algorithm(signed_info, "CanonicalizationMethod", C14N_ALGORITHM)?;
    expect_algorithm(signed_info, "SignatureMethod", RSA_SHA1)?;

    let reference = signed_info
        .child("Reference")
        .ok_or_else(|| invalid("missing Reference"))?;
    let id = reference
        .attribute("URI")
        .and_then(|uri| uri.strip_prefix('#'))
        .ok_or_else(|| invalid("Reference URI must point into the document"))?;
    if let Some(transforms) = reference.child("Transforms") {
        for transform in transforms.children_named("Transform") {
            match transform.attribute("Algorithm") {
                Some(ENVELOPED_SIGNATURE_TRANSFORM | C14N_ALGORITHM) => {}
                other => {
                    return Err(invalid(format!(
                        "unsupported Transform `{}`",
                        other.unwrap_or_default()
                    )));
                }
            }
        }
    }
    expect_algorithm(reference, "DigestMethod", SHA1_DIGEST)?;

    let target_path = document
        .find_path(|e| e.attribute("Id") == Some(id))
        .ok_or_else(|| invalid(format!("referenced element `{id}` not found")))?;
    let expected = reference
        .child_text("DigestValue")
        .ok_or_else(|| invalid("missing DigestValue"))?;
    if reference_digest(document, &target_path)? != expected.trim() {
        return Err(invalid("digest mismatch"));
    }

    let mut scope = inherited_namespaces(document, &signature_path);
    for (prefix, uri) in signature.namespace_declarations() {
        scope.insert(prefix.to_string(), uri.to_string());
    }
    let canonical = canonicalize(signed_info, &scope);

    let value: String = signature
        .child_text("SignatureValue")
        .ok_or_else(|| invalid("missing SignatureValue"))?
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let value = STANDARD
        .decode(value)
        .map_err(|e| invalid(format!("SignatureValue is not base64: {e}")))?;

    public_key
        .verify(
            Pkcs1v15Sign::new::<Sha1>(),
            &Sha1::digest(canonical.as_bytes()),
            &value,
        )
        .map_err(|_| invalid("signature value does not match"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsig::{SigningCredential, Validity, sign};
    use crate::xml::{Node, parse};
    use chrono::{TimeZone, Utc};

    fn credential() -> SigningCredential {
        let validity = Validity {
            not_before: Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap(),
            not_after: Utc.with_ymd_and_hms(2100, 1, 1, 0, 0, 0).unwrap(),
        };
        SigningCredential::from_pem(
            include_str!("../../tests/fixtures/cert.pem"),
            Some(include_str!("../../tests/fixtures/key.pem")),
            validity,
        )
        .unwrap()
    }

    fn signed() -> (Element, RsaPublicKey) {
        let cred = credential();
        let doc = parse(
            r#"<envEvento xmlns="http://www.portalfiscal.inf.br/nfe" versao="1.00"><idLote>000000000000001</idLote><evento versao="1.00"><infEvento Id="IDx1"><xJust>a &amp; b</xJust></infEvento></evento></envEvento>"#,
        )
        .unwrap();
        let signed = sign(&doc, "infEvento", "Id", &cred).unwrap();
        (signed, cred.public_key().unwrap())
    }

    #[test]
    fn accepts_own_signature() {
        let (doc, key) = signed();
        verify(&doc, &key).unwrap();
    }

    #[test]
    fn survives_reparse() {
        let (doc, key) = signed();
        let again = parse(&doc.to_xml().unwrap()).unwrap();
        verify(&again, &key).unwrap();
    }

    #[test]
    fn prefixed_ancestor_namespaces() {
        let cred = credential();
        let doc = parse(
            r#"<w:wrap xmlns:w="urn:wrap" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><evento xmlns="http://www.portalfiscal.inf.br/nfe"><infEvento Id="ID9"><a>1</a></infEvento></evento></w:wrap>"#,
        )
        .unwrap();
        let signed = sign(&doc, "infEvento", "Id", &cred).unwrap();
        verify(&signed, &cred.public_key().unwrap()).unwrap();
    }

    #[test]
    fn detects_tampered_content() {
        let (mut doc, key) = signed();
        let path = doc.find_path(|e| e.local_name() == "xJust").unwrap();
        let x = doc.at_path_mut(&path).unwrap();
        x.children = vec![Node::Text("changed".into())];
        let err = verify(&doc, &key).unwrap_err();
        assert!(err.to_string().contains("digest mismatch"));
    }

    #[test]
    fn missing_signature() {
        let doc = parse("<a><b Id=\"x\"/></a>").unwrap();
        let key = credential().public_key().unwrap();
        assert!(matches!(verify(&doc, &key), Err(SefazError::Signature(_))));
    }
}
