use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rsa::Pkcs1v15Sign;
use sha1::{Digest, Sha1};
use tracing::debug;

use super::credential::SigningCredential;
use super::{ENVELOPED_SIGNATURE_TRANSFORM, RSA_SHA1, SHA1_DIGEST};
use crate::core::{Result, SefazError};
use crate::xml::{
    C14N_ALGORITHM, DSIG_NAMESPACE, Element, NamespaceScope, Node, canonicalize,
    inherited_namespaces, parse,
};

/// Sign the first element whose local name is `target` with an enveloped
/// RSA-SHA1 signature.
///
/// The element must carry `id_attribute`; the `Reference` points at it as
/// `#<id>`. The `Signature` element is appended as the last child of the
/// target's parent, and the returned tree is the re-parsed serialization of
/// the signed document. The input is left untouched.
///
/// # Errors
///
/// * [`SefazError::InvalidArgument`] for an empty `target` or `id_attribute`
/// * [`SefazError::NoPrivateKey`] when the credential has no private key
/// * [`SefazError::Signature`] when the target is missing, is the document
///   root, lacks the id attribute, or RSA signing fails
pub fn sign(
    document: &Element,
    target: &str,
    id_attribute: &str,
    credential: &SigningCredential,
) -> Result<Element> {
    if target.trim().is_empty() {
        return Err(SefazError::invalid_argument("tag", "must not be empty"));
    }
    if id_attribute.trim().is_empty() {
        return Err(SefazError::invalid_argument("id_attribute", "must not be empty"));
    }
    let key = credential.private_key().ok_or(SefazError::NoPrivateKey)?;

    // Digest the tree a receiver rebuilds from our serialization, where raw
    // carriage returns have become line feeds.
    let document = &document
        .to_xml()
        .and_then(|xml| parse(&xml))
        .map_err(|e| SefazError::Signature(e.to_string()))?;

    let path = document
        .find_path(|e| e.local_name() == target)
        .ok_or_else(|| SefazError::Signature(format!("element <{target}> not found")))?;
    let Some((_, parent_path)) = path.split_last() else {
        return Err(SefazError::Signature(format!(
            "<{target}> is the document root; an enveloped signature needs a parent"
        )));
    };
    let id = document
        .at_path(&path)
        .and_then(|e| e.attribute(id_attribute))
        .ok_or_else(|| {
            SefazError::Signature(format!("<{target}> has no `{id_attribute}` attribute"))
        })?
        .to_string();

    let digest = reference_digest(document, &path)?;
    let signed_info = signed_info(&format!("#{id}"), &digest);

    let canonical = canonicalize(&signed_info, &signature_scope(document, parent_path));
    let hashed = Sha1::digest(canonical.as_bytes());
    let value = key
        .sign(Pkcs1v15Sign::new::<Sha1>(), &hashed)
        .map_err(|e| SefazError::Signature(e.to_string()))?;

    let signature = Element::new("Signature")
        .with_attribute("xmlns", DSIG_NAMESPACE)
        .with_child(signed_info)
        .with_child(Element::new("SignatureValue").with_text(STANDARD.encode(value)))
        .with_child(
            Element::new("KeyInfo").with_child(
                Element::new("X509Data").with_child(
                    Element::new("X509Certificate").with_text(credential.certificate_base64()),
                ),
            ),
        );

    let mut signed = document.clone();
    signed
        .at_path_mut(parent_path)
        .ok_or_else(|| SefazError::Signature("parent of the signed element vanished".into()))?
        .push(signature);

    let xml = signed
        .to_xml()
        .map_err(|e| SefazError::Signature(e.to_string()))?;
    debug!(target_element = target, reference = %id, "signed XML element");
    parse(&xml).map_err(|e| SefazError::Signature(e.to_string()))
}

/// Base64 SHA-1 of the element at `path` after the enveloped-signature and
/// C14N transforms.
pub(crate) fn reference_digest(document: &Element, path: &[usize]) -> Result<String> {
    let target = document
        .at_path(path)
        .ok_or_else(|| SefazError::Signature("referenced element not found".into()))?;
    let canonical = canonicalize(&without_signatures(target), &inherited_namespaces(document, path));
    Ok(STANDARD.encode(Sha1::digest(canonical.as_bytes())))
}

/// Namespaces in scope for a `Signature` appended under the element at
/// `parent_path`. The signature itself declares DSig as default namespace.
fn signature_scope(document: &Element, parent_path: &[usize]) -> NamespaceScope {
    let mut scope = inherited_namespaces(document, parent_path);
    if let Some(parent) = document.at_path(parent_path) {
        for (prefix, uri) in parent.namespace_declarations() {
            scope.insert(prefix.to_string(), uri.to_string());
        }
    }
    scope.insert(String::new(), DSIG_NAMESPACE.to_string());
    scope
}

pub(crate) fn is_signature(el: &Element) -> bool {
    el.local_name() == "Signature"
}

/// The enveloped-signature transform: a copy without `Signature` subtrees.
fn without_signatures(el: &Element) -> Element {
    Element {
        name: el.name.clone(),
        attributes: el.attributes.clone(),
        children: el
            .children
            .iter()
            .filter_map(|node| match node {
                Node::Element(child) if is_signature(child) => None,
                Node::Element(child) => Some(Node::Element(without_signatures(child))),
                other => Some(other.clone()),
            })
            .collect(),
    }
}

fn algorithm(name: &str, uri: &str) -> Element {
    Element::new(name).with_attribute("Algorithm", uri)
}

fn signed_info(uri: &str, digest: &str) -> Element {
    Element::new("SignedInfo")
        .with_child(algorithm("CanonicalizationMethod", C14N_ALGORITHM))
        .with_child(algorithm("SignatureMethod", RSA_SHA1))
        .with_child(
            Element::new("Reference")
                .with_attribute("URI", uri)
                .with_child(
                    Element::new("Transforms")
                        .with_child(algorithm("Transform", ENVELOPED_SIGNATURE_TRANSFORM))
                        .with_child(algorithm("Transform", C14N_ALGORITHM)),
                )
                .with_child(algorithm("DigestMethod", SHA1_DIGEST))
                .with_child(Element::new("DigestValue").with_text(digest)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsig::credential::Validity;
    use chrono::{TimeZone, Utc};

    fn credential(with_key: bool) -> SigningCredential {
        let validity = Validity {
            not_before: Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap(),
            not_after: Utc.with_ymd_and_hms(2100, 1, 1, 0, 0, 0).unwrap(),
        };
        let key = with_key.then_some(include_str!("../../tests/fixtures/key.pem"));
        SigningCredential::from_pem(include_str!("../../tests/fixtures/cert.pem"), key, validity)
            .unwrap()
    }

    fn event() -> Element {
        parse(r#"<evento xmlns="http://www.portalfiscal.inf.br/nfe" versao="1.00"><infEvento Id="ID2102103524011234567800019555001000000001100000001901"><tpEvento>210210</tpEvento></infEvento></evento>"#).unwrap()
    }

    #[test]
    fn signature_is_last_child_of_parent() {
        let signed = sign(&event(), "infEvento", "Id", &credential(true)).unwrap();
        let last = signed.elements().last().unwrap();
        assert_eq!(last.local_name(), "Signature");
        assert_eq!(last.attribute("xmlns"), Some(DSIG_NAMESPACE));
        let reference = last.find("Reference").unwrap();
        assert_eq!(
            reference.attribute("URI"),
            Some("#ID2102103524011234567800019555001000000001100000001901")
        );
        assert!(!last.child_text("SignatureValue").unwrap().is_empty());
    }

    #[test]
    fn input_is_not_modified() {
        let doc = event();
        let before = doc.clone();
        sign(&doc, "infEvento", "Id", &credential(true)).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn digest_ignores_enveloped_signature() {
        let doc = event();
        let signed = sign(&doc, "infEvento", "Id", &credential(true)).unwrap();
        let a = reference_digest(&doc, &[0]).unwrap();
        let b = reference_digest(&signed, &[0]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn crlf_in_text_survives_transmission() {
        let mut doc = event();
        let inf = doc.at_path_mut(&[0]).unwrap();
        inf.push(Element::new("xJust").with_text("linha um\r\nlinha dois"));

        let cred = credential(true);
        let signed = sign(&doc, "infEvento", "Id", &cred).unwrap();
        let wire = signed.to_xml().unwrap();
        assert!(!wire.contains('\r'));
        assert_eq!(
            signed.find("xJust").unwrap().text(),
            "linha um\nlinha dois"
        );

        let public = cred.public_key().unwrap();
        crate::dsig::verify(&parse(&wire).unwrap(), &public).unwrap();
        crate::dsig::verify(&parse(&wire.replace('\n', "\r\n")).unwrap(), &public).unwrap();
    }

    #[test]
    fn errors() {
        let doc = event();
        assert!(matches!(
            sign(&doc, "infEvento", "Id", &credential(false)),
            Err(SefazError::NoPrivateKey)
        ));
        assert_eq!(
            sign(&doc, "", "Id", &credential(true)).unwrap_err().field(),
            Some("tag")
        );
        assert!(matches!(
            sign(&doc, "infNFe", "Id", &credential(true)),
            Err(SefazError::Signature(_))
        ));
        assert!(matches!(
            sign(&doc, "evento", "versao", &credential(true)),
            Err(SefazError::Signature(_))
        ));
        assert!(matches!(
            sign(&doc, "tpEvento", "Id", &credential(true)),
            Err(SefazError::Signature(_))
        ));
    }
}
