//! SOAP 1.2 framing for the two SEFAZ services.

use super::{Service, TransportError};
use crate::xml::{Element, XmlError};

pub const SOAP12_NAMESPACE: &str = "http://www.w3.org/2003/05/soap-envelope";

const DISTRIBUTION_WSDL: &str = "http://www.portalfiscal.inf.br/nfe/wsdl/NFeDistribuicaoDFe";
const EVENT_WSDL: &str = "http://www.portalfiscal.inf.br/nfe/wsdl/NFeRecepcaoEvento4";

impl Service {
    /// WSDL namespace of the service.
    pub fn wsdl_namespace(self) -> &'static str {
        match self {
            Self::Distribution => DISTRIBUTION_WSDL,
            Self::EventReception => EVENT_WSDL,
        }
    }

    /// `action` parameter of the SOAP 1.2 content type.
    pub fn soap_action(self) -> String {
        match self {
            Self::Distribution => format!("{DISTRIBUTION_WSDL}/nfeDistDFeInteresse"),
            Self::EventReception => format!("{EVENT_WSDL}/nfeRecepcaoEvento"),
        }
    }

    /// `Content-Type` header value, action included.
    pub fn content_type(self) -> String {
        format!(
            "application/soap+xml; charset=utf-8; action=\"{}\"",
            self.soap_action()
        )
    }

    /// Local names under which the service returns its message.
    fn result_elements(self) -> &'static [&'static str] {
        match self {
            Self::Distribution => &["nfeDistDFeInteresseResult"],
            Self::EventReception => &["nfeResultMsg", "nfeRecepcaoEventoNFResult"],
        }
    }
}

/// Wrap a SEFAZ message in a SOAP 1.2 envelope.
pub fn wrap(service: Service, message: &Element) -> Result<String, XmlError> {
    let data = Element::new("nfeDadosMsg").with_child(message.clone());
    let payload = match service {
        Service::Distribution => Element::new("nfeDistDFeInteresse")
            .with_attribute("xmlns", service.wsdl_namespace())
            .with_child(data),
        Service::EventReception => data.with_attribute("xmlns", service.wsdl_namespace()),
    };
    let envelope = Element::new("soap12:Envelope")
        .with_attribute("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance")
        .with_attribute("xmlns:xsd", "http://www.w3.org/2001/XMLSchema")
        .with_attribute("xmlns:soap12", SOAP12_NAMESPACE)
        .with_child(Element::new("soap12:Body").with_child(payload));
    Ok(format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>{}",
        envelope.to_xml()?
    ))
}

/// Extract the SEFAZ message from a SOAP response envelope.
pub fn unwrap(service: Service, envelope: &Element) -> Result<Element, TransportError> {
    let body = envelope
        .child("Body")
        .ok_or_else(|| TransportError::Envelope("missing SOAP Body".into()))?;

    if let Some(fault) = body.child("Fault") {
        let reason = fault
            .find("Text")
            .or_else(|| fault.find("faultstring"))
            .map(Element::text)
            .unwrap_or_else(|| "unspecified SOAP fault".into());
        return Err(TransportError::Envelope(format!("SOAP fault: {reason}")));
    }

    let result = service
        .result_elements()
        .iter()
        .find_map(|name| body.find(name))
        .ok_or_else(|| {
            TransportError::Envelope(format!(
                "no {} in SOAP Body",
                service.result_elements().join(" or ")
            ))
        })?;

    result
        .elements()
        .next()
        .cloned()
        .ok_or_else(|| TransportError::Envelope("empty result element".into()))
}
