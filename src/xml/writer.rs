use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::io::Cursor;

use super::{Element, XmlError, parse};

fn xml_io(e: std::io::Error) -> XmlError {
    XmlError::Write(format!("XML write error: {e}"))
}

/// Streaming builder for outbound messages.
///
/// Writes compact XML without declaration: SEFAZ messages travel inside a
/// SOAP body, where a declaration is not allowed.
pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    /// Start an empty document without XML declaration.
    pub fn new() -> Self {
        Self {
            writer: Writer::new(Cursor::new(Vec::new())),
        }
    }

    /// Finish and return the serialized document.
    pub fn into_string(self) -> Result<String, XmlError> {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| XmlError::Write(format!("XML UTF-8 error: {e}")))
    }

    /// Finish and parse the written message into a tree.
    pub fn into_element(self) -> Result<Element, XmlError> {
        parse(&self.into_string()?)
    }

    /// Open `<name>`.
    pub fn start_element(&mut self, name: &str) -> Result<&mut Self, XmlError> {
        let elem = BytesStart::new(name);
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    /// Open `<name>` with the given attributes, in order.
    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, XmlError> {
        let mut elem = BytesStart::new(name);
        for (k, v) in attrs {
            elem.push_attribute((*k, *v));
        }
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    /// Close `</name>`.
    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, XmlError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    /// Write `<name>text</name>`, escaping `text`.
    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, XmlError> {
        self.start_element(name)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    /// Write `name` only when `text` is present.
    pub fn optional_text_element(
        &mut self,
        name: &str,
        text: Option<&str>,
    ) -> Result<&mut Self, XmlError> {
        match text {
            Some(t) => self.text_element(name, t),
            None => Ok(self),
        }
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_compact_xml() {
        let mut w = XmlWriter::new();
        w.start_element_with_attrs("distDFeInt", &[("xmlns", "urn:x"), ("versao", "1.01")])
            .unwrap();
        w.text_element("tpAmb", "2").unwrap();
        w.optional_text_element("xJust", None).unwrap();
        w.text_element("note", "a < b").unwrap();
        w.end_element("distDFeInt").unwrap();
        assert_eq!(
            w.into_string().unwrap(),
            r#"<distDFeInt xmlns="urn:x" versao="1.01"><tpAmb>2</tpAmb><note>a &lt; b</note></distDFeInt>"#
        );
    }

    #[test]
    fn into_element_parses_result() {
        let mut w = XmlWriter::new();
        w.start_element("a").unwrap();
        w.text_element("b", "1").unwrap();
        w.end_element("a").unwrap();
        let el = w.into_element().unwrap();
        assert_eq!(el.child_text("b").as_deref(), Some("1"));
    }
}
