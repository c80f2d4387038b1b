use std::borrow::Cow;
use std::io::Cursor;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};

use super::XmlError;

/// A node inside an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Unescaped character data.
    Text(String),
    CData(String),
    Comment(String),
}

/// An owned XML element.
///
/// Names are kept as written (`prefix:local` or `local`) and attributes in
/// document order, namespace declarations included. Whitespace-only text is
/// preserved, so serializing a parsed tree keeps its layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    /// An element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder form of [`Element::set_attribute`].
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Append a text node.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Append a child element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Append a child element in place.
    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Name without namespace prefix.
    pub fn local_name(&self) -> &str {
        split_name(&self.name).1
    }

    /// Prefix of the qualified name, if any.
    pub fn prefix(&self) -> Option<&str> {
        split_name(&self.name).0
    }

    /// Attribute value by qualified name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Replace or append an attribute, keeping its position if present.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// `xmlns` / `xmlns:p` declarations on this element as `(prefix, uri)`,
    /// the default namespace having an empty prefix.
    pub fn namespace_declarations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().filter_map(|(k, v)| {
            if k == "xmlns" {
                Some(("", v.as_str()))
            } else {
                k.strip_prefix("xmlns:").map(|p| (p, v.as_str()))
            }
        })
    }

    /// Element children, skipping text and comments.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with the given local name.
    pub fn child(&self, local_name: &str) -> Option<&Element> {
        self.elements().find(|e| e.local_name() == local_name)
    }

    /// All child elements with the given local name.
    pub fn children_named<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.local_name() == local_name)
    }

    /// Concatenated text and CDATA of the direct children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) | Node::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Text of the first child element with the given local name.
    pub fn child_text(&self, local_name: &str) -> Option<String> {
        self.child(local_name).map(Element::text)
    }

    /// First element in document order (this one included) with the given
    /// local name.
    pub fn find(&self, local_name: &str) -> Option<&Element> {
        let path = self.find_path(|e| e.local_name() == local_name)?;
        self.at_path(&path)
    }

    /// Path of child indices to the first element in document order that
    /// matches `pred`. The empty path designates `self`.
    pub fn find_path(&self, pred: impl Fn(&Element) -> bool) -> Option<Vec<usize>> {
        fn walk(el: &Element, pred: &dyn Fn(&Element) -> bool, path: &mut Vec<usize>) -> bool {
            if pred(el) {
                return true;
            }
            for (i, node) in el.children.iter().enumerate() {
                if let Node::Element(child) = node {
                    path.push(i);
                    if walk(child, pred, path) {
                        return true;
                    }
                    path.pop();
                }
            }
            false
        }

        let mut path = Vec::new();
        walk(self, &pred, &mut path).then_some(path)
    }

    /// Element reached by following child-element indices from `self`.
    pub fn at_path(&self, path: &[usize]) -> Option<&Element> {
        let mut current = self;
        for &i in path {
            match current.children.get(i) {
                Some(Node::Element(e)) => current = e,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Mutable variant of [`Element::at_path`].
    pub fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut current = self;
        for &i in path {
            match current.children.get_mut(i) {
                Some(Node::Element(e)) => current = e,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Serialize without XML declaration. Empty elements are written as
    /// `<name/>`.
    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        write_element(&mut writer, self)?;
        String::from_utf8(writer.into_inner().into_inner())
            .map_err(|e| XmlError::Write(format!("UTF-8 error: {e}")))
    }
}

fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

fn xml_io(e: std::io::Error) -> XmlError {
    XmlError::Write(e.to_string())
}

fn write_element(w: &mut Writer<Cursor<Vec<u8>>>, el: &Element) -> Result<(), XmlError> {
    let mut start = BytesStart::new(el.name.as_str());
    for (k, v) in &el.attributes {
        start.push_attribute((k.as_str(), v.as_str()));
    }
    if el.children.is_empty() {
        return w.write_event(Event::Empty(start)).map_err(xml_io);
    }
    w.write_event(Event::Start(start)).map_err(xml_io)?;
    for node in &el.children {
        match node {
            Node::Element(child) => write_element(w, child)?,
            Node::Text(t) => w
                .write_event(Event::Text(BytesText::new(t)))
                .map_err(xml_io)?,
            Node::CData(t) => w
                .write_event(Event::CData(BytesCData::new(t.as_str())))
                .map_err(xml_io)?,
            Node::Comment(t) => w
                .write_event(Event::Comment(BytesText::from_escaped(t.as_str())))
                .map_err(xml_io)?,
        }
    }
    w.write_event(Event::End(BytesEnd::new(el.name.as_str())))
        .map_err(xml_io)
}

fn utf8(bytes: &[u8]) -> Result<&str, XmlError> {
    std::str::from_utf8(bytes).map_err(|e| XmlError::Malformed(format!("invalid UTF-8: {e}")))
}

fn start_element(e: &BytesStart<'_>) -> Result<Element, XmlError> {
    let mut el = Element::new(utf8(e.name().as_ref())?);
    for attr in e.attributes() {
        let attr = attr.map_err(|e| XmlError::Malformed(e.to_string()))?;
        let key = utf8(attr.key.as_ref())?.to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::Malformed(e.to_string()))?
            .into_owned();
        el.attributes.push((key, value));
    }
    Ok(el)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, el: Element) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(el));
    } else if root.is_some() {
        return Err(XmlError::Malformed("more than one root element".into()));
    } else {
        *root = Some(el);
    }
    Ok(())
}

fn normalize_line_endings(xml: &str) -> Cow<'_, str> {
    if xml.contains('\r') {
        Cow::Owned(xml.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(xml)
    }
}

/// Parse an XML document into its root element.
///
/// Whitespace is preserved apart from line endings: CRLF and lone CR become
/// LF before parsing (character references such as `&#13;` are kept). The
/// XML declaration and processing instructions are dropped; a DOCTYPE is
/// refused.
pub fn parse(xml: &str) -> Result<Element, XmlError> {
    let xml = normalize_line_endings(xml);
    let mut reader = Reader::from_str(&xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if root.is_some() && stack.is_empty() {
                    return Err(XmlError::Malformed("more than one root element".into()));
                }
                stack.push(start_element(e)?);
            }
            Ok(Event::Empty(ref e)) => {
                let el = start_element(e)?;
                attach(&mut stack, &mut root, el)?;
            }
            Ok(Event::End(_)) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| XmlError::Malformed("unexpected closing tag".into()))?;
                attach(&mut stack, &mut root, el)?;
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| XmlError::Malformed(e.to_string()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Text(text.into_owned())),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(XmlError::Malformed(
                            "text outside the root element".into(),
                        ));
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::CData(utf8(e)?.to_string()));
                }
            }
            Ok(Event::Comment(ref e)) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Comment(utf8(e)?.to_string()));
                }
            }
            Ok(Event::DocType(_)) => return Err(XmlError::DoctypeNotAllowed),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(XmlError::Malformed(format!(
                    "at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
        }
    }

    if !stack.is_empty() {
        return Err(XmlError::Malformed("unclosed element".into()));
    }
    root.ok_or(XmlError::Empty)
}
