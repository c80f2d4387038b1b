//! Inclusive Canonical XML 1.0, without comments, over a subtree.
//!
//! Only what the signature workflow needs: element subtrees of an already
//! parsed document. Namespace declarations inherited from ancestors are
//! rendered on the apex element.

use std::collections::BTreeMap;

use super::tree::{Element, Node};

/// `CanonicalizationMethod` / `Transform` algorithm URI.
pub const C14N_ALGORITHM: &str = "http://www.w3.org/TR/2001/REC-xml-c14n-20010315";

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Prefix → namespace URI. The default namespace has the empty prefix.
pub type NamespaceScope = BTreeMap<String, String>;

/// Namespaces in scope for the element at `path`, as declared by its
/// ancestors (the element's own declarations excluded).
pub fn inherited_namespaces(root: &Element, path: &[usize]) -> NamespaceScope {
    let mut scope = NamespaceScope::new();
    let mut current = root;
    for &i in path {
        declare(&mut scope, current);
        match current.children.get(i) {
            Some(Node::Element(child)) => current = child,
            _ => break,
        }
    }
    scope
}

/// Canonical form of `element` given the namespaces its ancestors put in
/// scope.
pub fn canonicalize(element: &Element, inherited: &NamespaceScope) -> String {
    let mut out = String::new();
    write_canonical(&mut out, element, inherited, &NamespaceScope::new());
    out
}

fn declare(scope: &mut NamespaceScope, el: &Element) {
    for (prefix, uri) in el.namespace_declarations() {
        scope.insert(prefix.to_string(), uri.to_string());
    }
}

fn write_canonical(
    out: &mut String,
    el: &Element,
    parent_scope: &NamespaceScope,
    rendered: &NamespaceScope,
) {
    let mut scope = parent_scope.clone();
    declare(&mut scope, el);

    // Namespace axis: BTreeMap order puts the default namespace first and
    // sorts the rest by prefix.
    let mut now_rendered = rendered.clone();
    let mut ns_nodes: Vec<(&str, &str)> = Vec::new();
    for (prefix, uri) in &scope {
        if prefix == "xml" {
            continue;
        }
        let previous = rendered.get(prefix).map(String::as_str);
        if prefix.is_empty() && uri.is_empty() {
            if previous.is_some_and(|u| !u.is_empty()) {
                ns_nodes.push(("", ""));
                now_rendered.insert(String::new(), String::new());
            }
            continue;
        }
        if previous != Some(uri.as_str()) {
            ns_nodes.push((prefix, uri));
            now_rendered.insert(prefix.clone(), uri.clone());
        }
    }

    // Attribute axis, sorted by (namespace URI, local name).
    let mut attrs: Vec<(&str, &str, &str, &str)> = el
        .attributes
        .iter()
        .filter(|(k, _)| k != "xmlns" && !k.starts_with("xmlns:"))
        .map(|(k, v)| {
            let (ns, local) = match k.split_once(':') {
                Some(("xml", local)) => (XML_NAMESPACE, local),
                Some((prefix, local)) => (scope.get(prefix).map_or("", String::as_str), local),
                None => ("", k.as_str()),
            };
            (ns, local, k.as_str(), v.as_str())
        })
        .collect();
    attrs.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    out.push('<');
    out.push_str(&el.name);
    for (prefix, uri) in ns_nodes {
        if prefix.is_empty() {
            out.push_str(" xmlns=\"");
        } else {
            out.push_str(" xmlns:");
            out.push_str(prefix);
            out.push_str("=\"");
        }
        escape_attribute(out, uri);
        out.push('"');
    }
    for (_, _, name, value) in attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attribute(out, value);
        out.push('"');
    }
    out.push('>');

    for node in &el.children {
        match node {
            Node::Element(child) => write_canonical(out, child, &scope, &now_rendered),
            Node::Text(t) | Node::CData(t) => escape_text(out, t),
            Node::Comment(_) => {}
        }
    }

    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

fn escape_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse;

    #[test]
    fn apex_renders_inherited_default_namespace() {
        let doc = parse(
            r#"<envEvento xmlns="http://www.portalfiscal.inf.br/nfe" versao="1.00"><evento versao="1.00"><infEvento Id="ID1"><cOrgao>91</cOrgao></infEvento></evento></envEvento>"#,
        )
        .unwrap();
        let path = doc.find_path(|e| e.local_name() == "infEvento").unwrap();
        let scope = inherited_namespaces(&doc, &path);
        let c14n = canonicalize(doc.at_path(&path).unwrap(), &scope);
        assert_eq!(
            c14n,
            r#"<infEvento xmlns="http://www.portalfiscal.inf.br/nfe" Id="ID1"><cOrgao>91</cOrgao></infEvento>"#
        );
    }

    #[test]
    fn descendants_do_not_repeat_namespaces() {
        let doc = parse(r#"<a xmlns="urn:a"><b xmlns="urn:a"><c xmlns="urn:c"/></b></a>"#).unwrap();
        assert_eq!(
            canonicalize(&doc, &NamespaceScope::new()),
            r#"<a xmlns="urn:a"><b><c xmlns="urn:c"></c></b></a>"#
        );
    }

    #[test]
    fn attributes_are_sorted_and_escaped() {
        let doc = parse("<e z=\"1\" xmlns:p=\"urn:p\" p:a=\"x\" b=\"a&quot;&#10;\" a=\"&lt;\"/>").unwrap();
        assert_eq!(
            canonicalize(&doc, &NamespaceScope::new()),
            "<e xmlns:p=\"urn:p\" a=\"&lt;\" b=\"a&quot;&#xA;\" z=\"1\" p:a=\"x\"></e>"
        );
    }

    #[test]
    fn comments_dropped_and_text_escaped() {
        let doc = parse("<a><!-- note -->x &gt; y &amp; <![CDATA[<z>]]></a>").unwrap();
        assert_eq!(
            canonicalize(&doc, &NamespaceScope::new()),
            "<a>x &gt; y &amp; &lt;z&gt;</a>"
        );
    }

    #[test]
    fn default_namespace_undeclaration() {
        let doc = parse(r#"<a xmlns="urn:a"><b xmlns=""/></a>"#).unwrap();
        assert_eq!(
            canonicalize(&doc, &NamespaceScope::new()),
            r#"<a xmlns="urn:a"><b xmlns=""></b></a>"#
        );
        // an empty default at the apex is not rendered
        let b = doc.child("b").unwrap();
        assert_eq!(canonicalize(b, &NamespaceScope::new()), "<b></b>");
    }
}
