//! Minimal XML toolkit on top of quick-xml: an owned element tree, a
//! compact writer for outbound messages and inclusive canonicalization.

mod c14n;
mod tree;
mod writer;

use thiserror::Error;

pub use c14n::{C14N_ALGORITHM, NamespaceScope, canonicalize, inherited_namespaces};
pub use tree::{Element, Node, parse};
pub use writer::XmlWriter;

/// NF-e namespace.
pub const NFE_NAMESPACE: &str = "http://www.portalfiscal.inf.br/nfe";

/// XML-DSig namespace.
pub const DSIG_NAMESPACE: &str = "http://www.w3.org/2000/09/xmldsig#";

/// XML parsing or writing failure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum XmlError {
    #[error("malformed XML: {0}")]
    Malformed(String),

    /// DTD processing is prohibited.
    #[error("DOCTYPE declarations are not allowed")]
    DoctypeNotAllowed,

    #[error("document has no root element")]
    Empty,

    #[error("{0}")]
    Write(String),
}
