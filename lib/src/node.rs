//! Normalizes node references that may arrive as plain IRI strings or as
//! already-typed oxigraph nodes into `NamedOrBlankNode`.

use anyhow::Result;
use oxigraph::model::{BlankNode, NamedNode, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef};

/// A reference to a subject node: either an IRI string or a typed node.
///
/// Strings starting with `_:` are read as blank node labels, anything else must
/// be an absolute IRI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeInput {
    Iri(String),
    Node(NamedOrBlankNode),
}

impl From<&str> for NodeInput {
    fn from(value: &str) -> Self {
        NodeInput::Iri(value.to_string())
    }
}

impl From<String> for NodeInput {
    fn from(value: String) -> Self {
        NodeInput::Iri(value)
    }
}

impl From<&String> for NodeInput {
    fn from(value: &String) -> Self {
        NodeInput::Iri(value.clone())
    }
}

impl From<NamedNode> for NodeInput {
    fn from(value: NamedNode) -> Self {
        NodeInput::Node(value.into())
    }
}

impl From<NamedNodeRef<'_>> for NodeInput {
    fn from(value: NamedNodeRef<'_>) -> Self {
        NodeInput::Node(value.into_owned().into())
    }
}

impl From<BlankNode> for NodeInput {
    fn from(value: BlankNode) -> Self {
        NodeInput::Node(value.into())
    }
}

impl From<NamedOrBlankNode> for NodeInput {
    fn from(value: NamedOrBlankNode) -> Self {
        NodeInput::Node(value)
    }
}

impl From<NamedOrBlankNodeRef<'_>> for NodeInput {
    fn from(value: NamedOrBlankNodeRef<'_>) -> Self {
        NodeInput::Node(value.into_owned())
    }
}

/// Converts a node/string into just a node
pub fn normalize_node(input: impl Into<NodeInput>) -> Result<NamedOrBlankNode> {
    match input.into() {
        NodeInput::Node(node) => Ok(node),
        NodeInput::Iri(value) => match value.strip_prefix("_:") {
            Some(label) => Ok(BlankNode::new(label)?.into()),
            None => Ok(NamedNode::new(value)?.into()),
        },
    }
}

/// Parses an IRI string into a `NamedNode`, used for predicates and graph names.
pub fn normalize_iri(input: &str) -> Result<NamedNode> {
    Ok(NamedNode::new(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_string_iri() {
        let node = normalize_node("https://example.com/item").unwrap();
        assert_eq!(
            node,
            NamedOrBlankNode::NamedNode(NamedNode::new("https://example.com/item").unwrap())
        );
    }

    #[test]
    fn test_normalize_keeps_typed_nodes() {
        let blank = BlankNode::default();
        let node = normalize_node(blank.clone()).unwrap();
        assert_eq!(node, NamedOrBlankNode::BlankNode(blank));
    }

    #[test]
    fn test_normalize_blank_label() {
        let node = normalize_node("_:b0").unwrap();
        assert_eq!(node, NamedOrBlankNode::BlankNode(BlankNode::new("b0").unwrap()));
    }

    #[test]
    fn test_normalize_rejects_relative_iri() {
        assert!(normalize_node("not an iri").is_err());
    }
}
