//! Small helpers for pulling structured data out of the generic
//! `ParseNode` tree. Every accessor here fails with `MalformedTree`
//! instead of panicking or indexing out of bounds — the tree comes
//! from an external parser, so a wrong child count is treated as data,
//! not a programmer error in the walker.

use parse_tree::{NodeKind, ParseNode};
use shared_context::types::Type;

use crate::diagnostics::MalformedTree;

pub(crate) fn child<'n>(node: &'n ParseNode, index: usize) -> Result<&'n ParseNode, MalformedTree> {
    node.children.get(index).ok_or_else(|| {
        MalformedTree::new(
            node.line,
            format!("{:?} node missing child #{}", node.kind, index),
        )
    })
}

pub(crate) fn text<'n>(node: &'n ParseNode) -> Result<&'n str, MalformedTree> {
    node.text
        .as_deref()
        .ok_or_else(|| MalformedTree::new(node.line, format!("{:?} node missing text", node.kind)))
}

/// Resolves a `Type` node (`integer | float | string | boolean`, or
/// `array` wrapping one more `Type` node per `[]` in the surface
/// syntax) into the type lattice's `Type`.
pub(crate) fn resolve_type_node(node: &ParseNode) -> Result<Type, MalformedTree> {
    match text(node)? {
        "integer" => Ok(Type::Integer),
        "float" => Ok(Type::Float),
        "string" => Ok(Type::String),
        "boolean" => Ok(Type::Boolean),
        "array" => Ok(Type::array_of(resolve_type_node(child(node, 0)?)?)),
        other => Err(MalformedTree::new(
            node.line,
            format!("Type node with unrecognized text '{}'", other),
        )),
    }
}

/// Resolves a `TypeAnnotation` node (the `: T` surface syntax) down to
/// the single `Type` node it wraps.
pub(crate) fn resolve_type_annotation(node: &ParseNode) -> Result<Type, MalformedTree> {
    resolve_type_node(child(node, 0)?)
}

/// Classifies a `LiteralExpr` node's textual form per §4.5: a decimal
/// integer is `Integer`, a decimal with exactly one dot is `Float`, a
/// double-quoted run is `String`, and `true`/`false` is `Boolean`.
pub(crate) fn literal_type(text: &str) -> Type {
    if text == "true" || text == "false" {
        Type::Boolean
    } else if text.starts_with('"') {
        Type::String
    } else if text.contains('.') {
        Type::Float
    } else {
        Type::Integer
    }
}

/// Reads a `CodeFragment`'s place, falling back to a placeholder for a
/// fragment whose type already went `Unknown` upstream (no diagnostic
/// is owed for reusing that fragment's absent place — the original
/// failure already recorded one).
pub(crate) fn place(fragment: &ir_gen::CodeFragment) -> &str {
    fragment.place.as_deref().unwrap_or("<unknown>")
}

pub(crate) fn is_empty_slot(node: &ParseNode) -> bool {
    node.kind == NodeKind::Empty
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_type_classifies_decimal_forms() {
        assert_eq!(literal_type("42"), Type::Integer);
        assert_eq!(literal_type("4.2"), Type::Float);
        assert_eq!(literal_type("\"hi\""), Type::String);
        assert_eq!(literal_type("true"), Type::Boolean);
        assert_eq!(literal_type("false"), Type::Boolean);
    }

    #[test]
    fn resolve_type_node_builds_nested_arrays() {
        let leaf = ParseNode::with_text(NodeKind::Type, 1, "integer");
        let outer = ParseNode::with_text(NodeKind::Type, 1, "array").push(leaf);
        assert_eq!(
            resolve_type_node(&outer).unwrap(),
            Type::array_of(Type::Integer)
        );
    }
}
