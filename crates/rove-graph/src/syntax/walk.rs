//! Enter/leave traversal over the lowered tree.

use super::Node;

/// Returned from [`Visitor::enter`] to continue into a node's children or skip them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    Continue,
    /// Do not descend; `leave` is not called for the skipped node either.
    Skip,
}

pub trait Visitor<'n> {
    type Error;

    fn enter(&mut self, node: &'n Node, parent: Option<&'n Node>)
    -> Result<WalkControl, Self::Error>;

    fn leave(&mut self, _node: &'n Node, _parent: Option<&'n Node>) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Depth-first walk calling `enter` before and `leave` after each node's children.
pub fn walk<'n, V: Visitor<'n>>(
    visitor: &mut V,
    node: &'n Node,
    parent: Option<&'n Node>,
) -> Result<(), V::Error> {
    if visitor.enter(node, parent)? == WalkControl::Skip {
        return Ok(());
    }

    for child in node.children() {
        walk(visitor, child, Some(node))?;
    }

    visitor.leave(node, parent)
}
