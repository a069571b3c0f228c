use crate::compiler_frontend::ast::ast_nodes::AstNode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Handle to an AST node.
///
/// A node is normally owned by exactly one parent slot, but rewrites such as annotation
/// desugaring can make the same subtree reachable from several parents.
/// The holder count decides what a rewrite may do:
/// - one holder: the node can be mutated or have its child vector grown in place
/// - more than one: the node must be cloned first (`make_mut` does this)
///
/// Reading through the handle is always fine.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRef(Arc<AstNode>);

impl NodeRef {
    pub fn new(node: AstNode) -> Self {
        Self(Arc::new(node))
    }

    /// Number of live handles to this node
    #[inline]
    pub fn holder_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    #[inline]
    pub fn is_unique(&self) -> bool {
        self.holder_count() == 1
    }

    /// Another handle to the same node. Both holders now see the node as shared.
    #[inline]
    pub fn share(&self) -> Self {
        Self(Arc::clone(&self.0))
    }

    /// Mutable access for a rewrite.
    /// Clones the node first if anyone else holds it, so other holders never see the change.
    #[inline]
    pub fn make_mut(&mut self) -> &mut AstNode {
        Arc::make_mut(&mut self.0)
    }

    /// Mutable access only when this is the sole holder
    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut AstNode> {
        Arc::get_mut(&mut self.0)
    }

    /// A copy of this node whose child slots still share the original children
    pub fn detach(&self) -> AstNode {
        (*self.0).clone()
    }

    /// Takes the node out of the handle, cloning it only if it is shared
    pub fn into_node(self) -> AstNode {
        Arc::unwrap_or_clone(self.0)
    }

    /// Duplicates the whole subtree so that nothing is shared with the original
    pub fn deep_clone(&self) -> Self {
        let mut node = self.detach();
        node.for_each_child_mut(|child| *child = child.deep_clone());
        Self::new(node)
    }

    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl Deref for NodeRef {
    type Target = AstNode;

    fn deref(&self) -> &AstNode {
        &self.0
    }
}

impl From<AstNode> for NodeRef {
    fn from(node: AstNode) -> Self {
        Self::new(node)
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}
