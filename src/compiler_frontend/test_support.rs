//! Small tree builders shared by the unit tests.
//! Every node lands in the root scope at line 1 unless a helper says otherwise.

use crate::compiler_frontend::ast::ast_nodes::{
    ActionKind, AstNode, CatchClause, FunctionBody, LabelId, Literal, NodeKind, Operator,
    TextLocation,
};
use crate::compiler_frontend::ast::node_ref::NodeRef;
use crate::compiler_frontend::ast::scopes::ScopeId;
use crate::compiler_frontend::string_interning::StringTable;

pub(crate) fn loc() -> TextLocation {
    TextLocation::new_just_line(1)
}

pub(crate) fn at_line(node: NodeRef, line: u32) -> NodeRef {
    let mut node = node.into_node();
    node.location = TextLocation::new_just_line(line);
    NodeRef::new(node)
}

pub(crate) fn in_scope(node: NodeRef, scope: ScopeId) -> NodeRef {
    let mut node = node.into_node();
    node.scope = scope;
    NodeRef::new(node)
}

pub(crate) fn node(kind: NodeKind) -> NodeRef {
    NodeRef::new(AstNode::new(kind, loc(), ScopeId::ROOT))
}

pub(crate) fn int(value: i64) -> NodeRef {
    NodeRef::new(AstNode::constant(Literal::Int(value), loc(), ScopeId::ROOT))
}

pub(crate) fn string(value: &str) -> NodeRef {
    NodeRef::new(AstNode::constant(
        Literal::Str(value.to_owned()),
        loc(),
        ScopeId::ROOT,
    ))
}

pub(crate) fn boolean(value: bool) -> NodeRef {
    NodeRef::new(AstNode::boolean(value, loc(), ScopeId::ROOT))
}

pub(crate) fn no_value() -> NodeRef {
    NodeRef::new(AstNode::no_value(loc(), ScopeId::ROOT))
}

pub(crate) fn sym(strings: &mut StringTable, name: &str) -> NodeRef {
    node(NodeKind::Symbol(strings.intern(name)))
}

pub(crate) fn call(callee: NodeRef, args: Vec<NodeRef>) -> NodeRef {
    NodeRef::new(AstNode::call(callee, tuple(args), loc(), ScopeId::ROOT))
}

/// A call to a named function, which the optimizer treats as having side effects
pub(crate) fn effect(strings: &mut StringTable, name: &str) -> NodeRef {
    let callee = sym(strings, name);
    call(callee, Vec::new())
}

pub(crate) fn tuple(items: Vec<NodeRef>) -> NodeRef {
    NodeRef::new(AstNode::tuple(items, loc(), ScopeId::ROOT))
}

pub(crate) fn block(items: Vec<NodeRef>) -> NodeRef {
    NodeRef::new(AstNode::block(items, loc(), ScopeId::ROOT))
}

pub(crate) fn binary(op: Operator, lhs: NodeRef, rhs: NodeRef) -> NodeRef {
    node(NodeKind::Operator {
        op,
        lhs,
        rhs: Some(rhs),
    })
}

pub(crate) fn unary(op: Operator, operand: NodeRef) -> NodeRef {
    node(NodeKind::Operator {
        op,
        lhs: operand,
        rhs: None,
    })
}

pub(crate) fn assign(strings: &mut StringTable, name: &str, value: NodeRef) -> NodeRef {
    let target = sym(strings, name);
    binary(Operator::Assign, target, value)
}

pub(crate) fn unbind(strings: &mut StringTable, name: &str) -> NodeRef {
    node(NodeKind::Unbind(strings.intern(name)))
}

pub(crate) fn bool_cast(inner: NodeRef, negate: bool) -> NodeRef {
    node(NodeKind::Bool { inner, negate })
}

pub(crate) fn conditional(
    condition: NodeRef,
    then_branch: NodeRef,
    else_branch: Option<NodeRef>,
) -> NodeRef {
    node(NodeKind::Conditional {
        condition,
        then_branch,
        else_branch,
    })
}

pub(crate) fn while_loop(condition: Option<NodeRef>, body: NodeRef) -> NodeRef {
    node(NodeKind::Loop { condition, body })
}

pub(crate) fn ret(value: Option<NodeRef>) -> NodeRef {
    node(NodeKind::Return(value))
}

pub(crate) fn throw(value: Option<NodeRef>) -> NodeRef {
    node(NodeKind::Throw(value))
}

pub(crate) fn action(action: ActionKind, operand: Option<NodeRef>) -> NodeRef {
    node(NodeKind::Action { action, operand })
}

pub(crate) fn label(target: u32, used: bool, base: Option<NodeRef>) -> NodeRef {
    node(NodeKind::Label {
        target: LabelId(target),
        used,
        base,
    })
}

pub(crate) fn expand(inner: NodeRef) -> NodeRef {
    node(NodeKind::Expand(inner))
}

/// A try whose handler binds nothing
pub(crate) fn try_catch(body: NodeRef, handler: Option<NodeRef>, finally: Option<NodeRef>) -> NodeRef {
    node(NodeKind::Try {
        body,
        handler: handler.map(|body| CatchClause {
            binding: None,
            body,
        }),
        finally,
    })
}

pub(crate) fn function(body: NodeRef) -> NodeRef {
    node(NodeKind::Function(Box::new(FunctionBody {
        name: None,
        params: Vec::new(),
        body,
    })))
}

/// Items of a tuple or block node, panics on anything else
pub(crate) fn items(node: &NodeRef) -> &[NodeRef] {
    match &node.kind {
        NodeKind::Multiple { items, .. } => items,
        other => panic!("expected a tuple or block, found {:?}", other.tag()),
    }
}

/// Callee and argument items of a call node, panics on anything else
pub(crate) fn call_parts(node: &NodeRef) -> (&NodeRef, &[NodeRef]) {
    match &node.kind {
        NodeKind::Operator {
            op: Operator::Call,
            lhs,
            rhs: Some(args),
        } => (lhs, items(args)),
        other => panic!("expected a call, found {:?}", other.tag()),
    }
}

pub(crate) fn symbol_name<'a>(node: &NodeRef, strings: &'a StringTable) -> &'a str {
    match &node.kind {
        NodeKind::Symbol(id) => strings.resolve(*id),
        other => panic!("expected a symbol, found {:?}", other.tag()),
    }
}

pub(crate) fn int_value(node: &NodeRef) -> i64 {
    match node.literal() {
        Some(Literal::Int(value)) => *value,
        other => panic!("expected an int constant, found {other:?}"),
    }
}

pub(crate) fn bool_value(node: &NodeRef) -> bool {
    match node.literal() {
        Some(Literal::Bool(value)) => *value,
        other => panic!("expected a bool constant, found {other:?}"),
    }
}
