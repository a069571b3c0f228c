use crate::compiler_frontend::ast::node_ref::NodeRef;
use crate::compiler_frontend::ast::scopes::ScopeId;
use crate::compiler_frontend::string_interning::{StringId, StringTable};
use serde::{Deserialize, Serialize};

/// Where a node came from in the source.
/// Used for diagnostics only; two nodes at the same location are still different nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextLocation {
    pub file: Option<StringId>,
    pub line: u32,
    pub column: u32,
}

impl TextLocation {
    pub fn new(file: StringId, line: u32, column: u32) -> Self {
        Self {
            file: Some(file),
            line,
            column,
        }
    }

    pub fn new_just_line(line: u32) -> Self {
        Self {
            file: None,
            line,
            column: 0,
        }
    }

    pub fn display(&self, string_table: &StringTable) -> String {
        match self.file {
            Some(file) => format!(
                "{}:{}:{}",
                string_table.resolve(file),
                self.line,
                self.column
            ),
            None => format!("line {}", self.line),
        }
    }
}

/// Facts established by the optimizer that codegen can rely on to skip work.
/// Stamped on a node when it is visited; stale facts are always the conservative default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFacts {
    pub constant: bool,
    pub side_effect_free: bool,
    pub boolean: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstNode {
    pub kind: NodeKind,
    pub location: TextLocation,
    pub scope: ScopeId,

    #[serde(default)]
    pub facts: NodeFacts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MultipleMode {
    // Builds a tuple from every element
    Tuple,
    // Evaluates every element and keeps the value of the last one
    Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Symbol(StringId),

    Multiple {
        items: Vec<NodeRef>,
        mode: MultipleMode,
    },

    Unbind(StringId),

    Return(Option<NodeRef>),
    Yield(Option<NodeRef>),
    Throw(Option<NodeRef>),

    Try {
        body: NodeRef,
        handler: Option<CatchClause>,
        finally: Option<NodeRef>,
    },

    // No condition means the loop only ends through a jump
    Loop {
        condition: Option<NodeRef>,
        body: NodeRef,
    },

    Conditional {
        condition: NodeRef,
        then_branch: NodeRef,
        else_branch: Option<NodeRef>,
    },

    // Truth test of the inner expression, optionally negated
    Bool {
        inner: NodeRef,
        negate: bool,
    },

    // Spreads the inner sequence into the enclosing tuple
    Expand(NodeRef),

    Function(Box<FunctionBody>),

    // A jump target. `used` is set by the parser when any jump names this label.
    Label {
        target: LabelId,
        used: bool,
        base: Option<NodeRef>,
    },

    Operator {
        op: Operator,
        lhs: NodeRef,
        rhs: Option<NodeRef>,
    },

    Action {
        action: ActionKind,
        operand: Option<NodeRef>,
    },

    Switch {
        subject: NodeRef,
        cases: Vec<SwitchCase>,
    },

    Assembly {
        code: String,
        operands: Vec<AssemblyOperand>,
    },

    ConstExpr(Literal),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    pub binding: Option<StringId>,
    pub body: NodeRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionBody {
    pub name: Option<StringId>,
    pub params: Vec<StringId>,
    pub body: NodeRef,
}

// A case with no patterns is the default case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    pub patterns: Vec<NodeRef>,
    pub body: NodeRef,
}

impl SwitchCase {
    pub fn is_default(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssemblyDirection {
    Input,
    Output,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyOperand {
    pub direction: AssemblyDirection,
    pub expr: NodeRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Break,
    Continue,
    Jump(LabelId),
    Pass,
}

impl ActionKind {
    /// Control never falls through to the next statement
    pub fn diverges(self) -> bool {
        !matches!(self, ActionKind::Pass)
    }

    pub fn to_str(self) -> &'static str {
        match self {
            ActionKind::Break => "break",
            ActionKind::Continue => "continue",
            ActionKind::Jump(_) => "jump",
            ActionKind::Pass => "pass",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    // Calls lhs with the argument tuple in rhs
    Call,
    // Assigns rhs to the symbol or index target in lhs
    Assign,
    Index,

    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,

    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Short circuiting, yield one of their operands
    And,
    Or,

    Not,
    Negate,
}

impl Operator {
    pub fn to_str(self) -> &'static str {
        match self {
            Operator::Call => "call",
            Operator::Assign => "=",
            Operator::Index => "[]",
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulus => "%",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Not => "not",
            Operator::Negate => "neg",
        }
    }

    pub fn is_unary(self) -> bool {
        matches!(self, Operator::Not | Operator::Negate)
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Operator::Equal
                | Operator::NotEqual
                | Operator::Less
                | Operator::LessEqual
                | Operator::Greater
                | Operator::GreaterEqual
        )
    }

    pub fn is_short_circuit(self) -> bool {
        matches!(self, Operator::And | Operator::Or)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    // The "no value" singleton
    NoValue,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Literal {
    pub fn truthiness(&self) -> bool {
        match self {
            Literal::NoValue => false,
            Literal::Bool(value) => *value,
            Literal::Int(value) => *value != 0,
            Literal::Float(value) => *value != 0.0,
            Literal::Str(value) => !value.is_empty(),
        }
    }
}

/// Discriminant of a node kind, used by the optimizer's visit frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeTag {
    Symbol,
    Multiple,
    Unbind,
    Return,
    Yield,
    Throw,
    Try,
    Loop,
    Conditional,
    Bool,
    Expand,
    Function,
    Label,
    Operator,
    Action,
    Switch,
    Assembly,
    ConstExpr,
}

impl NodeKind {
    pub fn tag(&self) -> NodeTag {
        match self {
            NodeKind::Symbol(_) => NodeTag::Symbol,
            NodeKind::Multiple { .. } => NodeTag::Multiple,
            NodeKind::Unbind(_) => NodeTag::Unbind,
            NodeKind::Return(_) => NodeTag::Return,
            NodeKind::Yield(_) => NodeTag::Yield,
            NodeKind::Throw(_) => NodeTag::Throw,
            NodeKind::Try { .. } => NodeTag::Try,
            NodeKind::Loop { .. } => NodeTag::Loop,
            NodeKind::Conditional { .. } => NodeTag::Conditional,
            NodeKind::Bool { .. } => NodeTag::Bool,
            NodeKind::Expand(_) => NodeTag::Expand,
            NodeKind::Function(_) => NodeTag::Function,
            NodeKind::Label { .. } => NodeTag::Label,
            NodeKind::Operator { .. } => NodeTag::Operator,
            NodeKind::Action { .. } => NodeTag::Action,
            NodeKind::Switch { .. } => NodeTag::Switch,
            NodeKind::Assembly { .. } => NodeTag::Assembly,
            NodeKind::ConstExpr(_) => NodeTag::ConstExpr,
        }
    }
}

impl AstNode {
    pub fn new(kind: NodeKind, location: TextLocation, scope: ScopeId) -> Self {
        Self {
            kind,
            location,
            scope,
            facts: NodeFacts::default(),
        }
    }

    pub fn constant(value: Literal, location: TextLocation, scope: ScopeId) -> Self {
        Self::new(NodeKind::ConstExpr(value), location, scope)
    }

    pub fn no_value(location: TextLocation, scope: ScopeId) -> Self {
        Self::constant(Literal::NoValue, location, scope)
    }

    pub fn boolean(value: bool, location: TextLocation, scope: ScopeId) -> Self {
        Self::constant(Literal::Bool(value), location, scope)
    }

    pub fn call(callee: NodeRef, args: NodeRef, location: TextLocation, scope: ScopeId) -> Self {
        Self::new(
            NodeKind::Operator {
                op: Operator::Call,
                lhs: callee,
                rhs: Some(args),
            },
            location,
            scope,
        )
    }

    pub fn tuple(items: Vec<NodeRef>, location: TextLocation, scope: ScopeId) -> Self {
        Self::new(
            NodeKind::Multiple {
                items,
                mode: MultipleMode::Tuple,
            },
            location,
            scope,
        )
    }

    pub fn block(items: Vec<NodeRef>, location: TextLocation, scope: ScopeId) -> Self {
        Self::new(
            NodeKind::Multiple {
                items,
                mode: MultipleMode::Block,
            },
            location,
            scope,
        )
    }

    pub fn is_call(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Operator {
                op: Operator::Call,
                ..
            }
        )
    }

    pub fn is_tuple(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Multiple {
                mode: MultipleMode::Tuple,
                ..
            }
        )
    }

    pub fn literal(&self) -> Option<&Literal> {
        match &self.kind {
            NodeKind::ConstExpr(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_no_value(&self) -> bool {
        matches!(self.kind, NodeKind::ConstExpr(Literal::NoValue))
    }

    /// Calls `f` on every direct child slot, in evaluation order
    pub fn for_each_child<'a>(&'a self, mut f: impl FnMut(&'a NodeRef)) {
        match &self.kind {
            NodeKind::Symbol(_) | NodeKind::Unbind(_) | NodeKind::ConstExpr(_) => {}
            NodeKind::Multiple { items, .. } => items.iter().for_each(f),
            NodeKind::Return(value) | NodeKind::Yield(value) | NodeKind::Throw(value) => {
                if let Some(value) = value {
                    f(value);
                }
            }
            NodeKind::Try {
                body,
                handler,
                finally,
            } => {
                f(body);
                if let Some(handler) = handler {
                    f(&handler.body);
                }
                if let Some(finally) = finally {
                    f(finally);
                }
            }
            NodeKind::Loop { condition, body } => {
                if let Some(condition) = condition {
                    f(condition);
                }
                f(body);
            }
            NodeKind::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                f(condition);
                f(then_branch);
                if let Some(else_branch) = else_branch {
                    f(else_branch);
                }
            }
            NodeKind::Bool { inner, .. } | NodeKind::Expand(inner) => f(inner),
            NodeKind::Function(function) => f(&function.body),
            NodeKind::Label { base, .. } => {
                if let Some(base) = base {
                    f(base);
                }
            }
            NodeKind::Operator { lhs, rhs, .. } => {
                f(lhs);
                if let Some(rhs) = rhs {
                    f(rhs);
                }
            }
            NodeKind::Action { operand, .. } => {
                if let Some(operand) = operand {
                    f(operand);
                }
            }
            NodeKind::Switch { subject, cases } => {
                f(subject);
                for case in cases {
                    case.patterns.iter().for_each(&mut f);
                    f(&case.body);
                }
            }
            NodeKind::Assembly { operands, .. } => {
                for operand in operands {
                    f(&operand.expr);
                }
            }
        }
    }

    /// Mutable version of `for_each_child`, used when deep-duplicating a subtree
    pub fn for_each_child_mut(&mut self, mut f: impl FnMut(&mut NodeRef)) {
        match &mut self.kind {
            NodeKind::Symbol(_) | NodeKind::Unbind(_) | NodeKind::ConstExpr(_) => {}
            NodeKind::Multiple { items, .. } => items.iter_mut().for_each(f),
            NodeKind::Return(value) | NodeKind::Yield(value) | NodeKind::Throw(value) => {
                if let Some(value) = value {
                    f(value);
                }
            }
            NodeKind::Try {
                body,
                handler,
                finally,
            } => {
                f(body);
                if let Some(handler) = handler {
                    f(&mut handler.body);
                }
                if let Some(finally) = finally {
                    f(finally);
                }
            }
            NodeKind::Loop { condition, body } => {
                if let Some(condition) = condition {
                    f(condition);
                }
                f(body);
            }
            NodeKind::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                f(condition);
                f(then_branch);
                if let Some(else_branch) = else_branch {
                    f(else_branch);
                }
            }
            NodeKind::Bool { inner, .. } | NodeKind::Expand(inner) => f(inner),
            NodeKind::Function(function) => f(&mut function.body),
            NodeKind::Label { base, .. } => {
                if let Some(base) = base {
                    f(base);
                }
            }
            NodeKind::Operator { lhs, rhs, .. } => {
                f(lhs);
                if let Some(rhs) = rhs {
                    f(rhs);
                }
            }
            NodeKind::Action { operand, .. } => {
                if let Some(operand) = operand {
                    f(operand);
                }
            }
            NodeKind::Switch { subject, cases } => {
                f(subject);
                for case in cases {
                    case.patterns.iter_mut().for_each(&mut f);
                    f(&mut case.body);
                }
            }
            NodeKind::Assembly { operands, .. } => {
                for operand in operands {
                    f(&mut operand.expr);
                }
            }
        }
    }
}
