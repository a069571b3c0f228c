//! Read-only questions the rewrite rules ask about a subtree.

use crate::compiler_frontend::ast::ast_nodes::{AstNode, Literal, MultipleMode, NodeFacts, NodeKind, Operator};
use crate::compiler_frontend::ast::scopes::ScopeArena;
use crate::compiler_frontend::optimizers::assumptions::{Assumption, AssumptionSet, SymbolKey};

/// Whether evaluating the node can do anything other than produce its value.
///
/// Reading a symbol and building a function object count as pure,
/// calls and anything that changes control flow do not.
/// Operators on plain values are pure; overloaded operators are a runtime concern.
/// Whether the node can raise instead is answered by [`TruthQuery::may_throw`].
pub fn has_side_effects(node: &AstNode) -> bool {
    match &node.kind {
        NodeKind::Symbol(_) | NodeKind::ConstExpr(_) | NodeKind::Function(_) => false,

        NodeKind::Multiple { items, .. } => items.iter().any(|item| has_side_effects(item)),
        NodeKind::Bool { inner, .. } | NodeKind::Expand(inner) => has_side_effects(inner),

        NodeKind::Conditional {
            condition,
            then_branch,
            else_branch,
        } => {
            has_side_effects(condition)
                || has_side_effects(then_branch)
                || else_branch.as_ref().is_some_and(|branch| has_side_effects(branch))
        }

        NodeKind::Operator { op, lhs, rhs } => match op {
            Operator::Call | Operator::Assign | Operator::Index => true,
            _ => has_side_effects(lhs) || rhs.as_ref().is_some_and(|rhs| has_side_effects(rhs)),
        },

        // Labels stay where they are, something may jump to them
        NodeKind::Label { .. } => true,

        NodeKind::Unbind(_)
        | NodeKind::Return(_)
        | NodeKind::Yield(_)
        | NodeKind::Throw(_)
        | NodeKind::Try { .. }
        | NodeKind::Loop { .. }
        | NodeKind::Action { .. }
        | NodeKind::Switch { .. }
        | NodeKind::Assembly { .. } => true,
    }
}

/// Whether the node always produces a boolean value
pub fn is_boolean_typed(node: &AstNode) -> bool {
    match &node.kind {
        NodeKind::ConstExpr(Literal::Bool(_)) | NodeKind::Bool { .. } => true,
        NodeKind::Operator { op, .. } => op.is_comparison() || *op == Operator::Not,
        NodeKind::Multiple {
            items,
            mode: MultipleMode::Block,
        } => items.last().is_some_and(|last| is_boolean_typed(last)),
        NodeKind::Conditional {
            then_branch,
            else_branch: Some(else_branch),
            ..
        } => is_boolean_typed(then_branch) && is_boolean_typed(else_branch),
        _ => false,
    }
}

/// Facts stamped on a node for codegen after it has been optimized
pub fn facts_of(node: &AstNode, query: &TruthQuery) -> NodeFacts {
    NodeFacts {
        constant: node.literal().is_some(),
        side_effect_free: !has_side_effects(node) && !query.may_throw(node),
        boolean: is_boolean_typed(node),
    }
}

/// Answers truth-value questions using the assumptions of the current path.
/// Recursion stops at `unwind_limit` levels, past which a value counts as unknown.
pub struct TruthQuery<'a, 'p> {
    pub scopes: &'a ScopeArena,
    pub assumptions: &'a AssumptionSet<'p>,
    pub unwind_limit: u32,
}

impl TruthQuery<'_, '_> {
    pub fn truth_value(&self, node: &AstNode) -> Option<bool> {
        self.truth_at_depth(node, 0)
    }

    /// Whether evaluating the node may raise.
    /// Operators are only safe when they fold on literal operands,
    /// symbol reads only when the symbol is known to be bound on this path.
    pub fn may_throw(&self, node: &AstNode) -> bool {
        match &node.kind {
            NodeKind::ConstExpr(_) | NodeKind::Function(_) => false,

            NodeKind::Symbol(name) => !self
                .assumptions
                .get(SymbolKey::resolve(self.scopes, node.scope, *name))
                .is_bound(),

            NodeKind::Multiple { items, .. } => items.iter().any(|item| self.may_throw(item)),
            NodeKind::Bool { inner, .. } => self.may_throw(inner),

            // Spreading depends on the runtime value unless it is a tuple right here
            NodeKind::Expand(inner) => !inner.is_tuple() || self.may_throw(inner),

            NodeKind::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                self.may_throw(condition)
                    || self.may_throw(then_branch)
                    || else_branch.as_ref().is_some_and(|branch| self.may_throw(branch))
            }

            NodeKind::Operator { op, lhs, rhs } => match (op, rhs) {
                // Every value has a truthiness
                (Operator::Not, None) => self.may_throw(lhs),
                (op, Some(rhs)) if op.is_short_circuit() => {
                    self.may_throw(lhs) || self.may_throw(rhs)
                }
                (Operator::Call | Operator::Assign | Operator::Index, _) => true,
                (op, None) if op.is_unary() => match lhs.literal() {
                    Some(value) => value.evaluate_unary(*op).is_none(),
                    None => true,
                },
                (op, Some(rhs)) => match (lhs.literal(), rhs.literal()) {
                    (Some(lhs), Some(rhs)) => lhs.evaluate_operator(rhs, *op).is_none(),
                    _ => true,
                },
                _ => true,
            },

            _ => true,
        }
    }

    fn truth_at_depth(&self, node: &AstNode, depth: u32) -> Option<bool> {
        if depth > self.unwind_limit {
            return None;
        }
        let depth = depth + 1;

        match &node.kind {
            NodeKind::ConstExpr(value) => Some(value.truthiness()),

            NodeKind::Symbol(name) => self
                .assumptions
                .get(SymbolKey::resolve(self.scopes, node.scope, *name))
                .truth(),

            NodeKind::Bool { inner, negate } => self
                .truth_at_depth(inner, depth)
                .map(|truth| truth != *negate),

            NodeKind::Function(_) => Some(true),

            NodeKind::Multiple { items, mode } => match mode {
                MultipleMode::Tuple => {
                    if items.iter().any(|item| matches!(item.kind, NodeKind::Expand(_))) {
                        None
                    } else {
                        Some(!items.is_empty())
                    }
                }
                MultipleMode::Block => match items.last() {
                    Some(last) => self.truth_at_depth(last, depth),
                    None => Some(false),
                },
            },

            NodeKind::Operator { op, lhs, rhs } => match (op, rhs) {
                (Operator::Not, None) => self.truth_at_depth(lhs, depth).map(|truth| !truth),

                // `a and b` is `a` when `a` is falsy, otherwise `b`
                (Operator::And, Some(rhs)) => match self.truth_at_depth(lhs, depth) {
                    Some(false) => Some(false),
                    Some(true) => self.truth_at_depth(rhs, depth),
                    None => match self.truth_at_depth(rhs, depth) {
                        Some(false) => Some(false),
                        _ => None,
                    },
                },

                (Operator::Or, Some(rhs)) => match self.truth_at_depth(lhs, depth) {
                    Some(true) => Some(true),
                    Some(false) => self.truth_at_depth(rhs, depth),
                    None => match self.truth_at_depth(rhs, depth) {
                        Some(true) => Some(true),
                        _ => None,
                    },
                },

                (Operator::Assign, Some(value)) => self.truth_at_depth(value, depth),

                _ => None,
            },

            _ => None,
        }
    }
}

/// Records what the condition tells us on the path where it evaluated to `truth`
pub fn refine(
    scopes: &ScopeArena,
    assumptions: &mut AssumptionSet<'_>,
    condition: &AstNode,
    truth: bool,
) {
    match &condition.kind {
        NodeKind::Symbol(name) => {
            let key = SymbolKey::resolve(scopes, condition.scope, *name);
            assumptions.set(key, Assumption::from_truth(Some(truth)));
        }

        NodeKind::Bool { inner, negate } => refine(scopes, assumptions, inner, truth != *negate),

        NodeKind::Operator {
            op: Operator::Not,
            lhs,
            rhs: None,
        } => refine(scopes, assumptions, lhs, !truth),

        // Both sides of a true `and` were truthy, both sides of a false `or` were falsy
        NodeKind::Operator {
            op: Operator::And,
            lhs,
            rhs: Some(rhs),
        } if truth => {
            refine(scopes, assumptions, lhs, true);
            refine(scopes, assumptions, rhs, true);
        }
        NodeKind::Operator {
            op: Operator::Or,
            lhs,
            rhs: Some(rhs),
        } if !truth => {
            refine(scopes, assumptions, lhs, false);
            refine(scopes, assumptions, rhs, false);
        }

        _ => {}
    }
}

/// Symbols a subtree may rebind or unbind
#[derive(Debug, Default)]
pub struct AssignedSymbols {
    // Something in the subtree can change any symbol (a call, a yield, a label, inline assembly)
    pub everything: bool,
    pub keys: Vec<SymbolKey>,
}

impl AssignedSymbols {
    pub fn collect(node: &AstNode, scopes: &ScopeArena) -> Self {
        let mut assigned = AssignedSymbols::default();
        assigned.visit(node, scopes);
        assigned
    }

    pub fn merge(mut self, other: AssignedSymbols) -> Self {
        self.everything |= other.everything;
        self.keys.extend(other.keys);
        self
    }

    pub fn forget_in(&self, assumptions: &mut AssumptionSet<'_>) {
        if self.everything {
            assumptions.forget_all();
            return;
        }

        for key in &self.keys {
            assumptions.forget(*key);
        }
    }

    fn visit(&mut self, node: &AstNode, scopes: &ScopeArena) {
        if self.everything {
            return;
        }

        match &node.kind {
            NodeKind::Operator {
                op: Operator::Call, ..
            }
            | NodeKind::Yield(_)
            | NodeKind::Label { .. }
            | NodeKind::Assembly { .. } => {
                self.everything = true;
                return;
            }

            NodeKind::Operator {
                op: Operator::Assign,
                lhs,
                ..
            } => {
                if let NodeKind::Symbol(name) = lhs.kind {
                    self.keys.push(SymbolKey::resolve(scopes, lhs.scope, name));
                }
            }

            NodeKind::Unbind(name) => {
                self.keys.push(SymbolKey::resolve(scopes, node.scope, *name));
            }

            // A nested function body runs later, only a call can run it
            NodeKind::Function(_) => return,

            _ => {}
        }

        node.for_each_child(|child| self.visit(child, scopes));
    }
}
