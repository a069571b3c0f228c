//! Rewrites for nodes that steer control flow.
//!
//! Every construct with more than one path forks the assumption set per path
//! and joins the forks where the paths meet again.

use crate::compiler_frontend::ast::ast_nodes::{AstNode, NodeKind};
use crate::compiler_frontend::ast::node_ref::NodeRef;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::optimizers::assumptions::{AssumptionSet, BranchOutcome, SymbolKey};
use crate::compiler_frontend::optimizers::node_facts::{AssignedSymbols, refine};
use crate::compiler_frontend::optimizers::optimizer::{Optimizer, RewriteRule, VisitFrame, take_kind};

impl Optimizer<'_> {
    /// Return, yield and throw always need the value they carry
    pub(crate) fn optimize_exit(
        &mut self,
        node: &mut AstNode,
        frame: &VisitFrame<'_>,
        assumptions: &mut AssumptionSet<'_>,
    ) -> Result<Option<NodeRef>, CompilerError> {
        let (value, diverges) = match &mut node.kind {
            NodeKind::Return(value) | NodeKind::Throw(value) => (value, true),
            NodeKind::Yield(value) => (value, false),
            _ => return Ok(None),
        };

        if let Some(value) = value {
            self.optimize_slot(value, true, frame, assumptions)?;
        }

        if diverges {
            assumptions.mark_unreachable();
        } else {
            // Other code runs while the generator is suspended
            assumptions.forget_all();
        }

        Ok(None)
    }

    pub(crate) fn optimize_conditional(
        &mut self,
        node: &mut AstNode,
        frame: &VisitFrame<'_>,
        assumptions: &mut AssumptionSet<'_>,
    ) -> Result<Option<NodeRef>, CompilerError> {
        let location = node.location;
        let scope = node.scope;

        let NodeKind::Conditional {
            condition,
            then_branch,
            else_branch,
        } = &mut node.kind
        else {
            return Ok(None);
        };

        self.optimize_slot(condition, true, frame, assumptions)?;

        // Only one branch can ever run
        if let Some(truth) = self.truth_value(condition, assumptions) {
            let chosen = if truth {
                Some(then_branch.share())
            } else {
                else_branch.as_ref().map(NodeRef::share)
            };

            let mut chosen = match chosen {
                Some(branch) => branch,
                None => NodeRef::new(AstNode::no_value(location, scope)),
            };

            let keep_condition = !self.is_discardable(condition, assumptions);

            // Drop the node's own handle so the chosen branch can be rewritten in place
            let condition = condition.share();
            drop(take_kind(node));

            refine(self.scopes, assumptions, &condition, truth);
            self.optimize_slot(&mut chosen, frame.result_used, frame, assumptions)?;
            self.record(RewriteRule::Conditional, location);

            if keep_condition {
                return self.pair_block(condition, chosen, location, scope).map(Some);
            }
            return Ok(Some(chosen));
        }

        let then_outcome = {
            let mut branch = assumptions.fork();
            refine(self.scopes, &mut branch, condition, true);
            self.optimize_slot(then_branch, frame.result_used, frame, &mut branch)?;
            branch.into_outcome()
        };

        let else_outcome = {
            let mut branch = assumptions.fork();
            refine(self.scopes, &mut branch, condition, false);
            if let Some(else_branch) = else_branch.as_mut() {
                self.optimize_slot(else_branch, frame.result_used, frame, &mut branch)?;
            }
            branch.into_outcome()
        };

        assumptions.join(vec![then_outcome, else_outcome]);

        // `if c {}` with nothing to produce is just `c`
        let else_is_empty = else_branch.as_ref().is_none_or(|branch| branch.is_no_value());
        if !frame.result_used && then_branch.is_no_value() && else_is_empty {
            self.record(RewriteRule::Conditional, location);
            return Ok(Some(condition.share()));
        }

        Ok(None)
    }

    pub(crate) fn optimize_loop(
        &mut self,
        node: &mut AstNode,
        frame: &VisitFrame<'_>,
        assumptions: &mut AssumptionSet<'_>,
    ) -> Result<Option<NodeRef>, CompilerError> {
        let location = node.location;
        let scope = node.scope;

        let NodeKind::Loop { condition, body } = &mut node.kind else {
            return Ok(None);
        };

        // Anything the loop changes is unknown on every iteration and after it
        let assigned = match condition {
            Some(condition) => AssignedSymbols::collect(condition, self.scopes),
            None => AssignedSymbols::default(),
        }
        .merge(AssignedSymbols::collect(body, self.scopes));
        assigned.forget_in(assumptions);

        if let Some(condition) = condition.as_mut() {
            self.optimize_slot(condition, true, frame, assumptions)?;

            if self.truth_value(condition, assumptions) == Some(false) {
                self.record(RewriteRule::Loop, location);

                // The condition still runs once
                if !self.is_discardable(condition, assumptions) {
                    return Ok(Some(condition.share()));
                }
                return Ok(Some(NodeRef::new(AstNode::no_value(location, scope))));
            }
        }

        {
            let mut iteration = assumptions.fork();
            if let Some(condition) = condition.as_ref() {
                refine(self.scopes, &mut iteration, condition, true);
            }
            self.optimize_slot(body, false, frame, &mut iteration)?;
        }

        assigned.forget_in(assumptions);
        Ok(None)
    }

    pub(crate) fn optimize_try(
        &mut self,
        node: &mut AstNode,
        frame: &VisitFrame<'_>,
        assumptions: &mut AssumptionSet<'_>,
    ) -> Result<Option<NodeRef>, CompilerError> {
        let location = node.location;
        let scope = node.scope;

        let NodeKind::Try {
            body,
            handler,
            finally,
        } = &mut node.kind
        else {
            return Ok(None);
        };

        let body_assigned = AssignedSymbols::collect(body, self.scopes);

        let (body_outcome, body_cannot_throw) = {
            let mut branch = assumptions.fork();
            self.optimize_slot(body, frame.result_used, frame, &mut branch)?;
            let cannot_throw = self.is_discardable(body, &branch);
            (branch.into_outcome(), cannot_throw)
        };

        // The handler can start from any point of the body
        let mut outcomes = vec![body_outcome];
        if let Some(handler) = handler.as_mut() {
            let mut branch = assumptions.fork();
            body_assigned.forget_in(&mut branch);
            if let Some(binding) = handler.binding {
                branch.forget(SymbolKey::resolve(self.scopes, handler.body.scope, binding));
            }
            self.optimize_slot(&mut handler.body, frame.result_used, frame, &mut branch)?;
            outcomes.push(branch.into_outcome());
        }

        match finally.as_mut() {
            Some(finally_body) => {
                // The finally block also runs while an exception propagates
                let reachable_after = outcomes.iter().any(BranchOutcome::is_reachable);
                let handler_assigned = handler
                    .as_ref()
                    .map(|handler| AssignedSymbols::collect(&handler.body, self.scopes))
                    .unwrap_or_default();
                body_assigned.merge(handler_assigned).forget_in(assumptions);

                self.optimize_slot(finally_body, false, frame, assumptions)?;
                if !reachable_after {
                    assumptions.mark_unreachable();
                }
            }
            None => assumptions.join(outcomes),
        }

        // A body that can't throw never reaches the handler
        if body_cannot_throw {
            match finally.as_ref() {
                None => {
                    self.record(RewriteRule::Try, location);
                    return Ok(Some(body.share()));
                }

                // The try yields the body's value, which finally can't change once it is a constant
                Some(finally_body) if !frame.result_used || body.literal().is_some() => {
                    self.record(RewriteRule::Try, location);
                    let (first, second) = if frame.result_used {
                        (finally_body.share(), body.share())
                    } else {
                        (body.share(), finally_body.share())
                    };
                    return self.pair_block(first, second, location, scope).map(Some);
                }

                Some(_) => {
                    if handler.take().is_some() {
                        self.record(RewriteRule::Try, location);
                    }
                }
            }
        }

        if handler.is_none() && finally.is_none() {
            self.record(RewriteRule::Try, location);
            return Ok(Some(body.share()));
        }

        Ok(None)
    }

    pub(crate) fn optimize_switch(
        &mut self,
        node: &mut AstNode,
        frame: &VisitFrame<'_>,
        assumptions: &mut AssumptionSet<'_>,
    ) -> Result<Option<NodeRef>, CompilerError> {
        let location = node.location;
        let scope = node.scope;

        let NodeKind::Switch { subject, cases } = &mut node.kind else {
            return Ok(None);
        };

        self.optimize_slot(subject, true, frame, assumptions)?;

        if cases.is_empty() {
            self.record(RewriteRule::Switch, location);
            if !self.is_discardable(subject, assumptions) {
                return Ok(Some(subject.share()));
            }
            return Ok(Some(NodeRef::new(AstNode::no_value(location, scope))));
        }

        // Patterns are tried one after another until one matches
        let mut pattern_assigned = AssignedSymbols::default();
        for case in cases.iter() {
            for pattern in &case.patterns {
                pattern_assigned =
                    pattern_assigned.merge(AssignedSymbols::collect(pattern, self.scopes));
            }
        }
        pattern_assigned.forget_in(assumptions);

        let has_default = cases.iter().any(|case| case.is_default());
        let mut outcomes = Vec::with_capacity(cases.len() + 1);

        for case in cases.iter_mut() {
            let mut branch = assumptions.fork();
            for pattern in case.patterns.iter_mut() {
                self.optimize_slot(pattern, true, frame, &mut branch)?;
            }
            self.optimize_slot(&mut case.body, frame.result_used, frame, &mut branch)?;
            outcomes.push(branch.into_outcome());
        }

        // No case matched and there is no default
        if !has_default {
            outcomes.push(assumptions.unchanged());
        }

        assumptions.join(outcomes);
        Ok(None)
    }

    /// break, continue, jump and pass
    pub(crate) fn optimize_action(
        &mut self,
        node: &mut AstNode,
        frame: &VisitFrame<'_>,
        assumptions: &mut AssumptionSet<'_>,
    ) -> Result<Option<NodeRef>, CompilerError> {
        let NodeKind::Action { action, operand } = &mut node.kind else {
            return Ok(None);
        };

        if let Some(operand) = operand {
            self.optimize_slot(operand, true, frame, assumptions)?;
        }

        if action.diverges() {
            assumptions.mark_unreachable();
        }

        Ok(None)
    }

    /// A label no jump refers to is dead.
    /// A label something jumps to is a join point for paths this walk can't see.
    pub(crate) fn optimize_label(
        &mut self,
        node: &mut AstNode,
        frame: &VisitFrame<'_>,
        assumptions: &mut AssumptionSet<'_>,
    ) -> Result<Option<NodeRef>, CompilerError> {
        let location = node.location;
        let scope = node.scope;

        let NodeKind::Label { used, base, .. } = &mut node.kind else {
            return Ok(None);
        };

        if !*used {
            self.record(RewriteRule::Label, location);

            return match base.as_ref() {
                Some(base) if !self.is_discardable(base, assumptions) => Ok(Some(base.share())),
                _ => Ok(Some(NodeRef::new(AstNode::no_value(location, scope)))),
            };
        }

        assumptions.forget_all();
        assumptions.mark_reachable();

        if let Some(base) = base {
            self.optimize_slot(base, frame.result_used, frame, assumptions)?;
        }

        Ok(None)
    }
}
