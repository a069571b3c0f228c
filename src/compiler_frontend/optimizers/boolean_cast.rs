use crate::compiler_frontend::ast::ast_nodes::{AstNode, NodeKind};
use crate::compiler_frontend::ast::node_ref::NodeRef;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::optimizers::assumptions::AssumptionSet;
use crate::compiler_frontend::optimizers::node_facts::is_boolean_typed;
use crate::compiler_frontend::optimizers::optimizer::{Optimizer, RewriteRule, VisitFrame};

impl Optimizer<'_> {
    /// `bool(inner)`, optionally negated.
    ///
    /// - Unused: the negation is irrelevant and is dropped.
    /// - Known truth: becomes the constant, keeping `inner` in front of it unless it can be dropped.
    /// - `inner` is already a boolean: the cast is grafted away.
    pub(crate) fn optimize_bool_cast(
        &mut self,
        node: &mut AstNode,
        frame: &VisitFrame<'_>,
        assumptions: &mut AssumptionSet<'_>,
    ) -> Result<Option<NodeRef>, CompilerError> {
        let location = node.location;
        let scope = node.scope;

        let NodeKind::Bool { inner, negate } = &mut node.kind else {
            return Ok(None);
        };

        self.optimize_slot(inner, frame.result_used, frame, assumptions)?;

        if !frame.result_used && *negate {
            *negate = false;
            self.record(RewriteRule::BoolCast, location);
        }

        if let Some(truth) = self.truth_value(inner, assumptions) {
            let constant = NodeRef::new(AstNode::boolean(truth != *negate, location, scope));
            self.record(RewriteRule::BoolCast, location);

            if !self.is_discardable(inner, assumptions) {
                return self
                    .pair_block(inner.share(), constant, location, scope)
                    .map(Some);
            }

            return Ok(Some(constant));
        }

        if !*negate && is_boolean_typed(inner) {
            self.record(RewriteRule::BoolCast, location);
            return Ok(Some(inner.share()));
        }

        Ok(None)
    }
}
