use crate::compiler_frontend::ast::ast_nodes::{AstNode, NodeKind, NodeTag};
use crate::compiler_frontend::ast::node_ref::NodeRef;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::compiler_warnings::WarningKind;
use crate::compiler_frontend::optimizers::assumptions::{Assumption, AssumptionSet, SymbolKey};
use crate::compiler_frontend::optimizers::optimizer::{Optimizer, VisitFrame};

impl Optimizer<'_> {
    /// Symbol reads are never rewritten, but reading a symbol that is known to be unbound is reported
    pub(crate) fn optimize_symbol(
        &mut self,
        node: &mut AstNode,
        frame: &VisitFrame<'_>,
        assumptions: &mut AssumptionSet<'_>,
    ) -> Result<Option<NodeRef>, CompilerError> {
        let NodeKind::Symbol(name) = node.kind else {
            return Ok(None);
        };

        // Assembly operands may be outputs, which write the symbol instead of reading it
        if frame.parent_tag() == Some(NodeTag::Assembly) {
            return Ok(None);
        }

        let key = SymbolKey::resolve(self.scopes, node.scope, name);
        if assumptions.get(key) == Assumption::KnownUnbound {
            self.diagnostics.warn(
                WarningKind::UnboundSymbolRead,
                format!(
                    "'{}' is always unbound here, reading it will fail",
                    self.string_table.resolve(name)
                ),
                node.location,
            )?;
        }

        Ok(None)
    }

    pub(crate) fn optimize_unbind(
        &mut self,
        node: &mut AstNode,
        assumptions: &mut AssumptionSet<'_>,
    ) -> Option<NodeRef> {
        if let NodeKind::Unbind(name) = node.kind {
            let key = SymbolKey::resolve(self.scopes, node.scope, name);
            assumptions.set(key, Assumption::KnownUnbound);
        }

        None
    }

    pub(crate) fn optimize_expand(
        &mut self,
        node: &mut AstNode,
        frame: &VisitFrame<'_>,
        assumptions: &mut AssumptionSet<'_>,
    ) -> Result<Option<NodeRef>, CompilerError> {
        if let NodeKind::Expand(inner) = &mut node.kind {
            self.optimize_slot(inner, true, frame, assumptions)?;
        }

        Ok(None)
    }

    /// A nested function body starts from nothing known.
    /// Its trailing value is never its result, only `return` is.
    pub(crate) fn optimize_function(
        &mut self,
        node: &mut AstNode,
        frame: &VisitFrame<'_>,
    ) -> Result<Option<NodeRef>, CompilerError> {
        if let NodeKind::Function(function) = &mut node.kind {
            let mut body_assumptions = AssumptionSet::new(self.config.assume);
            self.optimize_slot(&mut function.body, false, frame, &mut body_assumptions)?;
        }

        Ok(None)
    }

    pub(crate) fn optimize_assembly(
        &mut self,
        node: &mut AstNode,
        frame: &VisitFrame<'_>,
        assumptions: &mut AssumptionSet<'_>,
    ) -> Result<Option<NodeRef>, CompilerError> {
        let NodeKind::Assembly { operands, .. } = &mut node.kind else {
            return Ok(None);
        };

        for operand in operands.iter_mut() {
            self.optimize_slot(&mut operand.expr, true, frame, assumptions)?;
        }

        // The assembly itself can write anything, outputs included
        assumptions.forget_all();

        Ok(None)
    }
}
