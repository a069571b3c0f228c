use crate::compiler_frontend::ast::ast_nodes::{AstNode, MultipleMode, NodeKind, TextLocation};
use crate::compiler_frontend::ast::node_ref::NodeRef;
use crate::compiler_frontend::ast::scopes::ScopeId;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::compiler_warnings::WarningKind;
use crate::compiler_frontend::optimizers::assumptions::AssumptionSet;
use crate::compiler_frontend::optimizers::optimizer::{Optimizer, RewriteRule, VisitFrame, take_kind};

impl Optimizer<'_> {
    /// Tuple builds and keep-last-value blocks
    pub(crate) fn optimize_multiple(
        &mut self,
        node: &mut AstNode,
        frame: &VisitFrame<'_>,
        assumptions: &mut AssumptionSet<'_>,
    ) -> Result<Option<NodeRef>, CompilerError> {
        let location = node.location;
        let scope = node.scope;

        let NodeKind::Multiple { items, mode } = &mut node.kind else {
            return Ok(None);
        };

        // Nobody reads the tuple, so only the elements' side effects matter
        if *mode == MultipleMode::Tuple && !frame.result_used {
            *mode = MultipleMode::Block;
            self.record(RewriteRule::Sequence, location);
        }
        let mode = *mode;

        let mut index = 0;
        while index < items.len() {
            let used = match mode {
                MultipleMode::Tuple => true,
                MultipleMode::Block => frame.result_used && index + 1 == items.len(),
            };

            self.optimize_slot(&mut items[index], used, frame, assumptions)?;

            if mode == MultipleMode::Block && !assumptions.reachable() {
                self.drop_unreachable(items, index + 1, location)?;
            }

            // Only the last value is kept, a statement that can't do anything before it is dead
            if mode == MultipleMode::Block
                && index + 1 < items.len()
                && self.is_discardable(&items[index], assumptions)
            {
                items.remove(index);
                self.record(RewriteRule::Sequence, location);
                continue;
            }

            index += 1;
        }

        if mode == MultipleMode::Tuple {
            return Ok(None);
        }

        self.splice_nested_blocks(items, scope, location)?;

        match items.len() {
            0 => {
                self.record(RewriteRule::Sequence, location);
                Ok(Some(NodeRef::new(AstNode::no_value(location, scope))))
            }
            1 => {
                self.record(RewriteRule::Sequence, location);
                let NodeKind::Multiple { mut items, .. } = take_kind(node) else {
                    return Ok(None);
                };
                Ok(items.pop())
            }
            _ => Ok(None),
        }
    }

    /// Everything after a return, throw or jump up to the next label can never run
    fn drop_unreachable(
        &mut self,
        items: &mut Vec<NodeRef>,
        start: usize,
        location: TextLocation,
    ) -> Result<(), CompilerError> {
        if start >= items.len() {
            return Ok(());
        }

        let end = items[start..]
            .iter()
            .position(|item| matches!(item.kind, NodeKind::Label { .. }))
            .map_or(items.len(), |offset| start + offset);

        if end == start {
            return Ok(());
        }

        self.diagnostics.warn(
            WarningKind::UnreachableCode,
            format!(
                "{} statement(s) after this point can never run",
                end - start
            ),
            items[start].location,
        )?;

        items.drain(start..end);
        self.record(RewriteRule::Sequence, location);
        Ok(())
    }

    // Inner blocks in the same scope are flattened into this one
    fn splice_nested_blocks(
        &mut self,
        items: &mut Vec<NodeRef>,
        scope: ScopeId,
        location: TextLocation,
    ) -> Result<(), CompilerError> {
        let is_spliceable = |item: &NodeRef| {
            item.scope == scope
                && matches!(
                    item.kind,
                    NodeKind::Multiple {
                        mode: MultipleMode::Block,
                        ..
                    }
                )
        };

        if !items.iter().any(|item| is_spliceable(item)) {
            return Ok(());
        }

        let total: usize = items
            .iter()
            .map(|item| match &item.kind {
                NodeKind::Multiple { items: inner, .. } if is_spliceable(item) => inner.len(),
                _ => 1,
            })
            .sum();

        let mut spliced = Vec::new();
        if let Err(e) = spliced.try_reserve_exact(total) {
            return Err(CompilerError::allocation(e, location));
        }

        for item in items.drain(..) {
            if !is_spliceable(&item) {
                spliced.push(item);
                continue;
            }

            if let NodeKind::Multiple { items: inner, .. } = item.into_node().kind {
                spliced.extend(inner);
            }
            self.record(RewriteRule::Sequence, location);
        }

        *items = spliced;
        Ok(())
    }

    /// `{ first; second }`, the value of `second`
    pub(crate) fn pair_block(
        &self,
        first: NodeRef,
        second: NodeRef,
        location: TextLocation,
        scope: ScopeId,
    ) -> Result<NodeRef, CompilerError> {
        let mut items = Vec::new();
        if let Err(e) = items.try_reserve_exact(2) {
            return Err(CompilerError::allocation(e, location));
        }

        items.push(first);
        items.push(second);
        Ok(NodeRef::new(AstNode::block(items, location, scope)))
    }
}
