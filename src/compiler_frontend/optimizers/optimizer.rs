//! # Fixpoint optimizer
//!
//! Walks a tree top-down, applying one rewrite rule per node kind, and repeats whole passes
//! until a pass fires no rewrite events (or after one pass in single-pass mode).
//!
//! Nodes are only ever mutated through a uniquely held handle.
//! A shared node is copied before the walk touches it, and the copy only replaces the
//! original slot if a rewrite fired somewhere beneath it.

use crate::compiler_frontend::ast::ast_nodes::{AstNode, Literal, NodeKind, NodeTag, TextLocation};
use crate::compiler_frontend::ast::node_ref::NodeRef;
use crate::compiler_frontend::ast::scopes::ScopeArena;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::diagnostics::Diagnostics;
use crate::compiler_frontend::optimizers::assumptions::AssumptionSet;
use crate::compiler_frontend::optimizers::node_facts::{TruthQuery, facts_of, has_side_effects};
use crate::compiler_frontend::string_interning::StringTable;
use crate::projects::settings::OptimizerConfig;
use crate::{optimizer_log, return_compiler_error, timer_log};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Lets the host stop an optimize call from another thread.
/// Checked once at the start of every pass.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Which rule fired a rewrite event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RewriteRule {
    ScopeCollapse,
    BoolCast,
    Sequence,
    ConstantFold,
    ShortCircuit,
    Conditional,
    Loop,
    Try,
    Switch,
    Label,
}

impl RewriteRule {
    pub fn to_str(self) -> &'static str {
        match self {
            RewriteRule::ScopeCollapse => "scope collapse",
            RewriteRule::BoolCast => "bool cast",
            RewriteRule::Sequence => "sequence",
            RewriteRule::ConstantFold => "constant fold",
            RewriteRule::ShortCircuit => "short circuit",
            RewriteRule::Conditional => "conditional",
            RewriteRule::Loop => "loop",
            RewriteRule::Try => "try",
            RewriteRule::Switch => "switch",
            RewriteRule::Label => "label",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimizeReport {
    pub passes: u32,
    pub rewrite_events: u64,
    pub events_by_rule: FxHashMap<RewriteRule, u64>,

    // Set when the host cancelled the call part way through
    pub interrupted: bool,
}

impl OptimizeReport {
    /// Per-rule counts in a stable order for display
    pub fn sorted_events(&self) -> Vec<(RewriteRule, u64)> {
        let mut events: Vec<(RewriteRule, u64)> = self
            .events_by_rule
            .iter()
            .map(|(rule, count)| (*rule, *count))
            .collect();
        events.sort();
        events
    }
}

/// One level of the current top-down walk
#[derive(Debug, Clone, Copy)]
pub struct VisitFrame<'p> {
    pub parent: Option<&'p VisitFrame<'p>>,
    pub tag: Option<NodeTag>,
    pub result_used: bool,
}

impl<'p> VisitFrame<'p> {
    pub fn root(result_used: bool) -> Self {
        Self {
            parent: None,
            tag: None,
            result_used,
        }
    }

    pub fn parent_tag(&self) -> Option<NodeTag> {
        self.parent.and_then(|parent| parent.tag)
    }
}

pub struct Optimizer<'a> {
    pub(crate) config: &'a OptimizerConfig,
    pub(crate) scopes: &'a mut ScopeArena,
    pub(crate) diagnostics: &'a mut Diagnostics,
    pub(crate) string_table: &'a StringTable,
    cancel: &'a CancellationToken,

    pass_events: u64,
    report: OptimizeReport,
}

impl<'a> Optimizer<'a> {
    pub fn new(
        config: &'a OptimizerConfig,
        scopes: &'a mut ScopeArena,
        diagnostics: &'a mut Diagnostics,
        string_table: &'a StringTable,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            config,
            scopes,
            diagnostics,
            string_table,
            cancel,
            pass_events: 0,
            report: OptimizeReport::default(),
        }
    }

    pub fn report(&self) -> &OptimizeReport {
        &self.report
    }

    pub fn into_report(self) -> OptimizeReport {
        self.report
    }

    /// Optimizes the tree in `root` until it stops changing.
    /// On failure the tree is left structurally valid, with the rewrites made so far.
    pub fn optimize(
        &mut self,
        root: &mut NodeRef,
        result_used: bool,
    ) -> Result<OptimizeReport, CompilerError> {
        let time = Instant::now();

        loop {
            if self.cancel.is_cancelled() {
                self.report.interrupted = true;
                return Err(CompilerError::interrupted());
            }

            self.pass_events = 0;

            // Assumptions never outlive the pass that derived them
            let mut assumptions = AssumptionSet::new(self.config.assume);
            let frame = VisitFrame::root(result_used);
            self.optimize_slot(root, result_used, &frame, &mut assumptions)?;

            self.report.passes += 1;
            self.report.rewrite_events += self.pass_events;
            optimizer_log!("Pass ", {self.report.passes}, " fired ", {self.pass_events}, " rewrites");

            if self.pass_events == 0 || self.config.one_pass {
                break;
            }

            if self.report.passes >= self.config.max_passes {
                return_compiler_error!(
                    format!(
                        "The optimizer did not settle after {} passes",
                        self.report.passes
                    ),
                    {
                        CompilationStage => "Optimization",
                    }
                );
            }
        }

        timer_log!(time, "Optimized in: ");
        Ok(self.report.clone())
    }

    /// Optimizes the node held in `slot`, replacing it if its rule rewrote it into something else
    pub(crate) fn optimize_slot(
        &mut self,
        slot: &mut NodeRef,
        result_used: bool,
        parent: &VisitFrame<'_>,
        assumptions: &mut AssumptionSet<'_>,
    ) -> Result<(), CompilerError> {
        if let Some(node) = slot.get_mut() {
            if let Some(replacement) = self.optimize_node(node, result_used, parent, assumptions)? {
                *slot = replacement;
            }
            return Ok(());
        }

        // Shared: work on a copy that only replaces this slot if it ends up different
        let mut copy = slot.detach();
        let events_before = self.pass_events;

        match self.optimize_node(&mut copy, result_used, parent, assumptions)? {
            Some(replacement) => *slot = replacement,
            None => {
                if self.pass_events != events_before || copy.facts != slot.facts {
                    *slot = NodeRef::new(copy);
                }
            }
        }

        Ok(())
    }

    fn optimize_node(
        &mut self,
        node: &mut AstNode,
        result_used: bool,
        parent: &VisitFrame<'_>,
        assumptions: &mut AssumptionSet<'_>,
    ) -> Result<Option<NodeRef>, CompilerError> {
        // Scope collapsing applies to every kind of node
        if let Some(parent_scope) = self.scopes.collapse_target(node.scope) {
            node.scope = parent_scope;
            self.record(RewriteRule::ScopeCollapse, node.location);
        }

        let tag = node.kind.tag();
        let frame = VisitFrame {
            parent: Some(parent),
            tag: Some(tag),
            result_used,
        };

        let mut replacement = match tag {
            NodeTag::Symbol => self.optimize_symbol(node, &frame, assumptions)?,
            NodeTag::Unbind => self.optimize_unbind(node, assumptions),
            NodeTag::Multiple => self.optimize_multiple(node, &frame, assumptions)?,
            NodeTag::Return | NodeTag::Yield | NodeTag::Throw => {
                self.optimize_exit(node, &frame, assumptions)?
            }
            NodeTag::Try => self.optimize_try(node, &frame, assumptions)?,
            NodeTag::Loop => self.optimize_loop(node, &frame, assumptions)?,
            NodeTag::Conditional => self.optimize_conditional(node, &frame, assumptions)?,
            NodeTag::Bool => self.optimize_bool_cast(node, &frame, assumptions)?,
            NodeTag::Expand => self.optimize_expand(node, &frame, assumptions)?,
            NodeTag::Function => self.optimize_function(node, &frame)?,
            NodeTag::Label => self.optimize_label(node, &frame, assumptions)?,
            NodeTag::Operator => self.optimize_operator(node, &frame, assumptions)?,
            NodeTag::Action => self.optimize_action(node, &frame, assumptions)?,
            NodeTag::Switch => self.optimize_switch(node, &frame, assumptions)?,
            NodeTag::Assembly => self.optimize_assembly(node, &frame, assumptions)?,
            NodeTag::ConstExpr => None,
        };

        let query = self.query(assumptions);
        match replacement.as_mut() {
            Some(replacement) => {
                let facts = facts_of(replacement, &query);
                if replacement.facts != facts {
                    replacement.make_mut().facts = facts;
                }
            }
            None => node.facts = facts_of(node, &query),
        }

        Ok(replacement)
    }

    #[cfg_attr(not(feature = "show_optimizer"), allow(unused_variables))]
    pub(crate) fn record(&mut self, rule: RewriteRule, location: TextLocation) {
        optimizer_log!(Dark Cyan "Rewrite: ", {rule.to_str()}, " at line ", {location.line});

        self.pass_events += 1;
        *self.report.events_by_rule.entry(rule).or_insert(0) += 1;
    }

    pub(crate) fn query<'q, 'p>(
        &'q self,
        assumptions: &'q AssumptionSet<'p>,
    ) -> TruthQuery<'q, 'p> {
        TruthQuery {
            scopes: &*self.scopes,
            assumptions,
            unwind_limit: self.config.unwind_limit,
        }
    }

    pub(crate) fn truth_value(
        &self,
        node: &AstNode,
        assumptions: &AssumptionSet<'_>,
    ) -> Option<bool> {
        self.query(assumptions).truth_value(node)
    }

    /// Dropping the node loses nothing: it has no effects and can't raise on this path
    pub(crate) fn is_discardable(&self, node: &AstNode, assumptions: &AssumptionSet<'_>) -> bool {
        !has_side_effects(node) && !self.query(assumptions).may_throw(node)
    }
}

/// Takes the kind out of a node that is about to be replaced
pub(crate) fn take_kind(node: &mut AstNode) -> NodeKind {
    std::mem::replace(&mut node.kind, NodeKind::ConstExpr(Literal::NoValue))
}
