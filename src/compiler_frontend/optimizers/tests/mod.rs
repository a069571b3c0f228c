#![cfg(test)]

mod sequence_tests;

use crate::compiler_frontend::ast::node_ref::NodeRef;
use crate::compiler_frontend::ast::scopes::ScopeArena;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::compiler_warnings::WarningKind;
use crate::compiler_frontend::diagnostics::Diagnostics;
use crate::compiler_frontend::optimizers::optimizer::{
    CancellationToken, OptimizeReport, Optimizer,
};
use crate::compiler_frontend::string_interning::StringTable;
use crate::projects::settings::{OptimizerConfig, WarningPolicy};

/// Everything the optimizer borrows, owned by the test
pub(super) struct Fixture {
    pub strings: StringTable,
    pub scopes: ScopeArena,
    pub diagnostics: Diagnostics,
    pub config: OptimizerConfig,
    pub cancel: CancellationToken,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_policy(WarningPolicy::default())
    }

    pub fn with_policy(policy: WarningPolicy) -> Self {
        Self {
            strings: StringTable::new(),
            scopes: ScopeArena::new(),
            diagnostics: Diagnostics::new(policy),
            config: OptimizerConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn run(
        &mut self,
        root: NodeRef,
        result_used: bool,
    ) -> Result<(NodeRef, OptimizeReport), CompilerError> {
        let mut root = root;
        let mut optimizer = Optimizer::new(
            &self.config,
            &mut self.scopes,
            &mut self.diagnostics,
            &self.strings,
            &self.cancel,
        );

        let report = optimizer.optimize(&mut root, result_used)?;
        Ok((root, report))
    }

    pub fn optimize(&mut self, root: NodeRef, result_used: bool) -> NodeRef {
        match self.run(root, result_used) {
            Ok((root, _)) => root,
            Err(e) => panic!("optimize failed: {}", e.msg),
        }
    }

    pub fn warning_kinds(&self) -> Vec<WarningKind> {
        self.diagnostics
            .warnings()
            .iter()
            .map(|warning| warning.warning_kind)
            .collect()
    }
}
