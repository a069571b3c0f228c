pub mod annotations;
pub mod ast;
pub mod optimizers;
pub mod string_interning;

pub mod compiler_messages {
    pub mod compiler_dev_logging;
    pub mod compiler_errors;
    pub mod compiler_warnings;
    pub mod diagnostics;
    pub mod display_messages;
}
pub use compiler_messages::compiler_errors;
pub use compiler_messages::compiler_warnings;
pub use compiler_messages::diagnostics;
pub use compiler_messages::display_messages;

#[cfg(test)]
pub(crate) mod test_support;

use crate::compiler_frontend::annotations::annotation_stack::{AnnotationEntry, AnnotationPool};
use crate::compiler_frontend::annotations::declaration_tags::{
    DeclarationTags, FinishedDeclaration,
};
use crate::compiler_frontend::ast::ast_nodes::TextLocation;
use crate::compiler_frontend::ast::compilation_unit::CompilationUnit;
use crate::compiler_frontend::ast::node_ref::NodeRef;
use crate::compiler_frontend::compiler_errors::{CompilerError, CompilerMessages};
use crate::compiler_frontend::compiler_warnings::CompilerWarning;
use crate::compiler_frontend::diagnostics::Diagnostics;
use crate::compiler_frontend::optimizers::optimizer::{
    CancellationToken, OptimizeReport, Optimizer,
};
use crate::projects::settings::Config;

/// Everything one compilation unit needs while it is parsed and optimized.
///
/// Nothing in here is shared with other compilations,
/// so independent units can be optimized on different threads.
pub struct Compilation {
    pub unit: CompilationUnit,
    pub config: Config,
    diagnostics: Diagnostics,
    annotation_pool: AnnotationPool,
    declaration: Option<DeclarationTags>,
    cancel: CancellationToken,
    last_report: OptimizeReport,
}

impl Compilation {
    pub fn new(unit: CompilationUnit, config: Config) -> Self {
        let diagnostics = Diagnostics::new(config.warnings.to_owned());

        Self {
            unit,
            config,
            diagnostics,
            annotation_pool: AnnotationPool::new(),
            declaration: None,
            cancel: CancellationToken::new(),
            last_report: OptimizeReport::default(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// -----------------------------
    /// DECLARATION STATE
    /// -----------------------------
    /// The parser feeds annotations, doc comments and compiler tags in here
    /// before it reaches the declaration they belong to.
    fn declaration_tags(&mut self) -> &mut DeclarationTags {
        self.declaration
            .get_or_insert_with(|| DeclarationTags::begin(&mut self.annotation_pool))
    }

    pub fn push_annotation(&mut self, entry: AnnotationEntry) -> Result<(), CompilerError> {
        self.declaration_tags().push_annotation(entry)
    }

    pub fn pending_annotations(&self) -> usize {
        self.declaration
            .as_ref()
            .map_or(0, DeclarationTags::pending_annotations)
    }

    pub fn append_documentation(&mut self, text: &str) {
        self.declaration_tags().append_documentation(text);
    }

    pub fn record_compiler_tag(
        &mut self,
        name: &str,
        location: TextLocation,
    ) -> Result<(), CompilerError> {
        let tags = self
            .declaration
            .get_or_insert_with(|| DeclarationTags::begin(&mut self.annotation_pool));
        tags.record_compiler_tag(name, location, &mut self.diagnostics)
    }

    pub fn report_tag_instead_of_keyword(
        &mut self,
        name: &str,
        location: TextLocation,
    ) -> Result<(), CompilerError> {
        let tags = self
            .declaration
            .get_or_insert_with(|| DeclarationTags::begin(&mut self.annotation_pool));
        tags.report_tag_instead_of_keyword(name, location, &mut self.diagnostics)
    }

    /// Desugars the pending annotations around the expression just parsed
    pub fn apply_annotations(&mut self, input: NodeRef) -> Result<NodeRef, CompilerError> {
        match self.declaration.as_mut() {
            Some(tags) => tags.apply(input, &mut self.annotation_pool),
            None => Ok(input),
        }
    }

    /// Ends the current declaration, reporting any annotation that was never applied
    pub fn finish_declaration(&mut self) -> Result<FinishedDeclaration, CompilerError> {
        match self.declaration.take() {
            Some(tags) => tags.finish(
                &mut self.annotation_pool,
                &mut self.diagnostics,
                &self.unit.strings,
            ),
            None => Ok(FinishedDeclaration::default()),
        }
    }

    /// -----------------------------
    /// OPTIMIZATION
    /// -----------------------------
    /// Optimizes the whole unit to a fixpoint.
    /// `result_used` says whether the value of the root is consumed.
    pub fn optimize_all(&mut self, result_used: bool) -> Result<OptimizeReport, CompilerError> {
        // Parse state left over from the last declaration is cleared first
        self.finish_declaration()?;

        let mut optimizer = Optimizer::new(
            &self.config.optimizer,
            &mut self.unit.scopes,
            &mut self.diagnostics,
            &self.unit.strings,
            &self.cancel,
        );

        let result = optimizer.optimize(&mut self.unit.root, result_used);
        self.last_report = optimizer.into_report();
        result
    }

    /// Statistics of the most recent optimize call, including one that was interrupted
    pub fn last_report(&self) -> &OptimizeReport {
        &self.last_report
    }

    pub fn warnings(&self) -> &[CompilerWarning] {
        self.diagnostics.warnings()
    }

    /// Splits the compilation into the unit and everything that was reported about it
    pub fn into_parts(mut self, error: Option<CompilerError>) -> (CompilationUnit, CompilerMessages) {
        let messages = CompilerMessages {
            errors: error.into_iter().collect(),
            warnings: self.diagnostics.take_warnings(),
        };

        (self.unit, messages)
    }
}
