use crate::compiler_frontend::ast::ast_nodes::TextLocation;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::compiler_warnings::{CompilerWarning, WarningKind};
use crate::projects::settings::WarningPolicy;
use rustc_hash::FxHashSet;

/// Collects the warnings of one compilation unit and decides which of them are fatal.
///
/// The optimizer revisits the same nodes on every fixpoint pass,
/// so identical warnings (same kind at the same location) are only recorded once.
#[derive(Debug, Default)]
pub struct Diagnostics {
    policy: WarningPolicy,
    warnings: Vec<CompilerWarning>,
    reported: FxHashSet<(WarningKind, TextLocation)>,
}

impl Diagnostics {
    pub fn new(policy: WarningPolicy) -> Self {
        Self {
            policy,
            warnings: Vec::new(),
            reported: FxHashSet::default(),
        }
    }

    /// Reports a warning.
    /// Returns an error when the policy promotes this kind of warning to an error,
    /// in which case the caller must abort whatever it is doing.
    pub fn report(&mut self, warning: CompilerWarning) -> Result<(), CompilerError> {
        let kind = warning.warning_kind;

        if self.policy.is_fatal(kind) {
            return Err(CompilerError::from_fatal_warning(&warning));
        }

        if self.policy.is_disabled(kind) {
            return Ok(());
        }

        if self.reported.insert((kind, warning.location)) {
            self.warnings.push(warning);
        }

        Ok(())
    }

    pub fn warn(
        &mut self,
        kind: WarningKind,
        msg: impl Into<String>,
        location: TextLocation,
    ) -> Result<(), CompilerError> {
        self.report(CompilerWarning::new(msg, location, kind))
    }

    pub fn warnings(&self) -> &[CompilerWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<CompilerWarning> {
        self.reported.clear();
        std::mem::take(&mut self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler_frontend::compiler_errors::ErrorType;

    #[test]
    fn repeated_warnings_are_recorded_once() {
        let mut diagnostics = Diagnostics::default();
        let location = TextLocation::new_just_line(4);

        for _ in 0..3 {
            diagnostics
                .warn(WarningKind::UnreachableCode, "return", location)
                .expect("warnings are not fatal by default");
        }

        assert_eq!(diagnostics.warnings().len(), 1);
    }

    #[test]
    fn fatal_kinds_become_diagnostic_errors() {
        let mut diagnostics = Diagnostics::new(WarningPolicy {
            fatal: vec![WarningKind::UnknownCompilerTag],
            ..WarningPolicy::default()
        });

        let error = diagnostics
            .warn(WarningKind::UnknownCompilerTag, "sparkle", TextLocation::new_just_line(1))
            .expect_err("unknown tags are configured fatal");

        assert_eq!(error.error_type, ErrorType::Diagnostic);
        assert_eq!(error.promoted_warning_kind(), Some(WarningKind::UnknownCompilerTag));
        assert!(diagnostics.warnings().is_empty());
    }

    #[test]
    fn promoted_errors_keep_the_warning_text() {
        let mut diagnostics = Diagnostics::new(WarningPolicy {
            fatal: vec![WarningKind::UnboundSymbolRead],
            ..WarningPolicy::default()
        });

        let msg = "'x' is always unbound here, reading it will fail";
        let error = diagnostics
            .warn(WarningKind::UnboundSymbolRead, msg, TextLocation::new_just_line(3))
            .expect_err("unbound reads are configured fatal");

        assert_eq!(error.msg, msg);
    }

    #[test]
    fn disabled_kinds_are_dropped() {
        let mut diagnostics = Diagnostics::new(WarningPolicy {
            disabled: vec![WarningKind::UnreachableCode],
            ..WarningPolicy::default()
        });

        diagnostics
            .warn(WarningKind::UnreachableCode, "throw", TextLocation::new_just_line(2))
            .expect("disabled warnings never fail");

        assert!(diagnostics.warnings().is_empty());
    }
}
