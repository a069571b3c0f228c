//! Annotation desugaring and fixpoint AST optimization.
//!
//! A `Compilation` owns one unit's string table, scopes and diagnostics.
//! Parsers push decorators onto it while building a declaration,
//! then `optimize_all` rewrites the unit's tree until nothing changes.

pub mod build_system {
    pub mod build;
}
pub mod compiler_frontend;
pub mod projects;

pub use compiler_frontend::Compilation;
pub use compiler_frontend::ast::compilation_unit::CompilationUnit;
pub use compiler_frontend::compiler_errors::{CompilerError, CompilerMessages, ErrorType};
pub use compiler_frontend::optimizers::optimizer::{CancellationToken, OptimizeReport};
pub use projects::settings::{Config, OptimizerConfig, WarningPolicy};

pub fn start_cli() {
    projects::cli::start_cli();
}
