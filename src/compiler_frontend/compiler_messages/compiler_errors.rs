use crate::compiler_frontend::ast::ast_nodes::TextLocation;
use crate::compiler_frontend::compiler_warnings::{CompilerWarning, WarningKind};
use std::collections::HashMap;
use std::collections::TryReserveError;
use std::path::{Path, PathBuf};

// The final set of errors and warnings emitted from a compilation
#[derive(Debug, Default)]
pub struct CompilerMessages {
    pub errors: Vec<CompilerError>,
    pub warnings: Vec<CompilerWarning>,
}

impl CompilerMessages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_error(error: CompilerError) -> Self {
        Self {
            errors: vec![error],
            warnings: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
pub enum ErrorMetaDataKey {
    CompilationStage,
    WarningKind,

    // One-line fix or top-level idea
    PrimarySuggestion,
}

#[derive(Debug, Clone)]
pub struct CompilerError {
    pub msg: String,
    pub location: TextLocation,
    pub error_type: ErrorType,

    // File path for errors that happen outside a unit (config and unit files)
    pub file_path: Option<PathBuf>,

    pub metadata: HashMap<ErrorMetaDataKey, &'static str>,
}

impl CompilerError {
    pub fn new(msg: impl Into<String>, location: TextLocation, error_type: ErrorType) -> Self {
        CompilerError {
            msg: msg.into(),
            location,
            error_type,
            file_path: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_file_path(mut self, file_path: PathBuf) -> Self {
        self.file_path = Some(file_path);
        self
    }

    pub fn new_metadata_entry(&mut self, key: ErrorMetaDataKey, value: &'static str) {
        self.metadata.insert(key, value);
    }

    /// A node vector or annotation buffer could not grow.
    /// Always fatal to the current optimize call.
    pub fn allocation(error: TryReserveError, location: TextLocation) -> Self {
        let mut error = CompilerError::new(
            format!("Out of memory while rewriting the tree: {error}"),
            location,
            ErrorType::Allocation,
        );
        error.new_metadata_entry(ErrorMetaDataKey::CompilationStage, "Optimization");
        error
    }

    /// The host asked for the compilation to stop.
    /// This is not shown to the user as a compile error.
    pub fn interrupted() -> Self {
        CompilerError::new(
            "Compilation was interrupted",
            TextLocation::default(),
            ErrorType::Interrupted,
        )
    }

    /// A warning that the warning policy promotes to an error
    pub fn from_fatal_warning(warning: &CompilerWarning) -> Self {
        let mut error = CompilerError::new(
            warning.msg.clone(),
            warning.location,
            ErrorType::Diagnostic,
        );
        error.new_metadata_entry(ErrorMetaDataKey::WarningKind, warning.warning_kind.as_str());
        error
    }

    /// Create a compiler error (internal bug, not user's fault)
    pub fn compiler_error(msg: impl Into<String>) -> Self {
        CompilerError::new(msg, TextLocation::default(), ErrorType::Compiler)
    }

    pub fn file_error(path: &Path, msg: impl Into<String>) -> Self {
        CompilerError::new(msg, TextLocation::default(), ErrorType::File)
            .with_file_path(path.to_path_buf())
    }

    pub fn is_interrupted(&self) -> bool {
        self.error_type == ErrorType::Interrupted
    }

    pub fn promoted_warning_kind(&self) -> Option<WarningKind> {
        if self.error_type != ErrorType::Diagnostic {
            return None;
        }

        self.metadata
            .get(&ErrorMetaDataKey::WarningKind)
            .and_then(|kind| WarningKind::from_name(kind))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    Allocation,
    Diagnostic,
    Interrupted,
    Config,
    File,
    Compiler,
}

pub fn error_type_to_str(e_type: &ErrorType) -> &'static str {
    match e_type {
        ErrorType::Allocation => "Out Of Memory",
        ErrorType::Diagnostic => "Warning Treated As Error",
        ErrorType::Interrupted => "Interrupted",
        ErrorType::Config => "Malformed Config",
        ErrorType::File => "File Error",
        ErrorType::Compiler => "Compiler Bug",
    }
}

/// Returns a new CompilerError for internal optimizer bugs.
///
/// Usage:
/// `return_compiler_error!("message", {
///     CompilationStage => "Optimization",
/// })`;
#[macro_export]
macro_rules! return_compiler_error {
    ($msg:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err({
            let mut error = $crate::compiler_frontend::compiler_errors::CompilerError::compiler_error($msg);
            $(
                error.new_metadata_entry($crate::compiler_frontend::compiler_errors::ErrorMetaDataKey::$key, $value);
            )*
            error
        })
    };
    ($msg:expr) => {
        return Err($crate::compiler_frontend::compiler_errors::CompilerError::compiler_error($msg))
    };
}

/// Returns a new CompilerError for a malformed config file or CLI option.
#[macro_export]
macro_rules! return_config_error {
    ($msg:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err({
            let mut error = $crate::compiler_frontend::compiler_errors::CompilerError::new(
                $msg,
                $crate::compiler_frontend::ast::ast_nodes::TextLocation::default(),
                $crate::compiler_frontend::compiler_errors::ErrorType::Config,
            );
            $(
                error.new_metadata_entry($crate::compiler_frontend::compiler_errors::ErrorMetaDataKey::$key, $value);
            )*
            error
        })
    };
    ($msg:expr) => {
        $crate::return_config_error!($msg, {})
    };
}
