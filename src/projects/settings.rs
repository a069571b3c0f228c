use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::compiler_warnings::WarningKind;
use crate::return_config_error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "treefold.toml";
pub const UNIT_FILE_EXTENSION: &str = "json";
pub const OPTIMIZED_UNIT_SUFFIX: &str = ".opt";

// These are guesses about how much should be initially allocated.
// Rough heuristics from small hand-written units, not measured.
pub const MINIMUM_STRING_TABLE_CAPACITY: usize = 32;
pub const ANNOTATION_BUFFER_CAPACITY: usize = 4; // Few declarations carry more than a handful of decorators
pub const SCOPE_SYMBOL_CAPACITY: usize = 4;

pub const DEFAULT_UNWIND_LIMIT: u32 = 64;

// Every rewrite either shrinks the tree or normalizes a node exactly once,
// so a unit that is still changing after this many passes is an optimizer bug.
pub const DEFAULT_MAX_PASSES: u32 = 64;

/// Options recognized by the optimizer driver.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Run a single rewrite pass instead of iterating to a fixpoint
    pub one_pass: bool,

    /// Enable flow-sensitive assumption tracking
    pub assume: bool,

    /// Bound on constant-folding recursion depth.
    /// Anything deeper is treated as statically unknown.
    pub unwind_limit: u32,

    pub max_passes: u32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            one_pass: false,
            assume: true,
            unwind_limit: DEFAULT_UNWIND_LIMIT,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

/// Which warnings are promoted to errors and which are silenced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WarningPolicy {
    pub fatal: Vec<WarningKind>,
    pub disabled: Vec<WarningKind>,
    pub all_fatal: bool,
}

impl WarningPolicy {
    pub fn is_fatal(&self, kind: WarningKind) -> bool {
        self.all_fatal || self.fatal.contains(&kind)
    }

    pub fn is_disabled(&self, kind: WarningKind) -> bool {
        self.disabled.contains(&kind) && !self.is_fatal(kind)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub optimizer: OptimizerConfig,
    pub warnings: WarningPolicy,
}

impl Config {
    pub fn from_toml_str(source: &str) -> Result<Self, CompilerError> {
        match toml::from_str::<Config>(source) {
            Ok(config) => Ok(config),
            Err(e) => return_config_error!(format!("Invalid {CONFIG_FILE_NAME}: {e}"), {
                PrimarySuggestion => "Only [optimizer] and [warnings] sections are recognised",
            }),
        }
    }

    /// Loads the config file at the given path.
    /// A missing file is not an error: the defaults are used instead.
    pub fn load(path: &Path) -> Result<Self, CompilerError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                return Err(CompilerError::file_error(
                    path,
                    format!("Could not read config file: {e}"),
                ));
            }
        };

        Self::from_toml_str(&source).map_err(|e| e.with_file_path(path.to_path_buf()))
    }
}
