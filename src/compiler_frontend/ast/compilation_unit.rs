use crate::ast_log;
use crate::compiler_frontend::ast::ast_nodes::{AstNode, TextLocation};
use crate::compiler_frontend::ast::node_ref::NodeRef;
use crate::compiler_frontend::ast::scopes::{ScopeArena, ScopeId};
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::string_interning::StringTable;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One parsed function body or module, with everything needed to optimize it on its own.
///
/// Shared subtrees are serialized as separate copies, so a unit that is read back
/// never starts with shared nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub name: String,
    pub strings: StringTable,
    pub scopes: ScopeArena,
    pub root: NodeRef,
}

impl CompilationUnit {
    /// An empty unit whose root is the "no value" constant
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strings: StringTable::new(),
            scopes: ScopeArena::new(),
            root: NodeRef::new(AstNode::no_value(TextLocation::default(), ScopeId::ROOT)),
        }
    }

    pub fn from_json(source: &str, path: &Path) -> Result<Self, CompilerError> {
        let unit: Self = serde_json::from_str(source).map_err(|e| {
            CompilerError::file_error(path, format!("Not a valid compilation unit: {e}"))
        })?;

        ast_log!(
            "Loaded unit '", {unit.name.as_str()}, "' with ",
            {unit.scopes.len()}, " scopes and ", {unit.strings.len()}, " names"
        );

        Ok(unit)
    }

    pub fn to_json(&self) -> Result<String, CompilerError> {
        serde_json::to_string_pretty(self).map_err(|e| {
            CompilerError::compiler_error(format!(
                "Could not serialize compilation unit '{}': {e}",
                self.name
            ))
        })
    }
}
