use crate::compiler_frontend::ast::ast_nodes::TextLocation;
use crate::compiler_frontend::string_interning::StringTable;
use saying::say;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilerWarning {
    pub msg: String,
    pub location: TextLocation,
    pub warning_kind: WarningKind,
}

impl CompilerWarning {
    pub fn new(msg: impl Into<String>, location: TextLocation, warning_kind: WarningKind) -> Self {
        CompilerWarning {
            msg: msg.into(),
            location,
            warning_kind,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    UnusedAnnotation,
    UnknownCompilerTag,
    TagInsteadOfKeyword,
    UnreachableCode,
    UnboundSymbolRead,
}

impl WarningKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WarningKind::UnusedAnnotation => "unused_annotation",
            WarningKind::UnknownCompilerTag => "unknown_compiler_tag",
            WarningKind::TagInsteadOfKeyword => "tag_instead_of_keyword",
            WarningKind::UnreachableCode => "unreachable_code",
            WarningKind::UnboundSymbolRead => "unbound_symbol_read",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "unused_annotation" => Some(WarningKind::UnusedAnnotation),
            "unknown_compiler_tag" => Some(WarningKind::UnknownCompilerTag),
            "tag_instead_of_keyword" => Some(WarningKind::TagInsteadOfKeyword),
            "unreachable_code" => Some(WarningKind::UnreachableCode),
            "unbound_symbol_read" => Some(WarningKind::UnboundSymbolRead),
            _ => None,
        }
    }
}

pub fn print_formatted_warning(w: &CompilerWarning, string_table: &StringTable) {
    let kind = w.warning_kind.as_str();
    let location = w.location.display(string_table);

    say!(Yellow "WARNING: ", Dark Yellow kind);
    say!(Dark Magenta location);
    say!(w.msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_names_round_trip_through_config_spelling() {
        for kind in [
            WarningKind::UnusedAnnotation,
            WarningKind::UnknownCompilerTag,
            WarningKind::TagInsteadOfKeyword,
            WarningKind::UnreachableCode,
            WarningKind::UnboundSymbolRead,
        ] {
            assert_eq!(WarningKind::from_name(kind.as_str()), Some(kind));
        }

        assert_eq!(WarningKind::from_name("unused_variable"), None);
    }
}
