use crate::annotation_log;
use crate::compiler_frontend::annotations::annotation_stack::{
    AnnotationEntry, AnnotationList, AnnotationPool,
};
use crate::compiler_frontend::annotations::desugar::apply_annotations;
use crate::compiler_frontend::ast::ast_nodes::{NodeKind, Operator, TextLocation};
use crate::compiler_frontend::ast::node_ref::NodeRef;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::compiler_warnings::WarningKind;
use crate::compiler_frontend::diagnostics::Diagnostics;
use crate::compiler_frontend::string_interning::StringTable;
use serde::{Deserialize, Serialize};

/// Tags the compiler itself understands, written like annotations (`@pure`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompilerTag {
    Pure,
    Inline,
    NoInline,
    Deprecated,
}

impl CompilerTag {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pure" => Some(CompilerTag::Pure),
            "inline" => Some(CompilerTag::Inline),
            "noinline" => Some(CompilerTag::NoInline),
            "deprecated" => Some(CompilerTag::Deprecated),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompilerTag::Pure => "pure",
            CompilerTag::Inline => "inline",
            CompilerTag::NoInline => "noinline",
            CompilerTag::Deprecated => "deprecated",
        }
    }
}

/// Everything attached to a declaration once the parser reaches its end
#[derive(Debug, Default)]
pub struct FinishedDeclaration {
    pub documentation: Option<String>,
    pub compiler_tags: Vec<CompilerTag>,
}

/// The per-declaration state the parser fills in before it sees the declaration itself:
/// pending annotations, doc comments and compiler tags.
#[derive(Debug)]
pub struct DeclarationTags {
    annotations: AnnotationList,
    documentation: Option<String>,
    compiler_tags: Vec<CompilerTag>,
}

impl DeclarationTags {
    pub fn begin(pool: &mut AnnotationPool) -> Self {
        Self {
            annotations: AnnotationList::new(pool),
            documentation: None,
            compiler_tags: Vec::new(),
        }
    }

    pub fn push_annotation(&mut self, entry: AnnotationEntry) -> Result<(), CompilerError> {
        self.annotations.push(entry)
    }

    pub fn pending_annotations(&self) -> usize {
        self.annotations.len()
    }

    pub fn compiler_tags(&self) -> &[CompilerTag] {
        &self.compiler_tags
    }

    pub fn append_documentation(&mut self, text: &str) {
        match &mut self.documentation {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(text);
            }
            None => self.documentation = Some(text.to_owned()),
        }
    }

    /// Records `@name`. Unknown names are reported and otherwise ignored.
    pub fn record_compiler_tag(
        &mut self,
        name: &str,
        location: TextLocation,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), CompilerError> {
        match CompilerTag::from_name(name) {
            Some(tag) => {
                if !self.compiler_tags.contains(&tag) {
                    self.compiler_tags.push(tag);
                }
                Ok(())
            }
            None => diagnostics.warn(
                WarningKind::UnknownCompilerTag,
                format!("'@{name}' is not a tag the compiler knows about, so it has no effect"),
                location,
            ),
        }
    }

    /// A compiler tag written where a keyword was expected (`@return` instead of `return`)
    pub fn report_tag_instead_of_keyword(
        &self,
        name: &str,
        location: TextLocation,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), CompilerError> {
        diagnostics.warn(
            WarningKind::TagInsteadOfKeyword,
            format!("'@{name}' is written like a tag here, did you mean the keyword '{name}'?"),
            location,
        )
    }

    /// Wraps the declared expression in every pending annotation
    pub fn apply(
        &mut self,
        input: NodeRef,
        pool: &mut AnnotationPool,
    ) -> Result<NodeRef, CompilerError> {
        if self.annotations.is_empty() {
            return Ok(input);
        }

        let annotations = std::mem::take(&mut self.annotations);
        apply_annotations(input, annotations, pool)
    }

    /// Clears the declaration state.
    /// Annotations that were never applied to anything are reported as unused.
    pub fn finish(
        self,
        pool: &mut AnnotationPool,
        diagnostics: &mut Diagnostics,
        string_table: &StringTable,
    ) -> Result<FinishedDeclaration, CompilerError> {
        let unused = self.annotations.oldest().map(|entry| {
            (
                entry.decorator.location,
                describe_decorator(&entry.decorator, string_table),
                self.annotations.len(),
            )
        });

        self.annotations.release(pool);

        if let Some((location, name, count)) = unused {
            annotation_log!("Dropping ", count, " unused annotations");
            diagnostics.warn(
                WarningKind::UnusedAnnotation,
                format!("Annotation '@{name}' is not attached to anything ({count} pending)"),
                location,
            )?;
        }

        Ok(FinishedDeclaration {
            documentation: self.documentation,
            compiler_tags: self.compiler_tags,
        })
    }
}

fn describe_decorator(decorator: &NodeRef, string_table: &StringTable) -> String {
    match &decorator.kind {
        NodeKind::Symbol(name) => string_table.resolve(*name).to_owned(),
        NodeKind::Operator {
            op: Operator::Call,
            lhs,
            ..
        } => format!("{}(..)", describe_decorator(lhs, string_table)),
        other => format!("{:?}", other.tag()).to_lowercase(),
    }
}
