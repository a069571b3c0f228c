pub mod annotation_stack;
pub mod declaration_tags;
pub mod desugar;
