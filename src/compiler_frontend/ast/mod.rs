pub mod ast_nodes;
pub mod compilation_unit;
pub mod node_ref;
pub mod scopes;
