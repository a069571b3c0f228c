//! AST optimization passes run after parsing and annotation desugaring.
//!
//! ## Organization
//! - `optimizer`: the fixpoint driver and per-kind dispatch
//! - `assumptions`: flow-sensitive symbol facts
//! - `node_facts`: read-only queries about subtrees
//! - the remaining modules hold the rewrite rules, grouped by node kind

pub mod assumptions;
pub mod node_facts;
pub mod optimizer;

mod bindings;
mod boolean_cast;
mod constant_folding;
mod control_flow;
mod sequences;

#[cfg(test)]
mod tests;
