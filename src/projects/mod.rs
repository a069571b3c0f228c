//! The command line surface of treefold and the settings it reads.

// The basic CLI for optimizing serialized compilation units
pub(crate) mod cli;

pub mod settings;
