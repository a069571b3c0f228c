//! Batch optimization of serialized compilation units.
//!
//! Units are independent of each other, so each one gets its own `Compilation`
//! and they are optimized in parallel.

use crate::compiler_frontend::Compilation;
use crate::compiler_frontend::ast::compilation_unit::CompilationUnit;
use crate::compiler_frontend::compiler_errors::{CompilerError, CompilerMessages};
use crate::compiler_frontend::optimizers::optimizer::{CancellationToken, OptimizeReport};
use crate::projects::settings::{Config, OPTIMIZED_UNIT_SUFFIX, UNIT_FILE_EXTENSION};
use crate::timer_log;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Where a unit came from and what happened to it
pub struct UnitOutcome {
    pub source_path: PathBuf,
    pub unit: CompilationUnit,
    pub report: Option<OptimizeReport>,
    pub messages: CompilerMessages,
}

pub struct InputUnit {
    pub source_path: PathBuf,
    pub unit: CompilationUnit,
}

/// Reads every unit file, collecting every file that could not be read
pub fn read_unit_files(paths: &[PathBuf]) -> Result<Vec<InputUnit>, CompilerMessages> {
    let mut messages = CompilerMessages::new();
    let mut units = Vec::with_capacity(paths.len());

    for path in paths {
        match read_unit_file(path) {
            Ok(unit) => units.push(InputUnit {
                source_path: path.to_owned(),
                unit,
            }),
            Err(e) => messages.errors.push(e),
        }
    }

    if messages.has_errors() {
        return Err(messages);
    }

    Ok(units)
}

pub fn read_unit_file(path: &Path) -> Result<CompilationUnit, CompilerError> {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            return Err(CompilerError::file_error(
                path,
                format!("Could not read unit file: {e}"),
            ));
        }
    };

    CompilationUnit::from_json(&source, path)
}

/// Optimizes every unit to a fixpoint, in parallel.
/// The outcomes come back in the same order as the inputs.
pub fn optimize_units(
    units: Vec<InputUnit>,
    config: &Config,
    cancel: &CancellationToken,
) -> Vec<UnitOutcome> {
    let time = Instant::now();

    let outcomes = units
        .into_par_iter()
        .map(|input| {
            let mut compilation =
                Compilation::new(input.unit, config.to_owned()).with_cancellation(cancel.clone());

            // A unit's root is a module body, nothing reads its value
            let result = compilation.optimize_all(false);

            let (report, error) = match result {
                Ok(report) => (Some(report), None),
                Err(e) => (None, Some(e.with_file_path(input.source_path.to_owned()))),
            };

            let (unit, messages) = compilation.into_parts(error);

            UnitOutcome {
                source_path: input.source_path,
                unit,
                report,
                messages,
            }
        })
        .collect();

    timer_log!(time, "Units optimized in: ");
    outcomes
}

/// `name.json` becomes `name.opt.json`, next to the source unless an output directory is given
pub fn output_path(source_path: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = source_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| String::from("unit"));

    let file_name = format!("{stem}{OPTIMIZED_UNIT_SUFFIX}.{UNIT_FILE_EXTENSION}");

    match (output_dir, source_path.parent()) {
        (Some(dir), _) => dir.join(file_name),
        (None, Some(parent)) => parent.join(file_name),
        (None, None) => PathBuf::from(file_name),
    }
}

pub fn write_unit_file(unit: &CompilationUnit, path: &Path) -> Result<(), CompilerError> {
    let json = unit.to_json()?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                return Err(CompilerError::file_error(
                    parent,
                    format!("Could not create output directory: {e}"),
                ));
            }
        }
    }

    match fs::write(path, json) {
        Ok(()) => Ok(()),
        Err(e) => Err(CompilerError::file_error(
            path,
            format!("Could not write optimized unit: {e}"),
        )),
    }
}
