//! Command-line entrypoint for the treefold optimizer.
//!
//! Parses the command and its flags, then hands serialized units to the batch optimizer.

use crate::build_system::build::{
    UnitOutcome, optimize_units, output_path, read_unit_files, write_unit_file,
};
use crate::compiler_frontend::compiler_errors::CompilerMessages;
use crate::compiler_frontend::display_messages::{print_compiler_messages, print_optimize_report};
use crate::compiler_frontend::optimizers::optimizer::CancellationToken;
use crate::compiler_frontend::string_interning::StringTable;
use crate::projects::settings::{CONFIG_FILE_NAME, Config};
use saying::say;
use std::env;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    // Optimizes one or more serialized compilation units
    Optimize {
        paths: Vec<PathBuf>,
        options: OptimizeOptions,
    },

    Help,
}

/// Everything on the command line that overrides the config file
#[derive(Debug, Default, PartialEq, Eq)]
struct OptimizeOptions {
    config_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    one_pass: bool,
    assume: Option<bool>,
    warnings_as_errors: bool,
    unwind_limit: Option<u32>,
    show_stats: bool,
}

impl OptimizeOptions {
    fn apply_to(&self, config: &mut Config) {
        if self.one_pass {
            config.optimizer.one_pass = true;
        }
        if let Some(assume) = self.assume {
            config.optimizer.assume = assume;
        }
        if let Some(limit) = self.unwind_limit {
            config.optimizer.unwind_limit = limit;
        }
        if self.warnings_as_errors {
            config.warnings.all_fatal = true;
        }
    }
}

pub fn start_cli() {
    let compiler_args: Vec<String> = env::args().collect();

    if compiler_args.len() < 2 {
        print_help(false);
        return;
    }

    let command = match get_command(&compiler_args[1..]) {
        Ok(command) => command,
        Err(e) => {
            say!(Red e);
            print_help(true);
            return;
        }
    };

    match command {
        Command::Help => {
            print_help(false);
        }

        Command::Optimize { paths, options } => {
            let start = Instant::now();

            let config = match load_config(&options) {
                Ok(config) => config,
                Err(messages) => {
                    print_compiler_messages(messages, &StringTable::new());
                    return;
                }
            };

            let units = match read_unit_files(&paths) {
                Ok(units) => units,
                Err(messages) => {
                    print_compiler_messages(messages, &StringTable::new());
                    return;
                }
            };

            let unit_count = units.len();
            let outcomes = optimize_units(units, &config, &CancellationToken::new());
            let failed = report_outcomes(outcomes, &options);

            let duration = start.elapsed();
            say!(Bright Black "------------------------------------");
            if failed == 0 {
                say!("Optimized ", Blue unit_count, " units in ", Green #duration);
            } else {
                say!(Red "Failed to optimize ", Red Bold failed, Red " of ", unit_count, Red " units");
            }
        }
    }
}

fn load_config(options: &OptimizeOptions) -> Result<Config, CompilerMessages> {
    let config_path = match &options.config_path {
        Some(path) => path.to_owned(),
        None => PathBuf::from(CONFIG_FILE_NAME),
    };

    let mut config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => return Err(CompilerMessages::from_error(e)),
    };

    options.apply_to(&mut config);
    Ok(config)
}

/// Prints what happened to each unit and writes the ones that succeeded.
/// Returns how many units failed.
fn report_outcomes(outcomes: Vec<UnitOutcome>, options: &OptimizeOptions) -> usize {
    let mut failed = 0;

    for outcome in outcomes {
        let UnitOutcome {
            source_path,
            unit,
            report,
            mut messages,
        } = outcome;

        if let Some(report) = &report {
            if options.show_stats {
                print_optimize_report(&unit.name, report);
            }

            let destination = output_path(&source_path, options.output_dir.as_deref());
            if let Err(e) = write_unit_file(&unit, &destination) {
                messages.errors.push(e);
            }
        }

        if messages.has_errors() {
            failed += 1;
        }

        print_compiler_messages(messages, &unit.strings);
    }

    failed
}

fn get_command(args: &[String]) -> Result<Command, String> {
    let command = args.first().map(String::as_str);

    match command {
        Some("help") | Some("--help") => Ok(Command::Help),

        Some("optimize") => parse_optimize_command(args),

        Some(other) => Err(format!("Invalid command: '{other}'")),

        None => Err(String::from("No command given")),
    }
}

fn parse_optimize_command(args: &[String]) -> Result<Command, String> {
    let mut paths = Vec::new();
    let mut options = OptimizeOptions::default();
    let mut index = 1usize;

    while let Some(arg) = args.get(index) {
        match arg.as_str() {
            "--config" => {
                options.config_path = Some(PathBuf::from(flag_value(args, index, "--config")?));
                index += 2;
            }
            "--out" => {
                options.output_dir = Some(PathBuf::from(flag_value(args, index, "--out")?));
                index += 2;
            }
            "--unwind-limit" => {
                let limit_value = flag_value(args, index, "--unwind-limit")?;
                options.unwind_limit = match limit_value.parse::<u32>() {
                    Ok(limit) => Some(limit),
                    Err(_) => {
                        return Err(format!(
                            "Invalid --unwind-limit value: '{limit_value}'. It must be a non-negative integer."
                        ));
                    }
                };
                index += 2;
            }
            "--one-pass" => {
                options.one_pass = true;
                index += 1;
            }
            "--assume" => {
                options.assume = Some(true);
                index += 1;
            }
            "--no-assume" => {
                options.assume = Some(false);
                index += 1;
            }
            "--warnings-as-errors" => {
                options.warnings_as_errors = true;
                index += 1;
            }
            "--show-stats" => {
                options.show_stats = true;
                index += 1;
            }
            _ if arg.starts_with("--") => {
                return Err(format!("Unknown optimize flag: '{arg}'"));
            }
            _ => {
                paths.push(PathBuf::from(arg));
                index += 1;
            }
        }
    }

    if paths.is_empty() {
        return Err(String::from(
            "The optimize command needs at least one unit file.",
        ));
    }

    Ok(Command::Optimize { paths, options })
}

fn flag_value<'a>(args: &'a [String], index: usize, flag: &str) -> Result<&'a str, String> {
    match args.get(index + 1) {
        Some(value) if !value.starts_with("--") => Ok(value),
        _ => Err(format!("Missing value for {flag}")),
    }
}

fn print_help(commands_only: bool) {
    if !commands_only {
        say!(Bright Black "------------------------------------");
        say!(Green Bold "treefold - annotation desugaring and AST optimization");
        say!("Usage: ", Bold "<command>", Italic " <args>");
    }
    say!(Green Bold "\nCommands:");
    say!("  optimize <unit.json>...   - Optimizes serialized compilation units");
    say!("  help                      - Shows this message");

    say!(Green Bold "\nOptimize flags:");
    say!("  --config <path>       (default: ", CONFIG_FILE_NAME, ")");
    say!("  --out <dir>           (default: next to each unit)");
    say!("  --one-pass");
    say!("  --assume / --no-assume");
    say!("  --warnings-as-errors");
    say!("  --unwind-limit <n>");
    say!("  --show-stats");
}

#[cfg(test)]
#[path = "tests/cli_tests.rs"]
mod tests;
