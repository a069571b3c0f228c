use crate::compiler_frontend::compiler_errors::{
    CompilerError, CompilerMessages, ErrorMetaDataKey, ErrorType, error_type_to_str,
};
use crate::compiler_frontend::compiler_warnings::print_formatted_warning;
use crate::compiler_frontend::optimizers::optimizer::OptimizeReport;
use crate::compiler_frontend::string_interning::StringTable;
use saying::say;
use std::env;
use std::path::{Path, PathBuf};

fn normalize_display_path(path: &Path) -> PathBuf {
    let path_string = path.to_string_lossy();
    if let Some(stripped) = path_string.strip_prefix(r"\\?\") {
        return PathBuf::from(stripped);
    }

    path.to_path_buf()
}

fn relative_display_path(path: &Path) -> String {
    let normalized = normalize_display_path(path);

    match env::current_dir() {
        Ok(dir) => {
            let normalized_dir = normalize_display_path(&dir);
            normalized
                .strip_prefix(&normalized_dir)
                .unwrap_or(&normalized)
                .to_string_lossy()
                .to_string()
        }
        Err(_) => normalized.to_string_lossy().to_string(),
    }
}

pub fn print_compiler_messages(messages: CompilerMessages, string_table: &StringTable) {
    for err in messages.errors {
        print_formatted_error(err, string_table);
    }

    for warning in &messages.warnings {
        print_formatted_warning(warning, string_table);
    }
}

/// Pass and rewrite counts for one unit, most frequent rules last
pub fn print_optimize_report(unit_name: &str, report: &OptimizeReport) {
    let passes = report.passes;
    let events = report.rewrite_events;

    say!(Green Bold unit_name, Reset ": ", Bold passes, " passes, ", Bold events, " rewrites");

    let mut by_rule = report.sorted_events();
    by_rule.sort_by_key(|(_, count)| *count);

    for (rule, count) in by_rule {
        let name = rule.to_str();
        say!(Bright Black "  ", name, ": ", Reset count);
    }
}

pub fn print_formatted_error(e: CompilerError, string_table: &StringTable) {
    let relative_dir = match &e.file_path {
        Some(path) => relative_display_path(path),
        None => String::new(),
    };
    let location = e.location.display(string_table);
    let title = error_type_to_str(&e.error_type);

    match e.error_type {
        // The host stopped the compilation, nothing went wrong in the code
        ErrorType::Interrupted => {
            say!(Bright Black "Compilation abandoned");
            return;
        }

        ErrorType::Allocation => {
            say!("\n(ﾉ☉_⚆)ﾉ  🔥🔥 ", Red title, " 🔥🔥");
            say!(Dark Magenta location);
        }

        ErrorType::Diagnostic => {
            let kind = e
                .metadata
                .get(&ErrorMetaDataKey::WarningKind)
                .copied()
                .unwrap_or_default();

            say!("\n(ಠ_ಠ) ", Red title, Dark Yellow " [", kind, "]");
            say!(Dark Magenta location);
        }

        ErrorType::File => {
            say!(Yellow "🏚 Can't find/read file or directory: ", relative_dir);
            say!(e.msg);
            return;
        }

        ErrorType::Config => {
            if !relative_dir.is_empty() {
                say!("\n (-_-)  🔥🔥🔥🔥 ", Dark Magenta relative_dir, " 🔥🔥🔥🔥  <(^~^)/ ");
            }
            say!(Yellow "CONFIG FILE ISSUE- ");
            say!(Dark Yellow "Malformed config, something doesn't make sense inside the optimizer settings");
        }

        ErrorType::Compiler => {
            say!("\nヽ༼☉ ‿ ⚆༽ﾉ  🔥🔥🔥🔥 ", Dark Magenta location, " 🔥🔥🔥🔥  ╰(° _ o╰) ");
            say!(Yellow "COMPILER BUG - ");
            say!(Dark Yellow "optimizer developer skill issue (not your fault)");
        }
    }

    say!(Red e.msg);
}
