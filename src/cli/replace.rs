//! Replace command implementation

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rayon::prelude::*;

use crate::config::CliOverrides;
use crate::context::{RequestContext, Surface};
use crate::engine::{Diagnostic, Outcome, SubstitutionResult};
use crate::replacements::TokenReplacements;

use super::{
    build_replacements, find_text_files, load_cli_config, OutputFormat, EXIT_ERROR,
    EXIT_INVALID_ARGS, EXIT_SUCCESS,
};

/// Result of processing one input
struct Processed {
    source: String,
    text: String,
    diagnostics: Vec<Diagnostic>,
}

/// Run one buffer through either the render hook policy or manual replacement.
///
/// In hook mode a request the policy skips passes through untouched with no
/// diagnostics; otherwise the pass is the same one the hook runs, so strict
/// mode can see what was left unreplaced.
fn process(
    replacements: &TokenReplacements,
    source: String,
    input: String,
    context: &RequestContext,
    hook: bool,
) -> Processed {
    if hook && !replacements.settings().applies_to(context) {
        return Processed { source, text: input, diagnostics: Vec::new() };
    }
    let SubstitutionResult { text, diagnostics } = replacements.substitute(&input, context);
    Processed { source, text, diagnostics }
}

fn print_diagnostics(processed: &Processed, format: OutputFormat) {
    for diag in &processed.diagnostics {
        match format {
            OutputFormat::Text => {
                let detail = match &diag.outcome {
                    Outcome::CallbackFailed(msg) => format!(": {}", msg),
                    _ => String::new(),
                };
                eprintln!(
                    "{}:{}..{}: {} {}{}",
                    processed.source,
                    diag.span.start,
                    diag.span.end,
                    diag.name,
                    diag.outcome.label(),
                    detail
                );
            }
            OutputFormat::Json => {
                let line = serde_json::json!({
                    "source": processed.source,
                    "diagnostic": diag,
                });
                eprintln!("{}", line);
            }
        }
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Execute the replace command
pub fn run_replace(
    files: &[PathBuf],
    dir: Option<&Path>,
    ext: &str,
    config: Option<&Path>,
    hook: bool,
    admin: bool,
    path: Option<String>,
    attrs: Vec<(String, String)>,
    no_automatic: bool,
    all_surfaces: bool,
    in_place: bool,
    diagnostics: Option<OutputFormat>,
    strict: bool,
) -> ExitCode {
    if hook && diagnostics.is_some() {
        eprintln!("Error: --diagnostics is only available in manual mode (without --hook)");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let mut inputs: Vec<PathBuf> = files.to_vec();
    if let Some(dir) = dir {
        if !dir.is_dir() {
            eprintln!("Error: '{}' is not a directory", dir.display());
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
        inputs.extend(find_text_files(dir, ext));
        if inputs.is_empty() {
            eprintln!("Error: No .{} files found in '{}'", ext, dir.display());
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    }

    // A file named explicitly may also turn up under --dir
    inputs.sort_by_key(|p| canonical(p));
    inputs.dedup_by_key(|p| canonical(p));

    if in_place && inputs.is_empty() {
        eprintln!("Error: --in-place requires input files");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let overrides = CliOverrides {
        automatic: no_automatic.then_some(false),
        frontend_only: all_surfaces.then_some(false),
    };
    let config = match load_cli_config(config, &overrides) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let replacements = build_replacements(&config);
    if !replacements.is_operational() {
        for problem in replacements.config_problems() {
            eprintln!("Warning: {}", problem);
        }
        eprintln!("Warning: token replacement disabled by invalid configuration");
    }

    let mut context = RequestContext {
        surface: if admin { Surface::Admin } else { Surface::Frontend },
        path,
        ..RequestContext::default()
    };
    context.attributes.extend(attrs);

    let processed: Vec<Result<Processed, String>> = if inputs.is_empty() {
        let mut input = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut input) {
            eprintln!("Error: Failed to read stdin: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
        vec![Ok(process(&replacements, "<stdin>".to_string(), input, &context, hook))]
    } else {
        inputs
            .par_iter()
            .map(|file| {
                let input = std::fs::read_to_string(file)
                    .map_err(|e| format!("Failed to read '{}': {}", file.display(), e))?;
                let result =
                    process(&replacements, file.display().to_string(), input, &context, hook);
                if in_place {
                    std::fs::write(file, &result.text)
                        .map_err(|e| format!("Failed to write '{}': {}", file.display(), e))?;
                }
                Ok(result)
            })
            .collect()
    };

    let mut had_error = false;
    let mut unreplaced = 0;
    for item in processed {
        match item {
            Ok(result) => {
                if let Some(format) = diagnostics {
                    print_diagnostics(&result, format);
                }
                unreplaced += result.diagnostics.iter().filter(|d| !d.outcome.is_success()).count();
                if !in_place {
                    print!("{}", result.text);
                }
            }
            Err(message) => {
                eprintln!("Error: {}", message);
                had_error = true;
            }
        }
    }

    if had_error {
        return ExitCode::from(EXIT_ERROR);
    }
    if strict && unreplaced > 0 {
        eprintln!("Error: {} token(s) left unreplaced (strict mode)", unreplaced);
        return ExitCode::from(EXIT_ERROR);
    }
    ExitCode::from(EXIT_SUCCESS)
}
