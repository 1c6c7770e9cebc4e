//! Token list and config check commands

use std::path::Path;
use std::process::ExitCode;

use crate::config::{find_config, CliOverrides, ValidationLevel};
use crate::parser::TokenParams;
use crate::registry::TokenInfo;

use super::{build_replacements, load_cli_config, OutputFormat, EXIT_ERROR, EXIT_SUCCESS};

fn status(info: &TokenInfo) -> &'static str {
    match (info.name_valid, info.callback_valid) {
        (true, true) => "ok",
        (false, true) => "invalid name",
        (true, false) => "invalid callback",
        (false, false) => "invalid name, invalid callback",
    }
}

/// Execute the tokens command
pub fn run_tokens(config: Option<&Path>, format: OutputFormat) -> ExitCode {
    let config = match load_cli_config(config, &CliOverrides::default()) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let replacements = build_replacements(&config);
    let tokens = replacements.token_list();

    match format {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = tokens
                .iter()
                .map(|info| {
                    let mut row = serde_json::json!(info);
                    if let Some(example) = replacements.example_token(&info.name, &TokenParams::new())
                    {
                        row["example"] = serde_json::Value::String(example);
                    }
                    row
                })
                .collect();
            match serde_json::to_string_pretty(&rows) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::from(EXIT_ERROR);
                }
            }
        }
        OutputFormat::Text => {
            if tokens.is_empty() {
                println!("No tokens registered.");
                return ExitCode::from(EXIT_SUCCESS);
            }

            let width = tokens.iter().map(|t| t.name.len()).max().unwrap_or(0).max(4);
            println!("{:<width$}  {:<8}  {:<20}  DESCRIPTION", "NAME", "KIND", "STATUS");
            for info in &tokens {
                println!(
                    "{:<width$}  {:<8}  {:<20}  {}",
                    info.name,
                    info.kind.to_string(),
                    status(info),
                    info.description.as_deref().unwrap_or("")
                );
            }

            let settings = replacements.settings();
            println!();
            println!(
                "automatic: {}, frontend only: {}",
                if settings.automatic { "on" } else { "off" },
                if settings.frontend_only { "on" } else { "off" }
            );
            let params = TokenParams::new().with_positional("value").with_named("key", "value");
            if let Some(example) = replacements.example_token("name", &params) {
                println!("token format: {}", example);
            }
        }
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Execute the check command
pub fn run_check(config_path: Option<&Path>) -> ExitCode {
    let config = match load_cli_config(config_path, &CliOverrides::default()) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let source = config_path
        .map(Path::to_path_buf)
        .or_else(find_config)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults (no ctr.toml found)".to_string());

    let problems = config.validate();
    if problems.is_empty() {
        println!("{}: OK ({} token(s) configured)", source, config.tokens.len());
        return ExitCode::from(EXIT_SUCCESS);
    }

    for problem in &problems {
        let level = match problem.level {
            ValidationLevel::Error => "error",
            ValidationLevel::Warn => "warning",
        };
        eprintln!("{}: {}", level, problem);
    }
    if config.delimiters.build().is_err() {
        eprintln!("note: automatic token replacement is disabled until the delimiters are fixed");
    }
    ExitCode::from(EXIT_ERROR)
}
