//! Parse command implementation

use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use crate::config::CliOverrides;
use crate::parser::parse;

use super::{load_cli_config, EXIT_ERROR, EXIT_SUCCESS};

/// Execute the parse command
pub fn run_parse(input: Option<&Path>, config: Option<&Path>) -> ExitCode {
    let config = match load_cli_config(config, &CliOverrides::default()) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let delimiters = match config.delimiters.build() {
        Ok(delimiters) => delimiters,
        Err(e) => {
            eprintln!("Error: invalid delimiters: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let text = match input {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Error: Failed to read '{}': {}", path.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
        },
        None => {
            let mut text = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut text) {
                eprintln!("Error: Failed to read stdin: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
            text
        }
    };

    for occurrence in parse(&text, &delimiters) {
        match serde_json::to_string(&occurrence) {
            Ok(line) => println!("{}", line),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    }

    ExitCode::from(EXIT_SUCCESS)
}
