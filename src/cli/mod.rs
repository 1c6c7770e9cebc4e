//! Command-line interface implementation
//!
//! `ctr` stands in for a host render pipeline: it feeds files (or stdin)
//! through manual replacement or the render hook, and exposes the token list
//! and configuration checks an admin UI would show.

mod parse;
mod replace;
mod tokens;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use glob::glob;

use crate::config::{load_config, merge_cli_overrides, CliOverrides, CtrConfig};
use crate::logging;
use crate::registry::TokenRegistry;
use crate::replacements::TokenReplacements;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Find all files with extension `ext` in a directory (recursively).
pub fn find_text_files(dir: &Path, ext: &str) -> Vec<PathBuf> {
    let pattern = format!("{}/**/*.{}", dir.display(), ext.trim_start_matches('.'));
    let mut files: Vec<PathBuf> = match glob(&pattern) {
        Ok(paths) => paths.filter_map(Result::ok).collect(),
        Err(_) => Vec::new(),
    };
    files.sort();
    files
}

/// Parse a `KEY=VALUE` argument
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) =
        s.split_once('=').ok_or_else(|| format!("invalid KEY=VALUE: no '=' in '{}'", s))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Output format for listings and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Cacheable token replacements - substitute placeholder tokens in rendered output
#[derive(Parser)]
#[command(name = "ctr")]
#[command(about = "Cacheable token replacements - substitute placeholder tokens in rendered output")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replace tokens in files (or stdin) and print the result
    Replace {
        /// Input files. Reads stdin when no files and no --dir are given
        files: Vec<PathBuf>,

        /// Process every file with --ext under this directory
        #[arg(long)]
        dir: Option<PathBuf>,

        /// File extension used with --dir
        #[arg(long, default_value = "html")]
        ext: String,

        /// Config file (default: ctr.toml discovered from the working directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Apply the render hook policy (automatic / frontend-only) instead of manual replacement
        #[arg(long)]
        hook: bool,

        /// Treat the request as targeting the admin surface
        #[arg(long)]
        admin: bool,

        /// Request path exposed to callbacks
        #[arg(long)]
        path: Option<String>,

        /// Request attribute exposed to callbacks (repeatable)
        #[arg(long = "attr", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        attrs: Vec<(String, String)>,

        /// Override config: disable automatic mode
        #[arg(long)]
        no_automatic: bool,

        /// Override config: apply the hook to admin requests as well
        #[arg(long)]
        all_surfaces: bool,

        /// Rewrite files in place instead of printing to stdout
        #[arg(long)]
        in_place: bool,

        /// Print per-token diagnostics to stderr (manual mode only)
        #[arg(long, value_enum)]
        diagnostics: Option<OutputFormat>,

        /// Exit with an error if any token was left unreplaced (with --hook, only
        /// for requests the hook applies to)
        #[arg(long)]
        strict: bool,
    },
    /// List registered tokens and their validity
    Tokens {
        /// Config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Validate the configuration
    Check {
        /// Config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the tokens found in a file as JSON lines
    Parse {
        /// Input file (default: stdin)
        input: Option<PathBuf>,

        /// Config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Load the configuration, reporting failures on stderr.
pub(crate) fn load_cli_config(
    path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<CtrConfig, ExitCode> {
    let mut config = load_config(path).map_err(|e| {
        eprintln!("Error: {}", e);
        ExitCode::from(EXIT_ERROR)
    })?;
    merge_cli_overrides(&mut config, overrides);
    Ok(config)
}

/// Build the facade from configuration with a fresh registry.
pub(crate) fn build_replacements(config: &CtrConfig) -> TokenReplacements {
    TokenReplacements::from_config(config, Arc::new(TokenRegistry::new()))
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Replace {
            files,
            dir,
            ext,
            config,
            hook,
            admin,
            path,
            attrs,
            no_automatic,
            all_surfaces,
            in_place,
            diagnostics,
            strict,
        } => replace::run_replace(
            &files,
            dir.as_deref(),
            &ext,
            config.as_deref(),
            hook,
            admin,
            path,
            attrs,
            no_automatic,
            all_surfaces,
            in_place,
            diagnostics,
            strict,
        ),
        Commands::Tokens { config, format } => tokens::run_tokens(config.as_deref(), format),
        Commands::Check { config } => tokens::run_check(config.as_deref()),
        Commands::Parse { input, config } => parse::run_parse(input.as_deref(), config.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(parse_key_val("user=ada"), Ok(("user".to_string(), "ada".to_string())));
        assert_eq!(parse_key_val("q=a=b"), Ok(("q".to_string(), "a=b".to_string())));
        assert_eq!(parse_key_val("empty="), Ok(("empty".to_string(), String::new())));
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn test_find_text_files() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp.path().join("index.html"), "x").unwrap();
        fs::write(nested.join("page.html"), "x").unwrap();
        fs::write(nested.join("notes.txt"), "x").unwrap();

        let files = find_text_files(temp.path(), "html");
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "html"));

        assert_eq!(find_text_files(temp.path(), ".txt").len(), 1);
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
