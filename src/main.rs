//! ctr - Command-line tool for cacheable token replacements

use std::process::ExitCode;

use cacheable_tokens::cli;

fn main() -> ExitCode {
    cli::run()
}
