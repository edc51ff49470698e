//! # Conflayer CLI
//!
//! This is the binary entry point for the `conflayer` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Translating errors into user-friendly output and the documented
//!   exit-code convention.
//!
//! The core application logic is defined in the `lib.rs` library crate,
//! ensuring that the binary is a thin wrapper around the reusable library
//! functionality.
//!
//! ## Exit Codes
//!
//! - `0`: success, no differences
//! - `1`: a difference was found (`diff`)
//! - `2`: files were rewritten (`sort --in-place`)
//! - `20`-`23`: malformed input, layer discovery, missing file, combine
//! - `100`: internal error

mod cli;
mod commands;

use clap::Parser;

use conflayer::error::Error;

fn main() {
    let cli = cli::Cli::parse();
    let code = match cli.execute() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            err.downcast_ref::<Error>().map_or(100, Error::exit_code)
        }
    };
    std::process::exit(code);
}
