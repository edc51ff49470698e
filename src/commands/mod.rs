//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `conflayer` command-line tool. Each subcommand is defined in its own file
//! to keep the logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and
//!   options, derived using `clap`.
//! - An `execute` function that takes the parsed `Args`, performs the
//!   command's logic by calling into the `conflayer` library, and returns
//!   the process exit code.

pub mod combine;
pub mod completions;
pub mod diff;
pub mod merge;
pub mod minimize;
pub mod promote;
pub mod sort;
