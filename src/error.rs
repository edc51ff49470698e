//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `conflayer` application. It uses the `thiserror` library to create a
//! comprehensive `Error` enum that covers all anticipated failure modes,
//! providing clear and descriptive error messages.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum that represents all possible errors that can
//!   occur within the application. Each variant corresponds to a specific
//!   type of error and includes contextual information to aid in debugging.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`, used
//!   throughout the application to simplify function signatures and ensure
//!   type safety.
//!
//! Parse failures (duplicate stanzas/keys, dangling headers, unexpected
//! lines) form one family that maps to the `20`-range exit codes. Missing
//! and unreadable files are kept distinct so batch commands can continue
//! past one bad file and report an aggregate count. Anything unexpected
//! maps to the `100`-range and aborts the whole run.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for conflayer operations
#[derive(Error, Debug)]
pub enum Error {
    /// A stanza header repeated while the duplicate policy was `Exception`.
    #[error("Duplicate stanza [{name}] at line {line}")]
    DuplicateStanza { name: String, line: usize },

    /// A key repeated within one stanza while the duplicate policy was
    /// `Exception`.
    #[error("Duplicate key '{key}' in stanza [{stanza}] at line {line}")]
    DuplicateKey {
        stanza: String,
        key: String,
        line: usize,
    },

    /// A stray `[` or `]` fragment that is not a complete stanza header.
    ///
    /// This is rejected even outside strict mode.
    #[error("Dangling stanza header fragment at line {line}: {text:?}")]
    DanglingStanzaHeader { line: usize, text: String },

    /// A non-blank line inside a stanza that is neither a comment nor a
    /// `key = value` pair, rejected under strict parsing.
    #[error("Unexpected line {line}: {text:?}")]
    UnexpectedLine { line: usize, text: String },

    /// A declared layer path is not a directory, or layer discovery could
    /// not walk the tree.
    #[error("Layer discovery error for {}: {message}", path.display())]
    LayerDiscovery { path: PathBuf, message: String },

    /// An input file does not exist.
    #[error("File not found: {}", path.display())]
    MissingFile { path: PathBuf },

    /// An input file exists but could not be read.
    #[error("Unreadable file {}: {message}", path.display())]
    Unreadable { path: PathBuf, message: String },

    /// A combine-pipeline consistency fault (never a value conflict; those
    /// always resolve by rank order).
    #[error("Combine error: {message}")]
    Combine { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// An internal consistency fault. Aborts the run rather than risking a
    /// false success on a partially processed tree.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Map this error onto the process exit-code convention.
    ///
    /// `0` is success, `1`/`2` are reserved for "difference found" and
    /// "sort applied", `20`+ for malformed input, `100`+ for internal
    /// errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::DuplicateStanza { .. }
            | Error::DuplicateKey { .. }
            | Error::DanglingStanzaHeader { .. }
            | Error::UnexpectedLine { .. } => 20,
            Error::LayerDiscovery { .. } => 21,
            Error::MissingFile { .. } | Error::Unreadable { .. } => 22,
            Error::Combine { .. } => 23,
            Error::Io(_) | Error::Glob(_) | Error::Regex(_) | Error::Internal { .. } => 100,
        }
    }

    /// Whether this error came from parsing malformed document text.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Error::DuplicateStanza { .. }
                | Error::DuplicateKey { .. }
                | Error::DanglingStanzaHeader { .. }
                | Error::UnexpectedLine { .. }
        )
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
