//! Status taxonomy for `dpatch`.
//!
//! `Status` is the closed set of outcome tags this engine can report;
//! `DpatchError` is the concrete error type fallible operations return, with
//! one variant per tag and a human-readable message attached through
//! `thiserror`.

use std::fmt;

/// A closed set of outcome tags used for diagnostics and tests that assert
/// on "which kind of failure" rather than a specific message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Success.
    Ok,
    /// General or unspecified error.
    Error,
    /// Allocation failed.
    NoMem,
    /// A memory-protection change failed.
    MProt,
    /// A patch named an operation this engine does not recognize.
    Unknown,
    /// Symbol resolution against the live image failed.
    Dyn,
    /// Script file I/O failed.
    File,
    /// The patch script could not be parsed.
    Syntax,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Ok => "ok",
            Status::Error => "general error",
            Status::NoMem => "allocation failure",
            Status::MProt => "memory protection change failed",
            Status::Unknown => "unrecognized patch operation",
            Status::Dyn => "symbol resolution failed",
            Status::File => "script file I/O failed",
            Status::Syntax => "patch script syntax error",
        };
        f.write_str(s)
    }
}

/// The error type returned by every fallible `dpatch` operation.
///
/// Each variant corresponds to exactly one [`Status`] tag; `status()`
/// recovers the tag for callers (and tests) that only care about the
/// outcome class, not the specific message.
#[derive(Debug, thiserror::Error)]
pub enum DpatchError {
    #[error("allocation failed while growing a machine-code or patch-set buffer")]
    NoMem,

    #[error("memory protection change failed for address range starting at {addr:#x}, length {len}")]
    MProt { addr: usize, len: usize },

    #[error("unrecognized patch operation `{token}`")]
    UnknownOperation { token: String },

    #[error("symbol `{name}` could not be resolved in the running image")]
    SymbolNotFound { name: String },

    #[error("could not read patch script `{path}`: {source}")]
    ScriptIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: expected 3 whitespace-separated tokens, found {found}")]
    SyntaxTokenCount { line: usize, found: usize },

    #[error("line {line}: exceeds the maximum line length of {max} bytes")]
    SyntaxLineTooLong { line: usize, max: usize },

    #[error("the page size could not be determined")]
    PageSizeUnavailable,

    #[error("{0}")]
    Other(String),
}

impl DpatchError {
    /// Recover the [`Status`] tag this error corresponds to.
    pub fn status(&self) -> Status {
        match self {
            DpatchError::NoMem => Status::NoMem,
            DpatchError::MProt { .. } => Status::MProt,
            DpatchError::UnknownOperation { .. } => Status::Unknown,
            DpatchError::SymbolNotFound { .. } => Status::Dyn,
            DpatchError::ScriptIo { .. } => Status::File,
            DpatchError::SyntaxTokenCount { .. } | DpatchError::SyntaxLineTooLong { .. } => {
                Status::Syntax
            }
            DpatchError::PageSizeUnavailable => Status::Error,
            DpatchError::Other(_) => Status::Error,
        }
    }
}
