//! Line-oriented patch script parser.
//!
//! Grammar:
//!
//! ```text
//! line := OP WS FROM WS TO
//! ```
//!
//! `OP` is one of the recognized operation tokens (`REPLACE_FUNCTION_INTERNAL`,
//! `NOP`); `FROM`/`TO` are whitespace-free symbol names. Blank and
//! whitespace-only lines are skipped; any other line that does not split
//! into exactly three tokens is a syntax error. Lines longer than 255
//! bytes are a syntax error regardless of their content.

use crate::patch_set::PatchSet;
use crate::status::DpatchError;
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Maximum permitted line length, in bytes.
pub const MAX_LINE_LEN: usize = 255;

/// A patch script: a file path plus the operation to parse it into a
/// [`PatchSet`].
pub struct PatchScript {
    path: PathBuf,
}

impl PatchScript {
    /// Reference a script at `path`. Construction does not touch the
    /// filesystem; parsing happens in [`PatchScript::parse`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PatchScript { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the script line by line and build a fresh [`PatchSet`] from
    /// it. A script produces exactly one patch set.
    pub fn parse(&self) -> Result<PatchSet, DpatchError> {
        let file = std::fs::File::open(&self.path).map_err(|source| DpatchError::ScriptIo {
            path: self.path.display().to_string(),
            source,
        })?;
        let reader = std::io::BufReader::new(file);

        let mut set = PatchSet::new();
        for (index, line) in reader.lines().enumerate() {
            let line_number = index + 1;
            let line = line.map_err(|source| DpatchError::ScriptIo {
                path: self.path.display().to_string(),
                source,
            })?;
            if let Some((op, from, to)) = parse_line(&line, line_number)? {
                add_operation(&mut set, op, from, to)?;
            }
        }
        Ok(set)
    }
}

/// Parse one line into `(op_token, from, to)`, or `None` if the line is
/// blank/whitespace-only and should be skipped.
fn parse_line(line: &str, line_number: usize) -> Result<Option<(&str, &str, &str)>, DpatchError> {
    if line.len() > MAX_LINE_LEN {
        return Err(DpatchError::SyntaxLineTooLong {
            line: line_number,
            max: MAX_LINE_LEN,
        });
    }
    if line.trim().is_empty() {
        return Ok(None);
    }

    let mut tokens = line.split_whitespace();
    let op = tokens.next();
    let from = tokens.next();
    let to = tokens.next();
    let extra = tokens.next();

    match (op, from, to, extra) {
        (Some(op), Some(from), Some(to), None) => Ok(Some((op, from, to))),
        (op, from, to, extra) => {
            let found = [op, from, to, extra].iter().filter(|t| t.is_some()).count();
            Err(DpatchError::SyntaxTokenCount {
                line: line_number,
                found,
            })
        }
    }
}

/// Map a script token to a [`crate::patch::PatchKind`] and add it to `set`.
fn add_operation(
    set: &mut PatchSet,
    op_token: &str,
    from: &str,
    to: &str,
) -> Result<(), DpatchError> {
    use crate::patch::PatchKind;

    let kind = match op_token {
        "REPLACE_FUNCTION_INTERNAL" => PatchKind::ReplaceFunctionInternal,
        "NOP" => PatchKind::Nop,
        other => {
            return Err(DpatchError::UnknownOperation {
                token: other.to_string(),
            })
        }
    };
    set.add(kind, from, to)
}
