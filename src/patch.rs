//! A single symbolic rewrite operation.

use crate::code_generator::append_long_jump;
use crate::machine_code::MachineCode;
use crate::status::DpatchError;
use crate::symbol;

/// The kind of rewrite a [`Patch`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchKind {
    /// Replace `old_symbol` with `new_symbol`; both must be resident in
    /// the target image at apply time.
    ReplaceFunctionInternal,
    /// No-op; always succeeds.
    Nop,
}

/// A single rewrite operation: `(kind, old_symbol, new_symbol)`.
///
/// Applying a [`PatchKind::ReplaceFunctionInternal`] patch is destructive
/// and not reversible by this type — there is no undo operation.
#[derive(Debug, Clone)]
pub struct Patch {
    kind: PatchKind,
    old_symbol: String,
    new_symbol: String,
}

impl Patch {
    /// Construct a new patch, copying the symbol names.
    pub fn new(kind: PatchKind, old_symbol: impl Into<String>, new_symbol: impl Into<String>) -> Self {
        Patch {
            kind,
            old_symbol: old_symbol.into(),
            new_symbol: new_symbol.into(),
        }
    }

    pub fn kind(&self) -> PatchKind {
        self.kind
    }

    pub fn old_symbol(&self) -> &str {
        &self.old_symbol
    }

    pub fn new_symbol(&self) -> &str {
        &self.new_symbol
    }

    /// Apply this patch to the running process.
    pub fn apply(&self) -> Result<(), DpatchError> {
        match self.kind {
            PatchKind::ReplaceFunctionInternal => self.apply_replace_function_internal(),
            PatchKind::Nop => Ok(()),
        }
    }

    fn apply_replace_function_internal(&self) -> Result<(), DpatchError> {
        let from = symbol::resolve(&self.old_symbol)?;
        let to = symbol::resolve(&self.new_symbol)?;

        let mut code = MachineCode::new()?;
        append_long_jump(&mut code, to)?;

        // SAFETY: `from` was just resolved to a live, named function
        // symbol in this process's own image; the 14-byte long jump fits
        // in any function large enough to have a real prologue, per this
        // engine's documented assumption that patch targets are function
        // entry points (Non-goal: verifying the prologue).
        unsafe {
            code.write_to(from as *mut u8)?;
        }
        Ok(())
    }
}
