//! An ordered batch of patches.

use crate::patch::{Patch, PatchKind};
use crate::status::DpatchError;

/// An ordered collection of patches. Insertion order is preserved; no
/// deduplication is performed. `Vec`'s amortized-doubling growth gives the
/// required capacity policy for free.
#[derive(Debug, Default)]
pub struct PatchSet {
    patches: Vec<Patch>,
}

impl PatchSet {
    /// Create an empty patch set.
    pub fn new() -> Self {
        PatchSet {
            patches: Vec::with_capacity(8),
        }
    }

    /// Number of patches currently in the set.
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Append a patch to the set, preserving insertion order. Grows the
    /// backing storage (doubling) if the set is at capacity; fails with
    /// `Status::NoMem` rather than aborting if that growth cannot be
    /// satisfied.
    pub fn add(
        &mut self,
        kind: PatchKind,
        old: impl Into<String>,
        new: impl Into<String>,
    ) -> Result<(), DpatchError> {
        if self.patches.len() == self.patches.capacity() {
            let additional = self.patches.capacity().max(1);
            self.patches
                .try_reserve(additional)
                .map_err(|_| DpatchError::NoMem)?;
        }
        self.patches.push(Patch::new(kind, old, new));
        Ok(())
    }

    /// Patches in insertion order, for inspection (e.g. in tests).
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// Apply every patch in insertion order. The first non-success result
    /// short-circuits the remaining patches: already-applied patches are
    /// **not** rolled back, and this is an explicit contract, not an
    /// oversight. An empty set applies successfully and is a no-op.
    pub fn apply(&self) -> Result<(), DpatchError> {
        for patch in &self.patches {
            patch.apply()?;
        }
        Ok(())
    }
}
