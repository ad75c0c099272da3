//! `dpatch` — a runtime dynamic-patching engine.
//!
//! `dpatch` is injected into a target process as an auditing collaborator
//! of the dynamic loader (Linux `rtld-audit(7)`). Once loaded, it installs
//! a signal handler and a dedicated apply worker; delivering `PATCH_SIGNAL`
//! (`SIGUSR1`) to the target asks the worker to read a patch script from
//! disk and rewrite the target's executable text in place, redirecting
//! calls from one resident function to another.
//!
//! The crate is built as both a `cdylib` (the `.so` the loader's
//! `LD_AUDIT` mechanism dlopens, exporting [`audit::la_version`] and
//! [`audit::la_preinit`]) and an ordinary library, so its components are
//! independently unit-testable.
//!
//! # Platform prerequisites
//!
//! This engine assumes a flat address space (casting a resolved symbol's
//! data pointer to an instruction pointer) and x86-64 as the only target
//! architecture for code generation. It does not verify that a patched
//! address is actually a function prologue, and it does not make any
//! attempt at thread safety of the target's own code while a patch is
//! being applied — the operator is expected to quiesce the target or
//! accept the risk.

pub mod audit;
pub mod code_generator;
pub mod config;
pub mod machine_code;
pub mod memory_protect;
pub mod patch;
pub mod patch_script;
pub mod patch_set;
pub mod status;
pub mod symbol;

pub use patch::{Patch, PatchKind};
pub use patch_script::PatchScript;
pub use patch_set::PatchSet;
pub use status::{DpatchError, Status};
