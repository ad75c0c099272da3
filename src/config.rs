//! Configuration points for the patching engine.
//!
//! The patch-script path and the expected audit ABI version are named
//! constants here; the script path may additionally be overridden by the
//! `DPATCH_SCRIPT_PATH` environment variable, read once at worker start so
//! integration tests can point the engine at a fixture without recompiling.

use std::path::PathBuf;

/// Default patch-script path, used when `DPATCH_SCRIPT_PATH` is unset.
pub const DEFAULT_SCRIPT_PATH: &str = "./test.patch";

/// The `rtld-audit(7)` ABI version this engine is built against
/// (glibc's `LAV_CURRENT`).
pub const EXPECTED_AUDIT_VERSION: u32 = 1;

/// The environment variable used to override [`DEFAULT_SCRIPT_PATH`].
pub const SCRIPT_PATH_ENV_VAR: &str = "DPATCH_SCRIPT_PATH";

/// Resolve the patch-script path for this run: `DPATCH_SCRIPT_PATH` if
/// set, otherwise [`DEFAULT_SCRIPT_PATH`].
pub fn script_path() -> PathBuf {
    std::env::var_os(SCRIPT_PATH_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRIPT_PATH))
}
