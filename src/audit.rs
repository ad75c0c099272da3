//! ELF audit-interface entry points and the signal-driven apply loop.
//!
//! `dpatch` is loaded as an `LD_AUDIT` collaborator of the dynamic linker.
//! [`la_version`] negotiates the audit ABI; [`la_preinit`] runs before the
//! target's own entry point and installs the signal handler plus the
//! apply worker's `IDLE`/`APPLY` state machine.

use crate::config;
use crate::patch_script::PatchScript;
use crate::status::DpatchError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// The signal an operator delivers to request one patch application.
pub const PATCH_SIGNAL: libc::c_int = libc::SIGUSR1;

/// How long the apply worker sleeps between checks of the pending flag
/// while `IDLE`. Exact cadence is not an observable contract — only that
/// the worker does not busy-wait.
const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Process-wide flag set by the signal handler, cleared by the apply
/// worker. This is the sole channel from asynchronous signal context into
/// the apply worker; `Release`/`Acquire` ordering gives it the visibility
/// guarantee a plain variable would not have.
static PENDING_PATCH: AtomicBool = AtomicBool::new(false);

/// Negotiate the audit ABI version with the dynamic linker.
///
/// Returns the version this engine was built against. A version mismatch
/// is treated as fatal here: it is logged and the process is terminated
/// with failure, rather than merely disabling this auditor (as the wider
/// `rtld-audit(7)` convention of returning `0` would do) — a patch engine
/// the loader silently drops is worse than one that fails loudly.
///
/// # Safety
///
/// Called by the dynamic linker before any of the target's own code runs;
/// must not be called directly by application code.
#[no_mangle]
pub unsafe extern "C" fn la_version(version: u32) -> u32 {
    if version != config::EXPECTED_AUDIT_VERSION {
        log::error!(
            "audit ABI mismatch: host offered version {version}, dpatch was built against {}",
            config::EXPECTED_AUDIT_VERSION
        );
        std::process::exit(1);
    }
    config::EXPECTED_AUDIT_VERSION
}

/// Pre-initialization hook, invoked before the target's entry point runs.
///
/// Installs the `PATCH_SIGNAL` handler and spawns the apply worker. `cookie`
/// is the loader-supplied link-map cookie; this engine does not use it.
///
/// # Safety
///
/// Called by the dynamic linker exactly once, before the target's entry
/// point; must not be called directly by application code.
#[no_mangle]
pub unsafe extern "C" fn la_preinit(_cookie: usize) {
    if let Err(err) = install_signal_handler() {
        log::error!("failed to install PATCH_SIGNAL handler: {err}");
        std::process::exit(1);
    }
    spawn_apply_worker();
}

/// Install the async-signal-safe handler for [`PATCH_SIGNAL`].
fn install_signal_handler() -> Result<(), DpatchError> {
    // SAFETY: installing a signal handler as documented; `handle_patch_signal`
    // only performs async-signal-safe work.
    unsafe {
        let action = libc::sigaction {
            sa_sigaction: handle_patch_signal as usize,
            sa_flags: libc::SA_RESTART,
            ..std::mem::zeroed()
        };

        if libc::sigaction(PATCH_SIGNAL, &action, std::ptr::null_mut()) != 0 {
            return Err(DpatchError::Other(
                "sigaction() failed to install the PATCH_SIGNAL handler".into(),
            ));
        }
    }
    Ok(())
}

/// The `PATCH_SIGNAL` handler.
///
/// Performs only async-signal-safe work: confirms the signal number and
/// sets the pending-patch flag. It must not allocate, parse, or log — all
/// non-reentrant work happens in the apply worker. If the underlying log
/// sink is ever proven signal-safe on the target platform, a diagnostic
/// line could be added here; until then, dropping it is the safer default.
extern "C" fn handle_patch_signal(signum: libc::c_int) {
    if signum == PATCH_SIGNAL {
        PENDING_PATCH.store(true, Ordering::Release);
    }
}

/// Spawn the single cooperative apply worker thread.
fn spawn_apply_worker() {
    std::thread::spawn(apply_worker_loop);
}

/// The apply worker's `IDLE`/`APPLY` state machine.
fn apply_worker_loop() {
    loop {
        std::thread::sleep(IDLE_POLL_INTERVAL);
        if PENDING_PATCH.swap(false, Ordering::Acquire) {
            run_apply_cycle();
        }
    }
}

/// One `APPLY` transition: parse the configured script into a fresh patch
/// set and apply it. Failures are logged and the worker returns to
/// `IDLE` — the next signal triggers a fresh attempt, since the pending
/// flag was already cleared before this cycle began.
fn run_apply_cycle() {
    let script = PatchScript::new(config::script_path());
    match script.parse() {
        Ok(set) => {
            log::debug!("applying {} patch(es) from {:?}", set.len(), script.path());
            if let Err(err) = set.apply() {
                log::error!("patch application failed: {err}");
            }
        }
        Err(err) => {
            log::error!("failed to parse patch script {:?}: {err}", script.path());
        }
    }
}
