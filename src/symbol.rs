//! Resolves symbol names to live addresses in the running process image.

use crate::status::DpatchError;
use std::ffi::CString;
use std::sync::OnceLock;

struct ProcessHandle(*mut libc::c_void);

// SAFETY: the handle returned by `dlopen(NULL, ...)` refers to the whole
// process image and its loaded dependencies; it is valid for the lifetime
// of the process and `dlsym` on it is safe to call from any thread.
unsafe impl Send for ProcessHandle {}
unsafe impl Sync for ProcessHandle {}

static PROCESS_HANDLE: OnceLock<ProcessHandle> = OnceLock::new();

fn process_handle() -> Result<*mut libc::c_void, DpatchError> {
    if let Some(handle) = PROCESS_HANDLE.get() {
        return Ok(handle.0);
    }
    // SAFETY: `dlopen(NULL, RTLD_LAZY)` is always safe to call; it returns
    // a handle to the running executable's own global symbol scope.
    let raw = unsafe { libc::dlopen(std::ptr::null(), libc::RTLD_LAZY) };
    if raw.is_null() {
        return Err(DpatchError::Other(
            "dlopen(NULL, RTLD_LAZY) failed to obtain a handle on the running process".into(),
        ));
    }
    let handle = PROCESS_HANDLE.get_or_init(|| ProcessHandle(raw));
    Ok(handle.0)
}

/// Resolve `name` to its address among the named public symbols of the
/// running image and its dependencies. The first match wins, following
/// the platform's default dynamic-linker scoping rule; no demangling and
/// no weak/strong disambiguation is performed.
pub fn resolve(name: &str) -> Result<*const (), DpatchError> {
    let handle = process_handle()?;
    let c_name = CString::new(name).map_err(|_| DpatchError::SymbolNotFound {
        name: name.to_string(),
    })?;

    // SAFETY: `handle` is a valid handle from `dlopen`; `c_name` is a
    // valid, NUL-terminated C string for the duration of this call.
    let addr = unsafe { libc::dlsym(handle, c_name.as_ptr()) };
    if addr.is_null() {
        return Err(DpatchError::SymbolNotFound {
            name: name.to_string(),
        });
    }
    // Casting a data pointer to a function/instruction pointer assumes a
    // flat address space; this is an explicit platform prerequisite, not
    // portable to architectures with separate code/data address spaces.
    Ok(addr as *const ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[inline(never)]
    #[no_mangle]
    pub extern "C" fn dpatch_symbol_resolver_probe() -> i32 {
        42
    }

    #[test]
    fn resolves_a_known_symbol() {
        let addr = resolve("dpatch_symbol_resolver_probe").expect("symbol should resolve");
        let f: extern "C" fn() -> i32 = unsafe { std::mem::transmute(addr) };
        assert_eq!(f(), 42);
    }

    #[test]
    fn missing_symbol_is_reported_as_dyn() {
        let err = resolve("dpatch_this_symbol_does_not_exist_anywhere").unwrap_err();
        assert_eq!(err.status(), crate::status::Status::Dyn);
    }
}
