//! Page-aligned memory-protection shim over `mprotect`.
//!
//! `mprotect` requires a page-aligned start address and a whole-page
//! extent. Callers of [`protect_range`] may request an arbitrary
//! byte range; this module rounds it down/up to satisfy the kernel.

use crate::status::DpatchError;
use std::sync::OnceLock;

/// Protection mode requested for a range of memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtMode {
    pub read: bool,
    pub write: bool,
    pub exec: bool,
}

impl ProtMode {
    pub const READ_WRITE_EXEC: ProtMode = ProtMode {
        read: true,
        write: true,
        exec: true,
    };

    pub const READ_EXEC: ProtMode = ProtMode {
        read: true,
        write: false,
        exec: true,
    };

    fn bits(self) -> libc::c_int {
        let mut bits = 0;
        if self.read {
            bits |= libc::PROT_READ;
        }
        if self.write {
            bits |= libc::PROT_WRITE;
        }
        if self.exec {
            bits |= libc::PROT_EXEC;
        }
        bits
    }
}

static PAGE_SIZE: OnceLock<usize> = OnceLock::new();

fn page_size() -> Result<usize, DpatchError> {
    if let Some(&cached) = PAGE_SIZE.get() {
        return Ok(cached);
    }
    // SAFETY: sysconf(_SC_PAGESIZE) takes no pointers and has no preconditions.
    let raw = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if raw <= 0 {
        return Err(DpatchError::PageSizeUnavailable);
    }
    let size = raw as usize;
    Ok(*PAGE_SIZE.get_or_init(|| size))
}

/// Change the page protection of `[addr, addr+len)` to `mode`.
///
/// `addr` and `len` are rounded outward to whole pages before the
/// underlying `mprotect` call, as `mprotect` requires page-aligned,
/// whole-page arguments. Protection of bytes outside `[addr, addr+len)`
/// but inside the rounded range is a side effect of the platform
/// primitive, never an intentional part of this shim's contract.
///
/// # Safety
///
/// `addr` must reference memory mapped into this process for at least
/// `len` bytes; relaxing protections on memory not legally owned by the
/// caller is undefined behavior at the OS level, not merely a logic bug.
pub unsafe fn protect_range(addr: usize, len: usize, mode: ProtMode) -> Result<(), DpatchError> {
    let page_size = page_size()?;
    let delta = addr % page_size;
    let rounded_addr = addr - delta;
    let rounded_len = len + delta;

    // SAFETY: caller guarantees `addr..addr+len` is valid process memory;
    // widening to page boundaries only ever grows the affected region.
    let result = unsafe {
        libc::mprotect(
            rounded_addr as *mut libc::c_void,
            rounded_len,
            mode.bits(),
        )
    };
    if result != 0 {
        return Err(DpatchError::MProt { addr, len });
    }
    Ok(())
}
