//! A growable buffer representing a block of executable binary code.
//!
//! `MachineCode` is an amortized-doubling, contiguous byte buffer that can
//! be emitted into and then copied over live process memory with
//! [`MachineCode::write_to`].

use crate::memory_protect::{protect_range, ProtMode};
use crate::status::DpatchError;

const DEFAULT_CAPACITY: usize = 8;

/// A growable sequence of bytes representing an instruction stream.
pub struct MachineCode {
    bytes: Vec<u8>,
}

impl MachineCode {
    /// Create an empty buffer with initial capacity 8.
    pub fn new() -> Result<Self, DpatchError> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(DEFAULT_CAPACITY)
            .map_err(|_| DpatchError::NoMem)?;
        Ok(MachineCode { bytes })
    }

    /// Current byte count.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if no bytes have been appended yet.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The buffer's contents, in append order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Append a single byte, growing the backing storage if necessary.
    pub fn append_byte(&mut self, byte: u8) -> Result<(), DpatchError> {
        if self.bytes.len() == self.bytes.capacity() {
            let new_cap = (self.bytes.capacity() * 2).max(DEFAULT_CAPACITY);
            let additional = new_cap - self.bytes.capacity();
            self.bytes
                .try_reserve_exact(additional)
                .map_err(|_| DpatchError::NoMem)?;
        }
        self.bytes.push(byte);
        Ok(())
    }

    /// Append a slice of bytes, in order, equivalent to calling
    /// [`MachineCode::append_byte`] once per element.
    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<(), DpatchError> {
        for &byte in bytes {
            self.append_byte(byte)?;
        }
        Ok(())
    }

    /// Copy the entire buffer to `address` in the current process.
    ///
    /// The destination is made writable for the duration of the copy and
    /// restored to read+execute (write disabled) before returning. On
    /// successful return, `self.len()` bytes starting at `address` equal
    /// this buffer's contents.
    ///
    /// # Safety
    ///
    /// `address` must reference `self.len()` bytes of memory belonging to
    /// a loaded code segment of the current process; overwriting the
    /// wrong address corrupts the running program.
    pub unsafe fn write_to(&self, address: *mut u8) -> Result<(), DpatchError> {
        let addr = address as usize;
        let len = self.len();

        // SAFETY: caller guarantees `address` is valid process memory for
        // `len` bytes; widening protection to writable is reverted below
        // whether the copy below succeeds or not reaching that point would
        // already be a caller contract violation.
        unsafe {
            protect_range(addr, len, ProtMode::READ_WRITE_EXEC)?;
        }

        // SAFETY: `address` is now writable for `len` bytes per the
        // protect_range call above; `self.bytes` is a valid, `len`-byte
        // source the caller does not alias with `address` (it owns a
        // freshly-built buffer).
        unsafe {
            std::ptr::copy_nonoverlapping(self.bytes.as_ptr(), address, len);
        }

        // SAFETY: same region, now being restored to its execute-only form.
        unsafe {
            protect_range(addr, len, ProtMode::READ_EXEC)?;
        }

        clear_instruction_cache(address, len);
        Ok(())
    }
}

/// Flush the instruction cache for `[addr, addr+len)` so the CPU observes
/// the freshly-written bytes rather than stale fetched instructions.
fn clear_instruction_cache(addr: *mut u8, len: usize) {
    #[cfg(target_arch = "x86_64")]
    {
        // x86-64 maintains instruction/data cache coherency in hardware;
        // no explicit flush instruction is required, but a serializing
        // instruction ensures any speculatively fetched stale bytes are
        // discarded on this core.
        let _ = (addr, len);
        std::sync::atomic::fence(std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_read_preserves_order_and_length() {
        let mut code = MachineCode::new().unwrap();
        code.append_byte(0xaa).unwrap();
        code.append_bytes(&[0xbb, 0xcc, 0xdd]).unwrap();
        assert_eq!(code.len(), 4);
        assert_eq!(code.as_bytes(), &[0xaa, 0xbb, 0xcc, 0xdd]);
    }

    #[test]
    fn growth_preserves_contents_past_initial_capacity() {
        let mut code = MachineCode::new().unwrap();
        let input: Vec<u8> = (0..64).collect();
        for &b in &input {
            code.append_byte(b).unwrap();
        }
        assert_eq!(code.len(), 64);
        assert_eq!(code.as_bytes(), input.as_slice());
    }

    #[test]
    fn write_to_copies_bytes_and_leaves_region_executable_not_writable() {
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize };
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                page_size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        assert_ne!(ptr, libc::MAP_FAILED);

        let mut code = MachineCode::new().unwrap();
        code.append_bytes(&[0x0f, 0x0b]).unwrap();

        unsafe {
            code.write_to(ptr as *mut u8).unwrap();
            let written = std::slice::from_raw_parts(ptr as *const u8, 2);
            assert_eq!(written, &[0x0f, 0x0b]);
            libc::munmap(ptr, page_size);
        }
    }
}
