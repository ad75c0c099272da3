//! x86-64 machine-code emission.
//!
//! Both emitters here are pure with respect to the [`MachineCode`] buffer
//! they append to: they never allocate outside the buffer's own growth,
//! and cannot fail except by propagating a buffer-growth failure.

use crate::machine_code::MachineCode;
use crate::status::DpatchError;

/// Append `0F 0B` (`UD2`) to `code`.
///
/// `UD2` is architecturally guaranteed to raise an illegal-instruction
/// exception when executed; this is used to "poison" a function so that
/// calling it traps instead of running its original body.
pub fn append_undefined_opcode(code: &mut MachineCode) -> Result<(), DpatchError> {
    code.append_bytes(&[0x0f, 0x0b])
}

/// Append a 14-byte absolute indirect jump to `target` onto `code`:
///
/// ```text
/// FF 25 00 00 00 00        ; JMP [RIP+0]
/// <addr bytes 0..7>        ; 64-bit target, little-endian
/// ```
///
/// The displacement is always zero because the target pointer is stored
/// immediately after the instruction, at `RIP` as it stands right after
/// the 6-byte `JMP` opcode.
pub fn append_long_jump(code: &mut MachineCode, target: *const ()) -> Result<(), DpatchError> {
    const LJMP_OPCODE: u8 = 0xff;
    const LJMP_MODRM_EXTENSION: u8 = 0x1 << 5;
    const MODRM_RIP_RELATIVE: u8 = 0x5;

    let addr = target as u64;
    let mut bytes = [0u8; 14];
    bytes[0] = LJMP_OPCODE;
    bytes[1] = LJMP_MODRM_EXTENSION | MODRM_RIP_RELATIVE;
    // bytes[2..6] are the zero RIP displacement; already zeroed.
    bytes[6..14].copy_from_slice(&addr.to_le_bytes());

    code.append_bytes(&bytes)
}
