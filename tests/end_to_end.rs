//! End-to-end scenarios: build real resident symbols in this test binary,
//! drive them through `dpatch`'s public API exactly as the apply worker
//! would, and observe the target process's behavior change (or not)
//! afterward.

use dpatch::{DpatchError, PatchKind, PatchScript, PatchSet, Status};
use std::io::Write;

#[inline(never)]
#[no_mangle]
pub extern "C" fn dpatch_e2e_alpha() -> &'static str {
    "A"
}

#[inline(never)]
#[no_mangle]
pub extern "C" fn dpatch_e2e_bravo() -> &'static str {
    "B"
}

fn temp_script(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

/// Replacing a function internally redirects subsequent calls to the new
/// symbol.
#[test]
fn replace_internal_happy_path() {
    let _ = env_logger::try_init();
    assert_eq!(dpatch_e2e_alpha(), "A");

    let script = temp_script("REPLACE_FUNCTION_INTERNAL dpatch_e2e_alpha dpatch_e2e_bravo\n");
    let set = PatchScript::new(script.path()).parse().expect("script should parse");
    set.apply().expect("patch should apply");

    assert_eq!(dpatch_e2e_alpha(), "B");
}

/// Poisoning a function via UD2 validates the write path independently
/// of symbol resolution. We don't actually execute the poisoned function
/// (that would crash the test process); instead we confirm the exact
/// bytes landed at the target address.
#[test]
fn poison_function_writes_ud2() {
    use dpatch::machine_code::MachineCode;

    #[inline(never)]
    #[no_mangle]
    extern "C" fn dpatch_e2e_poison_target() -> i32 {
        7
    }

    let mut code = MachineCode::new().unwrap();
    dpatch::code_generator::append_undefined_opcode(&mut code).unwrap();

    let target_ptr = dpatch_e2e_poison_target as *const () as *mut u8;
    unsafe {
        code.write_to(target_ptr).expect("write_to should succeed");
        let written = std::slice::from_raw_parts(target_ptr, 2);
        assert_eq!(written, &[0x0f, 0x0b]);
    }
}

/// A two-token line is a syntax error; no mutation occurs and the
/// original symbol keeps its behavior.
#[test]
fn syntax_error_leaves_target_untouched() {
    #[inline(never)]
    #[no_mangle]
    extern "C" fn dpatch_e2e_syntax_target() -> &'static str {
        "A"
    }

    let script = temp_script("REPLACE_FUNCTION_INTERNAL dpatch_e2e_syntax_target\n");
    let err = PatchScript::new(script.path()).parse().unwrap_err();
    assert_eq!(err.status(), Status::Syntax);
    assert_eq!(dpatch_e2e_syntax_target(), "A");
}

/// An unrecognized operation token is reported distinctly from a
/// malformed line, and causes no mutation.
#[test]
fn unknown_operation_causes_no_mutation() {
    #[inline(never)]
    #[no_mangle]
    extern "C" fn dpatch_e2e_unknown_target() -> &'static str {
        "A"
    }

    let script = temp_script("DELETE_UNIVERSE dpatch_e2e_unknown_target dpatch_e2e_bravo\n");
    let err = PatchScript::new(script.path()).parse().unwrap_err();
    assert_eq!(err.status(), Status::Unknown);
    assert_eq!(dpatch_e2e_unknown_target(), "A");
}

/// A missing symbol is reported as `Dyn`, and the first (valid) symbol
/// is left unpatched — there is no partial rewrite.
#[test]
fn missing_symbol_yields_no_partial_rewrite() {
    #[inline(never)]
    #[no_mangle]
    extern "C" fn dpatch_e2e_missing_target() -> &'static str {
        "A"
    }

    let mut set = PatchSet::new();
    set.add(
        PatchKind::ReplaceFunctionInternal,
        "dpatch_e2e_missing_target",
        "dpatch_e2e_this_symbol_does_not_exist",
    )
    .unwrap();

    let err = set.apply().unwrap_err();
    assert_eq!(err.status(), Status::Dyn);
    assert_eq!(dpatch_e2e_missing_target(), "A");
}

/// A patch set containing a failing patch does not roll back any
/// already-applied patch ahead of it; partial application is observable
/// and permitted by contract.
#[test]
fn partial_application_is_observable_and_not_rolled_back() {
    let _ = env_logger::try_init();
    #[inline(never)]
    #[no_mangle]
    extern "C" fn dpatch_e2e_partial_alpha() -> &'static str {
        "A"
    }
    #[inline(never)]
    #[no_mangle]
    extern "C" fn dpatch_e2e_partial_bravo() -> &'static str {
        "B"
    }

    assert_eq!(dpatch_e2e_partial_alpha(), "A");

    let mut set = PatchSet::new();
    set.add(
        PatchKind::ReplaceFunctionInternal,
        "dpatch_e2e_partial_alpha",
        "dpatch_e2e_partial_bravo",
    )
    .unwrap();
    set.add(
        PatchKind::ReplaceFunctionInternal,
        "dpatch_e2e_partial_bravo",
        "dpatch_e2e_nonexistent",
    )
    .unwrap();

    let err = set.apply().unwrap_err();
    assert_eq!(err.status(), Status::Dyn);

    // The first patch was already committed: this is the contract, not a bug.
    assert_eq!(dpatch_e2e_partial_alpha(), "B");
}

/// Signal coalescing is exercised at the `audit` module level in
/// `src/audit.rs`'s own unit tests, since it only concerns the
/// process-wide pending flag, not the patch pipeline itself.
#[test]
fn reexported_error_type_matches_status_contract() {
    let err: DpatchError = PatchScript::new("/does/not/exist").parse().unwrap_err();
    assert_eq!(err.status(), Status::File);
}
