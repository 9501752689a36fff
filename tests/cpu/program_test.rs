/*!
 * Program Loading Tests
 * Text and file loaders, operand validation policy
 */

use pretty_assertions::assert_eq;
use std::io::Write;
use vcpu_kernel::cpu::{Instruction, Program};
use vcpu_kernel::ProgramError;

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "; doubles R0").unwrap();
    writeln!(file, "LOAD R0, 21").unwrap();
    writeln!(file, "ADD R0, R0").unwrap();
    writeln!(file, "HALT").unwrap();

    let program = Program::from_file(file.path()).unwrap();
    assert_eq!(program.len(), 3);
    assert_eq!(program.get(2), Some(&Instruction::Halt));
}

#[test]
fn test_from_file_reports_bad_line() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "LOAD R0, 1").unwrap();
    writeln!(file, "MUL R0").unwrap();

    let err = Program::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ProgramError::OperandCount { line: 2, found: 1, .. }));
}

#[test]
fn test_missing_operands_rejected_at_build_time() {
    for source in ["PUSH", "POP", "LOAD R1", "ADD R0", "SUB", "MUL R1, R2, R3, R4"] {
        assert!(
            source.parse::<Program>().is_err(),
            "expected '{}' to be rejected",
            source
        );
    }
}

#[test]
fn test_unknown_mnemonic_survives_decoding() {
    let program: Program = "JMP 0\nHALT".parse().unwrap();
    assert_eq!(program.len(), 2);
    assert!(matches!(program.get(0), Some(Instruction::Unknown(_))));
}

#[test]
fn test_program_without_halt_is_detectable() {
    let program: Program = "LOAD R0, 1".parse().unwrap();
    assert!(!program.halts());
}
