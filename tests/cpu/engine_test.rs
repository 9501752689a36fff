/*!
 * Engine Tests
 * Instruction semantics and dispatch-loop behavior against a bare CPU state
 */

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;
use vcpu_kernel::cpu::{CpuState, Engine, Exit, Program, Register};
use vcpu_kernel::{MemorySink, NullSink, PreemptionFlag, TraceEvent};

fn r(index: u8) -> Register {
    Register::new(index).unwrap()
}

fn run(source: &str) -> (CpuState, Exit) {
    let program: Program = source.parse().unwrap();
    let mut cpu = CpuState::new();
    let report = Engine::new(0, Arc::new(NullSink)).run(&mut cpu, &program, &PreemptionFlag::new());
    (cpu, report.exit)
}

#[test]
fn test_reference_program() {
    let (cpu, exit) = run("LOAD R0, 10\nLOAD R1, 20\nADD R2, R0, R1\nPUSH R2\nPOP R3\nHALT");

    assert_eq!(exit, Exit::Halted);
    assert_eq!(cpu.register(r(2)), 30);
    assert_eq!(cpu.register(r(3)), 30);
    assert_eq!(cpu.sp(), CpuState::INITIAL_SP);
    assert_eq!(cpu.pc(), 6);
}

#[test]
fn test_two_operand_arithmetic_accumulates() {
    let (cpu, _) = run("LOAD R0, 7\nLOAD R1, 3\nADD R0, R1\nMUL R0, R1\nSUB R0, R1\nHALT");
    // ((7 + 3) * 3) - 3
    assert_eq!(cpu.register(r(0)), 27);
    assert_eq!(cpu.register(r(1)), 3);
}

#[test]
fn test_demo_workloads() {
    let (cpu, _) = run("LOAD R0, 50\nLOAD R1, 5\nSUB R2, R0, R1\nHALT");
    assert_eq!(cpu.register(r(2)), 45);

    let (cpu, _) = run("LOAD R0, 100\nLOAD R1, 4\nMUL R2, R0, R1\nHALT");
    assert_eq!(cpu.register(r(2)), 400);
}

#[test]
fn test_halt_stops_before_trailing_instructions() {
    let (cpu, exit) = run("LOAD R0, 1\nHALT\nLOAD R0, 2");
    assert_eq!(exit, Exit::Halted);
    assert_eq!(cpu.register(r(0)), 1);
    assert_eq!(cpu.pc(), 2);
}

#[test]
fn test_faults_are_traced_and_execution_continues() {
    let sink = Arc::new(MemorySink::new());
    let program: Program = "POP R0\nFOO R1\nLOAD R1, 2\nHALT".parse().unwrap();
    let mut cpu = CpuState::new();
    let report = Engine::new(4, sink.clone()).run(&mut cpu, &program, &PreemptionFlag::new());

    assert_eq!(report.exit, Exit::Halted);
    assert_eq!(report.stack_underflows, 1);
    assert_eq!(report.unknown_opcodes, 1);
    assert_eq!(cpu.register(r(1)), 2);

    let events = sink.events();
    assert!(events.contains(&TraceEvent::StackUnderflow { task: 4, pc: 0 }));
    assert!(events.contains(&TraceEvent::UnknownOpcode {
        task: 4,
        pc: 1,
        text: "FOO R1".to_string(),
    }));
}

proptest! {
    #[test]
    fn prop_push_then_pop_copies_value(value in any::<i32>(), src in 0u8..8, dst in 0u8..8) {
        let source = format!("LOAD R{src}, {value}\nPUSH R{src}\nPOP R{dst}\nHALT");
        let (cpu, exit) = run(&source);
        prop_assert_eq!(exit, Exit::Halted);
        prop_assert_eq!(cpu.register(r(dst)), value);
        prop_assert_eq!(cpu.sp(), CpuState::INITIAL_SP);
    }

    #[test]
    fn prop_three_operand_add_matches_wrapping_add(a in any::<i32>(), b in any::<i32>()) {
        let source = format!("LOAD R0, {a}\nLOAD R1, {b}\nADD R2, R0, R1\nHALT");
        let (cpu, _) = run(&source);
        prop_assert_eq!(cpu.register(r(2)), a.wrapping_add(b));
    }
}
