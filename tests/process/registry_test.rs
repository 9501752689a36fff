/*!
 * Task Registry Tests
 * Admission, capacity and initial CPU state
 */

use pretty_assertions::assert_eq;
use std::sync::Arc;
use vcpu_kernel::core::limits::{MAX_TASKS, NUM_REGISTERS, STACK_SIZE};
use vcpu_kernel::{AdmissionError, Program, TaskRegistry, TaskState};

fn program(source: &str) -> Arc<Program> {
    Arc::new(source.parse().unwrap())
}

#[test]
fn test_new_tasks_start_zeroed() {
    let mut registry = TaskRegistry::new();
    for priority in [3, 1, 2] {
        registry.admit(priority, program("HALT")).unwrap();
    }

    for task in registry.iter() {
        let cpu = task.cpu().unwrap();
        assert_eq!(cpu.registers(), &[0; NUM_REGISTERS]);
        assert_eq!(cpu.sp(), STACK_SIZE as isize - 1);
        assert_eq!(cpu.pc(), 0);
        assert!(!task.is_completed());
        assert_eq!(task.state(), TaskState::Admitted);
    }
}

#[test]
fn test_sixth_task_rejected_without_side_effects() {
    let mut registry = TaskRegistry::new();
    assert_eq!(registry.capacity(), MAX_TASKS);

    let handles: Vec<_> = (0..5)
        .map(|p| registry.admit(p, program("LOAD R0, 1\nHALT")).unwrap())
        .collect();
    let before: Vec<_> = registry.iter().map(|t| t.info()).collect();

    let err = registry.admit(99, program("HALT")).unwrap_err();
    assert_eq!(err, AdmissionError::AdmissionRejected { capacity: 5 });

    let after: Vec<_> = registry.iter().map(|t| t.info()).collect();
    assert_eq!(before, after);
    assert_eq!(registry.len(), 5);
    assert!(registry.is_full());
    assert_eq!(
        handles.iter().map(|h| h.id()).collect::<Vec<_>>(),
        vec![0, 1, 2, 3, 4]
    );
}

#[test]
fn test_iteration_is_admission_order() {
    let mut registry = TaskRegistry::with_capacity(3);
    for priority in [1, 10, 5] {
        registry.admit(priority, program("HALT")).unwrap();
    }
    let order: Vec<_> = registry.iter().map(|t| (t.id(), t.priority())).collect();
    assert_eq!(order, vec![(0, 1), (1, 10), (2, 5)]);
}
