/*!
 * Round-Robin Scheduler
 *
 * Sweeps the task registry in admission order. Each incomplete task gets
 * its own execution context on the blocking pool, runs for one wall-clock
 * slice, is asked to stop through its preemption flag, and is joined
 * before its CPU state is looked at again. Sweeps repeat until none is
 * left incomplete.
 *
 * One context is alive at a time: the scheduler awaits each join before
 * spawning the next. The stored task priority never affects ordering.
 */

mod atomic_stats;
mod builder;
pub mod config;
pub mod types;

pub use atomic_stats::AtomicSchedulerStats;
pub use builder::SchedulerBuilder;
pub use config::SchedulerConfig;
pub use types::{RunSummary, SchedulerStats, TimeSlice};

use crate::core::errors::{AdmissionError, KernelError};
use crate::core::types::{KernelResult, Priority};
use crate::cpu::{Engine, Exit, Program};
use crate::monitoring::{TraceEvent, TraceSink, TracingSink};
use crate::process::{Task, TaskHandle, TaskRegistry};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Round-robin dispatcher; sole owner of the task registry
pub struct Scheduler {
    registry: TaskRegistry,
    config: SchedulerConfig,
    sink: Arc<dyn TraceSink>,
    stats: Arc<AtomicSchedulerStats>,
}

impl Scheduler {
    /// Scheduler with default configuration, tracing to `tracing`
    pub fn new() -> Self {
        Self::from_parts(SchedulerConfig::default(), Arc::new(TracingSink))
    }

    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    pub(crate) fn from_parts(config: SchedulerConfig, sink: Arc<dyn TraceSink>) -> Self {
        info!(
            capacity = config.capacity,
            slice_micros = config.time_slice.as_micros(),
            "Scheduler initialized: policy=round_robin"
        );

        Self {
            registry: TaskRegistry::with_capacity(config.capacity),
            stats: Arc::new(AtomicSchedulerStats::new(config.time_slice.as_micros())),
            config,
            sink,
        }
    }

    /// Admit a task running `program`
    pub fn admit(
        &mut self,
        priority: Priority,
        program: Arc<Program>,
    ) -> Result<TaskHandle, AdmissionError> {
        let instructions = program.len();
        let halts = program.halts();
        match self.registry.admit(priority, program) {
            Ok(handle) => {
                self.sink.record(&TraceEvent::TaskAdmitted {
                    task: handle.id(),
                    priority,
                    instructions,
                });
                if !halts {
                    warn!(
                        task = handle.id(),
                        "Program has no HALT; it will stop by running past its last instruction"
                    );
                }
                Ok(handle)
            }
            Err(err) => {
                self.sink.record(&TraceEvent::AdmissionRejected {
                    capacity: self.registry.capacity(),
                });
                Err(err)
            }
        }
    }

    /// Admit programs in order until the registry is full
    ///
    /// Rejected programs are logged and skipped, so the tasks already
    /// admitted still get scheduled.
    pub fn admit_all<I>(&mut self, programs: I) -> Vec<TaskHandle>
    where
        I: IntoIterator<Item = (Priority, Arc<Program>)>,
    {
        let mut admitted = Vec::new();
        let mut rejected = 0usize;
        for (priority, program) in programs {
            match self.admit(priority, program) {
                Ok(handle) => admitted.push(handle),
                Err(_) => rejected += 1,
            }
        }
        if rejected > 0 {
            warn!(
                admitted = admitted.len(),
                rejected,
                capacity = self.registry.capacity(),
                "Task queue full, extra programs dropped"
            );
        }
        admitted
    }

    /// Decode `source` and admit it
    pub fn admit_source(&mut self, priority: Priority, source: &str) -> KernelResult<TaskHandle> {
        let program: Program = source.parse()?;
        Ok(self.admit(priority, Arc::new(program))?)
    }

    #[inline]
    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    #[inline]
    pub fn task(&self, handle: TaskHandle) -> Option<&Task> {
        self.registry.get(handle)
    }

    #[inline]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Lock-free statistics snapshot
    pub fn stats(&self) -> SchedulerStats {
        self.stats.snapshot()
    }

    pub fn is_finished(&self) -> bool {
        self.registry.incomplete_count() == 0
    }

    /// Sweep until every admitted task has completed
    #[instrument(name = "scheduler_run", skip_all, fields(run_id = tracing::field::Empty))]
    pub async fn run(&mut self) -> KernelResult<RunSummary> {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));

        self.sink.record(&TraceEvent::SchedulerStarted {
            tasks: self.registry.len(),
            slice_micros: self.config.time_slice.as_micros(),
        });

        let mut sweeps = 0u64;
        loop {
            let remaining = self.registry.incomplete_count();
            if remaining == 0 {
                break;
            }
            if let Some(limit) = self.config.max_sweeps {
                if sweeps >= limit {
                    warn!(limit, remaining, "Sweep limit reached");
                    return Err(KernelError::SweepLimit { limit, remaining });
                }
            }

            self.sweep().await?;
            sweeps += 1;
        }

        self.sink.record(&TraceEvent::AllCompleted { sweeps });

        Ok(RunSummary {
            run_id,
            sweeps,
            tasks: self.registry.iter().map(Task::info).collect(),
            stats: self.stats(),
        })
    }

    /// Visit every incomplete task once, in admission order
    ///
    /// Returns each visited task with the reason its context stopped. An
    /// empty result means there was nothing left to run.
    pub async fn sweep(&mut self) -> KernelResult<Vec<(TaskHandle, Exit)>> {
        let runnable = self.registry.runnable();
        if runnable.is_empty() {
            return Ok(Vec::new());
        }

        let sweep = self.stats.inc_sweeps();
        self.sink.record(&TraceEvent::SweepStarted {
            sweep,
            incomplete: runnable.len(),
        });

        let mut outcomes = Vec::with_capacity(runnable.len());
        for handle in runnable {
            let exit = self.dispatch(handle).await?;
            outcomes.push((handle, exit));
        }
        Ok(outcomes)
    }

    /// Run one task for one slice
    async fn dispatch(&mut self, handle: TaskHandle) -> KernelResult<Exit> {
        let slice = self.config.time_slice.as_duration();
        let unavailable = |reason: &str| KernelError::Dispatch {
            task: handle.id(),
            reason: reason.to_string(),
        };

        let task = self
            .registry
            .get_mut(handle)
            .ok_or_else(|| unavailable("unknown task"))?;
        let id = task.id();
        let mut cpu = task
            .begin_dispatch()
            .ok_or_else(|| unavailable("CPU state unavailable"))?;

        self.stats.inc_dispatches();
        self.sink.record(&TraceEvent::TaskDispatched {
            task: id,
            priority: task.priority(),
            pc: cpu.pc(),
        });

        let program = Arc::clone(task.program());
        let preempt = task.preempt_flag().clone();
        let context_flag = preempt.clone();
        let engine = Engine::new(id, Arc::clone(&self.sink));

        let mut context = tokio::task::spawn_blocking(move || {
            let report = engine.run(&mut cpu, &program, &context_flag);
            (cpu, report)
        });

        let joined = match tokio::time::timeout(slice, &mut context).await {
            Ok(joined) => joined,
            Err(_elapsed) => {
                preempt.raise();
                context.await
            }
        };
        let (cpu, report) = joined.map_err(|e| KernelError::Dispatch {
            task: id,
            reason: e.to_string(),
        })?;

        self.stats.record_run(&report);
        let pc = cpu.pc();
        let completed = report.exit.is_terminal();
        task.end_dispatch(cpu, report.exit);

        if completed {
            self.stats.inc_completions();
            self.sink.record(&TraceEvent::TaskCompleted {
                task: id,
                pc,
                retired: report.retired,
            });
        } else {
            self.stats.inc_preemptions();
            self.sink.record(&TraceEvent::TaskPreempted {
                task: id,
                pc,
                retired: report.retired,
            });
        }

        Ok(report.exit)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::NullSink;
    use crate::process::TaskState;

    fn quiet() -> SchedulerBuilder {
        Scheduler::builder().with_sink(Arc::new(NullSink))
    }

    #[tokio::test]
    async fn test_empty_scheduler_finishes_immediately() {
        let mut scheduler = quiet().build().unwrap();
        assert!(scheduler.is_finished());

        let summary = scheduler.run().await.unwrap();
        assert_eq!(summary.sweeps, 0);
        assert!(summary.tasks.is_empty());
        assert!(scheduler.sweep().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_dispatch_completes_short_program() {
        let mut scheduler = quiet().build().unwrap();
        let handle = scheduler.admit_source(1, "LOAD R0, 4\nHALT").unwrap();

        let outcomes = scheduler.sweep().await.unwrap();
        assert_eq!(outcomes, vec![(handle, Exit::Halted)]);

        let task = scheduler.task(handle).unwrap();
        assert_eq!(task.state(), TaskState::Completed);
        assert_eq!(task.dispatches(), 1);
        assert_eq!(scheduler.stats().completions, 1);
        assert_eq!(scheduler.stats().instructions, 2);
    }

    #[tokio::test]
    async fn test_sweep_limit() {
        let mut scheduler = quiet().with_max_sweeps(0).build().unwrap();
        scheduler.admit_source(0, "HALT").unwrap();

        let err = scheduler.run().await.unwrap_err();
        assert!(matches!(
            err,
            KernelError::SweepLimit {
                limit: 0,
                remaining: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_admit_source_rejects_malformed_program() {
        let mut scheduler = quiet().build().unwrap();
        let err = scheduler.admit_source(0, "PUSH\nHALT").unwrap_err();
        assert!(matches!(err, KernelError::Program(_)));
        assert!(scheduler.registry().is_empty());
    }

    #[tokio::test]
    async fn test_admit_all_keeps_admitted_tasks_when_full() {
        let mut scheduler = quiet().with_capacity(2).build().unwrap();
        let program: Arc<Program> = Arc::new("LOAD R0, 7\nHALT".parse().unwrap());
        let handles = scheduler.admit_all((0..4).map(|p| (p, Arc::clone(&program))));

        assert_eq!(handles.len(), 2);
        assert_eq!(scheduler.registry().len(), 2);

        let summary = scheduler.run().await.unwrap();
        assert_eq!(summary.tasks.len(), 2);
        assert!(summary.all_halted());
    }

    #[tokio::test]
    async fn test_empty_program_reports_exhausted_not_halted() {
        let mut scheduler = quiet().build().unwrap();
        let handle = scheduler.admit_source(0, "").unwrap();

        let summary = scheduler.run().await.unwrap();
        let info = &summary.tasks[0];
        assert!(info.completed);
        assert_eq!(info.exit, Some(Exit::Exhausted));
        assert_eq!(info.pc, Some(0));
        assert!(summary.all_completed());
        assert!(!summary.all_halted());
        assert_eq!(scheduler.task(handle).unwrap().last_exit(), Some(Exit::Exhausted));
    }

    #[test]
    fn test_builder_rejects_zero_capacity() {
        assert!(quiet().with_capacity(0).build().is_err());
    }
}
