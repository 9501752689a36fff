/*!
 * Virtual CPU Simulator - Main Entry Point
 *
 * Usage: vcpu-sim [PROGRAM_FILE...]
 *
 * Each file is admitted as one task, earlier files with higher priority.
 * Without arguments the built-in demo programs are run.
 */

use miette::IntoDiagnostic;
use std::sync::Arc;
use tracing::info;

use vcpu_kernel::{init_tracing, Priority, Program, Scheduler, SchedulerConfig};

/// Built-in demo workload: (priority, source)
const DEMO_PROGRAMS: [(Priority, &str); 3] = [
    (
        3,
        "LOAD R0, 10\nLOAD R1, 20\nADD R2, R0, R1\nPUSH R2\nPOP R3\nHALT",
    ),
    (1, "LOAD R0, 50\nLOAD R1, 5\nSUB R2, R0, R1\nHALT"),
    (2, "LOAD R0, 100\nLOAD R1, 4\nMUL R2, R0, R1\nHALT"),
];

#[tokio::main]
async fn main() -> miette::Result<()> {
    init_tracing();

    let config = SchedulerConfig::from_env()?;
    info!(
        capacity = config.capacity,
        slice_ms = config.time_slice.as_duration().as_millis() as u64,
        "Virtual CPU simulator starting"
    );

    let mut programs: Vec<(Priority, Program)> = Vec::new();
    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        info!("No program files given, running demo workload");
        for (priority, source) in DEMO_PROGRAMS {
            programs.push((priority, source.parse()?));
        }
    } else {
        let count = paths.len();
        for (index, path) in paths.iter().enumerate() {
            let program = Program::from_file(path)?;
            info!(path = %path, instructions = program.len(), "Loaded program");
            programs.push(((count - index) as Priority, program));
        }
    }

    let mut scheduler = Scheduler::builder().with_config(config).build()?;
    scheduler.admit_all(
        programs
            .into_iter()
            .map(|(priority, program)| (priority, Arc::new(program))),
    );

    let summary = scheduler.run().await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).into_diagnostic()?
    );

    Ok(())
}
