//! multisched - Deterministic tick-driven simulator for a three-level
//! multilevel-feedback CPU scheduler.
//!
//! Tasks belong to one of three service classes and wait in the matching
//! level queue until the single simulated CPU picks them up:
//!
//! - **High**: ordered by priority; a more urgent High task preempts.
//! - **Medium**: shortest remaining time first.
//! - **Low**: FIFO; runs only while High and Medium are empty and yields
//!   as soon as either has work.
//!
//! Once High or Medium is favored, the two alternate by time slice (6 and
//! 4 ticks by default), so neither can starve the other.
//!
//! # Architecture
//!
//! - **Feed**: tasks that have not arrived yet, in input order
//! - **Queues**: one ordering discipline per service class
//! - **Cpu**: single-slot dispatcher with favored level and slice
//! - **Engine**: the tick loop tying the above together
//! - **Trace / Stats**: per-tick occupancy and derived turnaround/waiting
//!
//! # Usage
//!
//! ```rust,no_run
//! use multisched::*;
//!
//! let tasks = vec![
//!     TaskDef::new("A0", ServiceClass::High, 0, 5, 1),
//!     TaskDef::new("B0", ServiceClass::Low, 1, 3, 1),
//! ];
//!
//! let result = Simulator::new(tasks, SimConfig::default()).run().unwrap();
//! result.trace.dump();
//! println!("avg turnaround {:.2}", result.stats.avg_turnaround());
//! ```

pub mod config;
pub mod cpu;
pub mod engine;
pub mod feed;
pub mod fmt;
mod perfetto;
pub mod queue;
pub mod report;
pub mod stats;
pub mod task;
pub mod trace;
pub mod types;
pub mod workload;

// Re-export the main public types for convenience.
pub use config::{SimConfig, DEFAULT_HIGH_SLICE, DEFAULT_MEDIUM_SLICE};
pub use cpu::{Dispatcher, Preemption, Quantum};
pub use engine::{sim_clock, ClockState, SimulationResult, Simulator};
pub use fmt::{init_tracing, FmtTick, SimFormat};
pub use queue::{LevelQueue, LevelQueues};
pub use report::write_report;
pub use stats::{RunStats, TaskStats, TickDistribution};
pub use task::{SimTask, TaskDef, TaskState};
pub use trace::{TaskTrace, Trace, TraceEvent, TraceKind};
pub use types::{Priority, SchedError, ServiceClass, TaskId, TaskIdx, Tick};
pub use workload::{LoadError, RejectReason, Rejection, Workload};
