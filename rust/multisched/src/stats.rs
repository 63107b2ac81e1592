//! Turnaround and waiting-time statistics for a finished run.
//!
//! # Metrics Computed
//!
//! - **Turnaround**: `completion - arrival`
//! - **Waiting**: `turnaround - service`
//! - **Response**: first tick on the CPU minus arrival
//! - **Dispatch / preemption / expiry counts**, from the trace events
//!
//! Averages cover completed tasks only and are zero when nothing completed.

use crate::task::SimTask;
use crate::trace::Trace;
use crate::types::{Priority, ServiceClass, TaskId, TaskIdx, Tick};

/// Summary statistics for a distribution of tick counts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickDistribution {
    /// Number of samples.
    pub count: usize,
    /// Minimum value (or 0 if empty).
    pub min: Tick,
    /// Maximum value (or 0 if empty).
    pub max: Tick,
    /// Sum of all values.
    pub sum: u64,
}

impl TickDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sample value.
    pub fn add(&mut self, value: Tick) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += u64::from(value);
    }

    /// Mean value (or 0 if empty).
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }
}

/// Per-task statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskStats {
    pub task: TaskIdx,
    pub id: TaskId,
    pub class: ServiceClass,
    pub arrival: Tick,
    pub service: Tick,
    pub priority: Priority,
    /// None if the task never finished.
    pub completion: Option<Tick>,
    pub turnaround: Option<Tick>,
    pub waiting: Option<Tick>,
    pub response: Option<Tick>,
    pub dispatch_count: usize,
    pub preempt_count: usize,
    pub expiry_count: usize,
}

/// Aggregate statistics for a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    /// Per-task statistics, in input order.
    pub tasks: Vec<TaskStats>,
    pub turnaround: TickDistribution,
    pub waiting: TickDistribution,
    /// Total simulated ticks.
    pub elapsed: Tick,
    /// Ticks on which some task held the CPU.
    pub busy_ticks: Tick,
}

impl RunStats {
    /// Compute statistics from the task table and trace of a run.
    pub fn compute(tasks: &[SimTask], trace: &Trace, elapsed: Tick) -> Self {
        let mut stats = RunStats {
            elapsed,
            ..Default::default()
        };

        for (i, task) in tasks.iter().enumerate() {
            let idx = TaskIdx(i);
            let def = &task.def;
            let turnaround = task.completion.map(|c| c.saturating_sub(def.arrival));
            let waiting = turnaround.map(|t| t.saturating_sub(def.service));
            if let (Some(t), Some(w)) = (turnaround, waiting) {
                stats.turnaround.add(t);
                stats.waiting.add(w);
            }
            stats.busy_ticks += trace.total_runtime(idx);

            stats.tasks.push(TaskStats {
                task: idx,
                id: def.id.clone(),
                class: def.class,
                arrival: def.arrival,
                service: def.service,
                priority: def.priority,
                completion: task.completion,
                turnaround,
                waiting,
                response: trace
                    .first_run(idx)
                    .map(|first| first.saturating_sub(def.arrival)),
                dispatch_count: trace.dispatch_count(idx),
                preempt_count: trace.preempt_count(idx),
                expiry_count: trace.expiry_count(idx),
            });
        }

        stats
    }

    /// Number of tasks that reached completion.
    pub fn completed(&self) -> usize {
        self.turnaround.count
    }

    pub fn avg_turnaround(&self) -> f64 {
        self.turnaround.mean()
    }

    pub fn avg_waiting(&self) -> f64 {
        self.waiting.mean()
    }

    pub fn idle_ticks(&self) -> Tick {
        self.elapsed.saturating_sub(self.busy_ticks)
    }

    /// Fraction of ticks the CPU was busy (0 for an empty run).
    pub fn utilization(&self) -> f64 {
        if self.elapsed == 0 {
            0.0
        } else {
            f64::from(self.busy_ticks) / f64::from(self.elapsed)
        }
    }
}
