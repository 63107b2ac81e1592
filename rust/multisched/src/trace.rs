//! Execution trace recording for the simulator.
//!
//! Two views of the same run are kept:
//! - a per-task occupancy bitmap, one bit per simulated tick, which drives
//!   the chart and the completion bookkeeping;
//! - a chronological list of scheduling events (dispatch, preemption,
//!   slice expiry, completion) for debugging and derived statistics.

use bitvec::prelude::*;

use crate::types::{ServiceClass, TaskId, TaskIdx, Tick};

/// A single trace event produced by the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    /// Tick at which this event occurred.
    pub tick: Tick,
    pub kind: TraceKind,
}

/// The type of scheduling event recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceKind {
    /// A task left the arrival feed for its level queue.
    TaskArrived { task: TaskIdx },
    /// A task was picked for an idle CPU.
    TaskDispatched { task: TaskIdx, level: ServiceClass },
    /// A running task was displaced by a more urgent one.
    TaskPreempted { task: TaskIdx, by: TaskIdx },
    /// The favored level's slice ran out; the task was requeued.
    SliceExpired { task: TaskIdx },
    /// A task received its last tick of service.
    TaskCompleted { task: TaskIdx },
    /// The dispatcher started favoring a different level.
    LevelSwitched {
        from: ServiceClass,
        to: ServiceClass,
    },
    /// No task ran this tick.
    CpuIdle,
}

/// Occupancy record for one task.
#[derive(Debug, Clone)]
pub struct TaskTrace {
    pub id: TaskId,
    occupancy: BitVec,
}

impl TaskTrace {
    /// One bit per tick since the start of the run; set when the task ran.
    pub fn occupancy(&self) -> &BitSlice {
        &self.occupancy
    }

    /// Ticks of CPU this task received.
    pub fn runtime(&self) -> Tick {
        self.occupancy.count_ones() as Tick
    }
}

/// A complete simulation trace.
#[derive(Debug, Clone)]
pub struct Trace {
    start: Tick,
    nr_ticks: usize,
    tasks: Vec<TaskTrace>,
    events: Vec<TraceEvent>,
}

impl Trace {
    /// One entry per task, created before the first tick runs.
    pub(crate) fn new(start: Tick, ids: impl IntoIterator<Item = TaskId>) -> Self {
        Self {
            start,
            nr_ticks: 0,
            tasks: ids
                .into_iter()
                .map(|id| TaskTrace {
                    id,
                    occupancy: BitVec::new(),
                })
                .collect(),
            events: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, tick: Tick, kind: TraceKind) {
        self.events.push(TraceEvent { tick, kind });
    }

    /// Mark `task` as occupying the CPU at `tick`.
    pub(crate) fn mark_running(&mut self, task: TaskIdx, tick: Tick) {
        let offset = (tick - self.start) as usize;
        let bits = &mut self.tasks[task.0].occupancy;
        if bits.len() <= offset {
            bits.resize(offset + 1, false);
        }
        bits.set(offset, true);
    }

    /// Close the trace at `end`: every entry is padded to one bit per tick.
    pub(crate) fn finish(&mut self, end: Tick) {
        self.nr_ticks = end.saturating_sub(self.start) as usize;
        for entry in &mut self.tasks {
            entry.occupancy.resize(self.nr_ticks, false);
        }
    }

    /// First simulated tick.
    pub fn start(&self) -> Tick {
        self.start
    }

    /// Number of ticks covered by the occupancy bitmaps.
    pub fn nr_ticks(&self) -> usize {
        self.nr_ticks
    }

    /// Per-task occupancy records, in input order.
    pub fn entries(&self) -> &[TaskTrace] {
        &self.tasks
    }

    pub fn entry(&self, task: TaskIdx) -> Option<&TaskTrace> {
        self.tasks.get(task.0)
    }

    /// Get all events in chronological order.
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Whether `task` held the CPU at `tick`.
    pub fn ran_at(&self, task: TaskIdx, tick: Tick) -> bool {
        let Some(offset) = tick.checked_sub(self.start) else {
            return false;
        };
        self.tasks
            .get(task.0)
            .and_then(|t| t.occupancy.get(offset as usize).map(|b| *b))
            .unwrap_or(false)
    }

    /// The task that held the CPU at `tick`, if any.
    pub fn running_at(&self, tick: Tick) -> Option<TaskIdx> {
        (0..self.tasks.len())
            .map(TaskIdx)
            .find(|&idx| self.ran_at(idx, tick))
    }

    /// Total ticks of CPU a task received.
    pub fn total_runtime(&self, task: TaskIdx) -> Tick {
        self.tasks.get(task.0).map_or(0, TaskTrace::runtime)
    }

    /// First tick at which a task ran.
    pub fn first_run(&self, task: TaskIdx) -> Option<Tick> {
        self.tasks
            .get(task.0)
            .and_then(|t| t.occupancy.first_one())
            .map(|offset| self.start + offset as Tick)
    }

    /// Count the number of times a task was dispatched onto an idle CPU or
    /// swapped in by preemption.
    pub fn dispatch_count(&self, task: TaskIdx) -> usize {
        self.events
            .iter()
            .filter(|e| match e.kind {
                TraceKind::TaskDispatched { task: t, .. } => t == task,
                TraceKind::TaskPreempted { by, .. } => by == task,
                _ => false,
            })
            .count()
    }

    /// Count the number of times a task was preempted.
    pub fn preempt_count(&self, task: TaskIdx) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, TraceKind::TaskPreempted { task: t, .. } if t == task))
            .count()
    }

    /// Count the number of times a task was requeued by slice expiry.
    pub fn expiry_count(&self, task: TaskIdx) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, TraceKind::SliceExpired { task: t } if t == task))
            .count()
    }

    /// Number of ticks with nothing running.
    pub fn idle_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, TraceKind::CpuIdle))
            .count()
    }

    fn name(&self, task: TaskIdx) -> &str {
        self.tasks.get(task.0).map_or("??", |t| t.id.as_str())
    }

    /// Pretty-print the trace for debugging.
    pub fn dump(&self) {
        for event in &self.events {
            let desc = match &event.kind {
                TraceKind::TaskArrived { task } => format!("ARRIVE   {}", self.name(*task)),
                TraceKind::TaskDispatched { task, level } => {
                    format!("DISPATCH {} level={level}", self.name(*task))
                }
                TraceKind::TaskPreempted { task, by } => {
                    format!("PREEMPT  {} by={}", self.name(*task), self.name(*by))
                }
                TraceKind::SliceExpired { task } => format!("EXPIRE   {}", self.name(*task)),
                TraceKind::TaskCompleted { task } => format!("COMPLETE {}", self.name(*task)),
                TraceKind::LevelSwitched { from, to } => format!("LEVEL    {from} -> {to}"),
                TraceKind::CpuIdle => "IDLE".to_string(),
            };
            eprintln!("[{:>5}] {}", event.tick, desc);
        }
    }
}
