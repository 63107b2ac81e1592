//! Task model for the simulator.
//!
//! A [`TaskDef`] is the validated input record; a [`SimTask`] wraps it with
//! the fields that change while the simulation runs.

use crate::types::{Priority, SchedError, ServiceClass, TaskId, TaskIdx, Tick};

/// Definition of a task, as handed over by the workload loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDef {
    pub id: TaskId,
    pub class: ServiceClass,
    /// First tick at which the task may be released into its queue.
    pub arrival: Tick,
    /// Total ticks of CPU the task needs.
    pub service: Tick,
    pub priority: Priority,
}

impl TaskDef {
    pub fn new(
        id: &str,
        class: ServiceClass,
        arrival: Tick,
        service: Tick,
        priority: Priority,
    ) -> Self {
        TaskDef {
            id: TaskId::from(id),
            class,
            arrival,
            service,
            priority,
        }
    }
}

/// Where a task currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Still in the arrival feed.
    Pending,
    /// Waiting in the level queue of its class.
    Queued,
    /// Occupying the CPU slot.
    Running,
    /// All service received; never scheduled again.
    Completed,
}

/// A simulated task at runtime.
#[derive(Debug, Clone)]
pub struct SimTask {
    pub def: TaskDef,
    /// Ticks of service still owed. Never increases.
    pub remaining: Tick,
    /// Set on the tick after the last unit of work, then fixed.
    pub completion: Option<Tick>,
    pub state: TaskState,
}

impl SimTask {
    pub fn new(def: TaskDef) -> Self {
        SimTask {
            remaining: def.service,
            def,
            completion: None,
            state: TaskState::Pending,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state == TaskState::Completed
    }

    /// Consume one tick of service at `now`. Returns true if this finished
    /// the task.
    pub fn run_one(&mut self, now: Tick) -> bool {
        debug_assert_eq!(self.state, TaskState::Running);
        debug_assert!(self.remaining > 0, "running a task with no work left");
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.completion = Some(now + 1);
            self.state = TaskState::Completed;
            true
        } else {
            false
        }
    }
}

/// Look up a task by handle.
pub(crate) fn task(tasks: &[SimTask], idx: TaskIdx) -> Result<&SimTask, SchedError> {
    tasks.get(idx.0).ok_or(SchedError::TaskNotFound(idx))
}

/// Look up a task by handle, mutably.
pub(crate) fn task_mut(tasks: &mut [SimTask], idx: TaskIdx) -> Result<&mut SimTask, SchedError> {
    tasks.get_mut(idx.0).ok_or(SchedError::TaskNotFound(idx))
}
