//! Simulated CPU slot and the dispatch state machine.
//!
//! The dispatcher tracks which task holds the CPU, which level it currently
//! favors, and how much of that level's slice is left. High and Medium hand
//! the CPU back and forth by slice once either is favored; Low only runs
//! when both are empty and gives the CPU up as soon as either has work.

use crate::queue::LevelQueues;
use crate::task::{task, SimTask};
use crate::types::{SchedError, ServiceClass, TaskIdx};

/// Ticks left at the favored level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantum {
    /// No slice limit; used while servicing Low.
    Unlimited,
    Ticks(u32),
}

impl Quantum {
    /// Account one tick of service. Saturates at zero.
    pub fn tick(&mut self) {
        if let Quantum::Ticks(n) = self {
            *n = n.saturating_sub(1);
        }
    }

    pub fn is_exhausted(self) -> bool {
        self == Quantum::Ticks(0)
    }
}

/// A running task displaced by a more urgent one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preemption {
    pub preempted: TaskIdx,
    pub next: TaskIdx,
}

/// Single-slot CPU dispatcher.
#[derive(Debug)]
pub struct Dispatcher {
    current: Option<TaskIdx>,
    level: ServiceClass,
    quantum: Quantum,
    high_slice: u32,
    medium_slice: u32,
}

impl Dispatcher {
    /// An idle CPU favoring Low with no slice limit.
    pub fn new(high_slice: u32, medium_slice: u32) -> Self {
        Dispatcher {
            current: None,
            level: ServiceClass::Low,
            quantum: Quantum::Unlimited,
            high_slice,
            medium_slice,
        }
    }

    /// Task occupying the CPU, or None if idle.
    pub fn current(&self) -> Option<TaskIdx> {
        self.current
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    /// Level currently favored.
    pub fn level(&self) -> ServiceClass {
        self.level
    }

    pub fn quantum(&self) -> Quantum {
        self.quantum
    }

    fn slice_for(&self, level: ServiceClass) -> Quantum {
        match level {
            ServiceClass::High => Quantum::Ticks(self.high_slice),
            ServiceClass::Medium => Quantum::Ticks(self.medium_slice),
            ServiceClass::Low => Quantum::Unlimited,
        }
    }

    /// Favor `level` with a fresh slice.
    fn switch_to(&mut self, level: ServiceClass) {
        self.level = level;
        self.quantum = self.slice_for(level);
    }

    /// Hand the CPU to the other slice-bearing level.
    fn rotate(&mut self) {
        match self.level {
            ServiceClass::High => self.switch_to(ServiceClass::Medium),
            ServiceClass::Medium => self.switch_to(ServiceClass::High),
            ServiceClass::Low => {}
        }
    }

    /// Pick the next task for an idle CPU.
    ///
    /// Staying at the favored level keeps the remaining slice; moving to a
    /// different level starts a fresh one. If every queue is empty the CPU
    /// stays idle and neither level nor slice change.
    pub fn select(&mut self, queues: &mut LevelQueues) -> Result<Option<TaskIdx>, SchedError> {
        debug_assert!(self.current.is_none(), "select on a busy CPU");
        if queues.is_empty() {
            return Ok(None);
        }

        // The last task of a slice finished on the tick the slice ran out,
        // so the expiry check never saw it. Apply the switch now.
        if self.quantum.is_exhausted() {
            self.rotate();
        }

        let order = match self.level {
            ServiceClass::High => [ServiceClass::High, ServiceClass::Medium, ServiceClass::Low],
            ServiceClass::Medium => [ServiceClass::Medium, ServiceClass::High, ServiceClass::Low],
            ServiceClass::Low => [ServiceClass::High, ServiceClass::Medium, ServiceClass::Low],
        };
        let Some(class) = order.into_iter().find(|&c| !queues.get(c).is_empty()) else {
            return Ok(None);
        };

        let idx = queues.get_mut(class).dequeue()?;
        if class != self.level {
            self.switch_to(class);
        }
        self.current = Some(idx);
        Ok(Some(idx))
    }

    /// Check whether a queued task should displace the running one.
    ///
    /// - High: a strictly more urgent High task swaps in; the slice carries on.
    /// - Low: any High (else Medium) task takes over and the Low task goes
    ///   back to the head of the Low queue.
    /// - Medium: never preempted.
    pub fn check_preempt(
        &mut self,
        queues: &mut LevelQueues,
        tasks: &[SimTask],
    ) -> Result<Option<Preemption>, SchedError> {
        let Some(running) = self.current else {
            return Ok(None);
        };

        match self.level {
            ServiceClass::High => {
                let Some(front) = queues.get(ServiceClass::High).peek_front() else {
                    return Ok(None);
                };
                if task(tasks, front)?.def.priority >= task(tasks, running)?.def.priority {
                    return Ok(None);
                }
                let high = queues.get_mut(ServiceClass::High);
                let next = high.dequeue()?;
                high.enqueue(running, task(tasks, running)?);
                self.current = Some(next);
                Ok(Some(Preemption {
                    preempted: running,
                    next,
                }))
            }
            ServiceClass::Low => {
                let Some(class) = [ServiceClass::High, ServiceClass::Medium]
                    .into_iter()
                    .find(|&c| !queues.get(c).is_empty())
                else {
                    return Ok(None);
                };
                let next = queues.get_mut(class).dequeue()?;
                queues.get_mut(ServiceClass::Low).push_front(running);
                self.switch_to(class);
                self.current = Some(next);
                Ok(Some(Preemption {
                    preempted: running,
                    next,
                }))
            }
            ServiceClass::Medium => Ok(None),
        }
    }

    /// Account one executed tick against the slice.
    pub fn account_tick(&mut self) {
        self.quantum.tick();
    }

    /// The running task finished; free the slot.
    pub fn release(&mut self) -> Option<TaskIdx> {
        self.current.take()
    }

    /// Requeue the running task if the favored level's slice ran out, and
    /// switch to the other slice-bearing level. Returns the requeued task.
    pub fn check_timeout(
        &mut self,
        queues: &mut LevelQueues,
        tasks: &[SimTask],
    ) -> Result<Option<TaskIdx>, SchedError> {
        let Some(running) = self.current else {
            return Ok(None);
        };
        if self.level == ServiceClass::Low || !self.quantum.is_exhausted() {
            return Ok(None);
        }
        self.current = None;
        queues.enqueue(running, task(tasks, running)?);
        self.rotate();
        Ok(Some(running))
    }
}
