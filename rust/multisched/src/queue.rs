//! Level queue simulation.
//!
//! Each service class owns one queue with a fixed discipline: High is
//! ordered by priority, Medium by remaining service time, Low is FIFO.
//! Ordered queues break ties by insertion order, so a new entry always
//! lands at the back of its band.

use std::collections::{BTreeMap, VecDeque};

use crate::task::SimTask;
use crate::types::{SchedError, ServiceClass, TaskIdx};

/// How a queue orders its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Discipline {
    /// Ascending by priority number.
    Priority,
    /// Ascending by remaining service time at the moment of insertion.
    RemainingTime,
    /// Arrival order.
    Fifo,
}

impl Discipline {
    fn for_class(class: ServiceClass) -> Self {
        match class {
            ServiceClass::High => Discipline::Priority,
            ServiceClass::Medium => Discipline::RemainingTime,
            ServiceClass::Low => Discipline::Fifo,
        }
    }
}

/// A single level queue.
#[derive(Debug)]
pub struct LevelQueue {
    class: ServiceClass,
    discipline: Discipline,
    /// Ordered entries: (sort key, insertion_order) -> task.
    /// The insertion_order keeps equal keys stable.
    ordered: BTreeMap<(u32, u64), TaskIdx>,
    /// FIFO entries (Low only).
    fifo: VecDeque<TaskIdx>,
    /// Monotonic counter for insertion ordering.
    insertion_counter: u64,
}

impl LevelQueue {
    pub fn new(class: ServiceClass) -> Self {
        LevelQueue {
            class,
            discipline: Discipline::for_class(class),
            ordered: BTreeMap::new(),
            fifo: VecDeque::new(),
            insertion_counter: 0,
        }
    }

    pub fn class(&self) -> ServiceClass {
        self.class
    }

    /// Insert a task according to this queue's discipline.
    pub fn enqueue(&mut self, idx: TaskIdx, task: &SimTask) {
        debug_assert_eq!(task.def.class, self.class, "task enqueued on foreign level");
        let key = match self.discipline {
            Discipline::Priority => task.def.priority,
            Discipline::RemainingTime => task.remaining,
            Discipline::Fifo => {
                self.fifo.push_back(idx);
                return;
            }
        };
        let order = self.insertion_counter;
        self.insertion_counter += 1;
        self.ordered.insert((key, order), idx);
    }

    /// Put a task back at the head of a FIFO queue, ahead of everything
    /// already waiting.
    ///
    /// # Panics
    /// Panics on an ordered queue, where "front" is defined by the key.
    pub fn push_front(&mut self, idx: TaskIdx) {
        assert!(
            self.discipline == Discipline::Fifo,
            "push_front on ordered {} queue",
            self.class
        );
        self.fifo.push_front(idx);
    }

    /// Remove and return the front task.
    pub fn dequeue(&mut self) -> Result<TaskIdx, SchedError> {
        let popped = match self.discipline {
            Discipline::Fifo => self.fifo.pop_front(),
            Discipline::Priority | Discipline::RemainingTime => {
                self.ordered.pop_first().map(|(_, idx)| idx)
            }
        };
        popped.ok_or(SchedError::QueueEmpty(self.class))
    }

    /// The task `dequeue` would return, without removing it.
    pub fn peek_front(&self) -> Option<TaskIdx> {
        match self.discipline {
            Discipline::Fifo => self.fifo.front().copied(),
            Discipline::Priority | Discipline::RemainingTime => {
                self.ordered.values().next().copied()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.ordered.len() + self.fifo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty() && self.fifo.is_empty()
    }

    /// All queued tasks, front first.
    pub fn ordered(&self) -> Vec<TaskIdx> {
        match self.discipline {
            Discipline::Fifo => self.fifo.iter().copied().collect(),
            Discipline::Priority | Discipline::RemainingTime => {
                self.ordered.values().copied().collect()
            }
        }
    }
}

/// The three level queues, one per service class.
#[derive(Debug)]
pub struct LevelQueues {
    high: LevelQueue,
    medium: LevelQueue,
    low: LevelQueue,
}

impl LevelQueues {
    pub fn new() -> Self {
        LevelQueues {
            high: LevelQueue::new(ServiceClass::High),
            medium: LevelQueue::new(ServiceClass::Medium),
            low: LevelQueue::new(ServiceClass::Low),
        }
    }

    pub fn get(&self, class: ServiceClass) -> &LevelQueue {
        match class {
            ServiceClass::High => &self.high,
            ServiceClass::Medium => &self.medium,
            ServiceClass::Low => &self.low,
        }
    }

    pub fn get_mut(&mut self, class: ServiceClass) -> &mut LevelQueue {
        match class {
            ServiceClass::High => &mut self.high,
            ServiceClass::Medium => &mut self.medium,
            ServiceClass::Low => &mut self.low,
        }
    }

    /// Route a task to the queue of its own class.
    pub fn enqueue(&mut self, idx: TaskIdx, task: &SimTask) {
        self.get_mut(task.def.class).enqueue(idx, task);
    }

    /// Total number of queued tasks across all levels.
    pub fn len(&self) -> usize {
        self.high.len() + self.medium.len() + self.low.len()
    }

    pub fn is_empty(&self) -> bool {
        self.high.is_empty() && self.medium.is_empty() && self.low.is_empty()
    }
}

impl Default for LevelQueues {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDef;

    fn sim(id: &str, class: ServiceClass, service: u32, priority: u32) -> SimTask {
        SimTask::new(TaskDef::new(id, class, 0, service, priority))
    }

    #[test]
    fn test_priority_order_is_stable() {
        let tasks = [
            sim("A0", ServiceClass::High, 5, 3),
            sim("B0", ServiceClass::High, 5, 1),
            sim("C0", ServiceClass::High, 5, 3),
            sim("D0", ServiceClass::High, 5, 1),
        ];
        let mut q = LevelQueue::new(ServiceClass::High);
        for (i, t) in tasks.iter().enumerate() {
            q.enqueue(TaskIdx(i), t);
        }
        assert_eq!(
            q.ordered(),
            vec![TaskIdx(1), TaskIdx(3), TaskIdx(0), TaskIdx(2)]
        );
        assert_eq!(q.peek_front(), Some(TaskIdx(1)));
        assert_eq!(q.dequeue(), Ok(TaskIdx(1)));
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn test_requeued_task_joins_back_of_band() {
        let tasks = [
            sim("A0", ServiceClass::High, 5, 2),
            sim("B0", ServiceClass::High, 5, 2),
        ];
        let mut q = LevelQueue::new(ServiceClass::High);
        q.enqueue(TaskIdx(0), &tasks[0]);
        q.enqueue(TaskIdx(1), &tasks[1]);
        let front = q.dequeue().unwrap();
        q.enqueue(front, &tasks[front.0]);
        assert_eq!(q.ordered(), vec![TaskIdx(1), TaskIdx(0)]);
    }

    #[test]
    fn test_remaining_time_order() {
        let mut tasks = [
            sim("A0", ServiceClass::Medium, 8, 1),
            sim("B0", ServiceClass::Medium, 3, 1),
            sim("C0", ServiceClass::Medium, 3, 1),
        ];
        tasks[0].remaining = 2;
        let mut q = LevelQueue::new(ServiceClass::Medium);
        for (i, t) in tasks.iter().enumerate() {
            q.enqueue(TaskIdx(i), t);
        }
        assert_eq!(q.ordered(), vec![TaskIdx(0), TaskIdx(1), TaskIdx(2)]);
    }

    #[test]
    fn test_fifo_push_front_keeps_former_front() {
        let tasks = [
            sim("A0", ServiceClass::Low, 5, 1),
            sim("B0", ServiceClass::Low, 5, 1),
            sim("C0", ServiceClass::Low, 5, 1),
        ];
        let mut q = LevelQueue::new(ServiceClass::Low);
        q.enqueue(TaskIdx(1), &tasks[1]);
        q.enqueue(TaskIdx(2), &tasks[2]);
        q.push_front(TaskIdx(0));
        assert_eq!(q.ordered(), vec![TaskIdx(0), TaskIdx(1), TaskIdx(2)]);
    }

    #[test]
    #[should_panic(expected = "push_front on ordered")]
    fn test_push_front_rejected_on_ordered_queue() {
        let mut q = LevelQueue::new(ServiceClass::High);
        q.push_front(TaskIdx(0));
    }

    #[test]
    fn test_dequeue_empty_is_error() {
        let mut q = LevelQueue::new(ServiceClass::Medium);
        assert_eq!(q.dequeue(), Err(SchedError::QueueEmpty(ServiceClass::Medium)));
        assert_eq!(q.peek_front(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn test_level_queues_route_by_class() {
        let tasks = [
            sim("A0", ServiceClass::Low, 5, 1),
            sim("B0", ServiceClass::High, 5, 1),
        ];
        let mut qs = LevelQueues::new();
        qs.enqueue(TaskIdx(0), &tasks[0]);
        qs.enqueue(TaskIdx(1), &tasks[1]);
        assert_eq!(qs.get(ServiceClass::Low).peek_front(), Some(TaskIdx(0)));
        assert_eq!(qs.get(ServiceClass::High).peek_front(), Some(TaskIdx(1)));
        assert!(qs.get(ServiceClass::Medium).is_empty());
        assert_eq!(qs.len(), 2);
        assert!(!qs.is_empty());
    }
}
