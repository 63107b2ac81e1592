//! Arrival feed: tasks that have not been released to a level queue yet.

use crate::task::SimTask;
use crate::types::{TaskIdx, Tick};

/// Unreleased tasks, in input order.
///
/// Arrival times are not assumed to be sorted, so release scans the whole
/// feed rather than popping a prefix.
#[derive(Debug, Default)]
pub struct ArrivalFeed {
    pending: Vec<TaskIdx>,
}

impl ArrivalFeed {
    pub fn new(pending: Vec<TaskIdx>) -> Self {
        ArrivalFeed { pending }
    }

    /// Remove every task with `arrival <= now`, returned in feed order.
    pub fn release(&mut self, now: Tick, tasks: &[SimTask]) -> Vec<TaskIdx> {
        if !self
            .pending
            .iter()
            .any(|idx| tasks[idx.0].def.arrival <= now)
        {
            return Vec::new();
        }
        let (ready, waiting): (Vec<TaskIdx>, Vec<TaskIdx>) = self
            .pending
            .drain(..)
            .partition(|idx| tasks[idx.0].def.arrival <= now);
        self.pending = waiting;
        ready
    }

    /// Earliest arrival still pending.
    pub fn next_arrival(&self, tasks: &[SimTask]) -> Option<Tick> {
        self.pending.iter().map(|idx| tasks[idx.0].def.arrival).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDef;
    use crate::types::ServiceClass;

    fn tasks(arrivals: &[Tick]) -> Vec<SimTask> {
        arrivals
            .iter()
            .enumerate()
            .map(|(i, &a)| {
                let id = format!("A{i}");
                SimTask::new(TaskDef::new(&id, ServiceClass::Low, a, 1, 1))
            })
            .collect()
    }

    #[test]
    fn test_release_keeps_feed_order() {
        let tasks = tasks(&[2, 0, 5, 1]);
        let mut feed = ArrivalFeed::new((0..4).map(TaskIdx).collect());

        assert_eq!(feed.release(0, &tasks), vec![TaskIdx(1)]);
        assert!(feed.release(0, &tasks).is_empty());
        assert_eq!(feed.next_arrival(&tasks), Some(1));
        // Both 0 (arrival 2) and 3 (arrival 1) are due; feed order wins.
        assert_eq!(feed.release(3, &tasks), vec![TaskIdx(0), TaskIdx(3)]);
        assert_eq!(feed.len(), 1);
        assert_eq!(feed.release(9, &tasks), vec![TaskIdx(2)]);
        assert!(feed.is_empty());
        assert_eq!(feed.next_arrival(&tasks), None);
    }
}
