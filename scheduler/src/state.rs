//! Pending task queue.
//!
//! Ordering is priority band descending, then `enqueued_at` ascending. Ties on
//! both keep insertion order because the sort is stable.

use std::fmt;

use tokio::time::Instant;

use crate::types::{TaskId, TaskPriority};

pub(crate) type Callback = Box<dyn FnOnce() + Send + 'static>;

pub(crate) struct QueuedTask {
    pub(crate) id: TaskId,
    pub(crate) callback: Callback,
    pub(crate) priority: TaskPriority,
    pub(crate) enqueued_at: Instant,
}

impl fmt::Debug for QueuedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedTask")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("enqueued_at", &self.enqueued_at)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub(crate) struct TaskQueue {
    tasks: Vec<QueuedTask>,
}

impl TaskQueue {
    pub(crate) fn push(&mut self, task: QueuedTask) {
        self.tasks.push(task);
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Removes a still-pending task. Returns whether anything was removed.
    pub(crate) fn remove(&mut self, id: TaskId) -> bool {
        match self.tasks.iter().position(|t| t.id == id) {
            Some(idx) => {
                self.tasks.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Sorts the queue and pops the first `max` tasks in drain order.
    pub(crate) fn pop_batch(&mut self, max: usize) -> Vec<QueuedTask> {
        self.tasks.sort_by(|a, b| {
            b.priority
                .rank()
                .cmp(&a.priority.rank())
                .then(a.enqueued_at.cmp(&b.enqueued_at))
        });
        let n = max.min(self.tasks.len());
        self.tasks.drain(..n).collect()
    }

    /// Drops every pending task without running it.
    pub(crate) fn clear(&mut self) -> usize {
        let n = self.tasks.len();
        self.tasks.clear();
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn task(id: u64, priority: TaskPriority, at: Instant) -> QueuedTask {
        QueuedTask {
            id: TaskId(id),
            callback: Box::new(|| {}),
            priority,
            enqueued_at: at,
        }
    }

    #[test]
    fn pop_batch_orders_by_band_then_age() {
        let t0 = Instant::now();
        let mut q = TaskQueue::default();
        q.push(task(1, TaskPriority::Low, t0));
        q.push(task(2, TaskPriority::Normal, t0 + Duration::from_millis(2)));
        q.push(task(3, TaskPriority::High, t0 + Duration::from_millis(3)));
        q.push(task(4, TaskPriority::Normal, t0 + Duration::from_millis(1)));

        let ids: Vec<u64> = q.pop_batch(10).iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![3, 4, 2, 1]);
        assert!(q.is_empty());
    }

    #[test]
    fn pop_batch_respects_limit() {
        let t0 = Instant::now();
        let mut q = TaskQueue::default();
        for i in 0..7 {
            q.push(task(i, TaskPriority::Normal, t0));
        }

        let ids: Vec<u64> = q.pop_batch(5).iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn remove_is_a_noop_for_unknown_ids() {
        let mut q = TaskQueue::default();
        q.push(task(1, TaskPriority::Normal, Instant::now()));
        assert!(!q.remove(TaskId(9)));
        assert!(q.remove(TaskId(1)));
        assert!(!q.remove(TaskId(1)));
    }
}
