//! Idle task queue implementation.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;
use tracing::{debug, trace};

use crate::domain::{Capacity, IdleTask, Step};
use crate::observability::QueueCounts;

/// Upper bound on slots reserved up front; the rest grows on demand.
const INITIAL_RESERVE: usize = 64;

/// Result of one `drain` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Tasks executed during this drain.
    pub ran: usize,

    /// A task returned `Step::Stop`.
    pub stopped: bool,
}

impl DrainReport {
    pub fn did_run(&self) -> bool {
        self.ran > 0
    }
}

/// Queue state behind the `RefCell`.
struct IdleQueueState {
    /// Pending tasks, oldest at the front.
    tasks: VecDeque<Box<dyn IdleTask>>,

    submitted: u64,
    evicted: u64,
    executed: u64,
}

impl IdleQueueState {
    fn new(capacity: Capacity) -> Self {
        Self {
            tasks: VecDeque::with_capacity(capacity.get().min(INITIAL_RESERVE)),
            submitted: 0,
            evicted: 0,
            executed: 0,
        }
    }

    /// Append, then evict the oldest task if the bound is exceeded.
    fn push(&mut self, task: Box<dyn IdleTask>, capacity: Capacity) -> Option<Box<dyn IdleTask>> {
        self.tasks.push_back(task);
        self.submitted += 1;
        if self.tasks.len() > capacity.get() {
            self.evicted += 1;
            return self.tasks.pop_front();
        }
        None
    }
}

/// Bounded FIFO of tasks drained during idle transitions.
///
/// Invariant: `len() <= capacity()` after every call returns.
///
/// Methods take `&self` so the queue can be shared (`Rc`) between its owner
/// and the observer callback that drains it. No borrow is held while a task
/// runs, so a task may `submit` to the same queue; the new task goes to the
/// back and is reached in the same drain unless a stop comes first.
pub struct IdleTaskQueue {
    capacity: Capacity,
    state: RefCell<IdleQueueState>,
}

impl IdleTaskQueue {
    pub fn new(capacity: Capacity) -> Self {
        Self {
            capacity,
            state: RefCell::new(IdleQueueState::new(capacity)),
        }
    }

    /// Enqueue `task`. If the queue is over capacity the oldest pending task
    /// is dropped and never runs.
    pub fn submit<T: IdleTask + 'static>(&self, task: T) {
        self.submit_boxed(Box::new(task));
    }

    pub fn submit_boxed(&self, task: Box<dyn IdleTask>) {
        let evicted = self.state.borrow_mut().push(task, self.capacity);
        if evicted.is_some() {
            trace!(capacity = %self.capacity, "evicted oldest idle task");
        }
        // Dropped here, outside the borrow, in case the task's captures touch the queue.
        drop(evicted);
    }

    /// Run `task` right away without queueing it (the non-deferred path).
    ///
    /// Counted as submitted and executed.
    pub fn execute_now<T: IdleTask + 'static>(&self, task: T) -> Step {
        self.state.borrow_mut().submitted += 1;
        let step = Box::new(task).run();
        self.state.borrow_mut().executed += 1;
        step
    }

    /// Run pending tasks oldest-first until the queue is empty or a task
    /// returns `Step::Stop`.
    ///
    /// Tasks after a stop are left untouched for the next drain.
    pub fn drain(&self) -> DrainReport {
        let mut report = DrainReport::default();
        while let Some(task) = self.pop_front() {
            let step = task.run();
            report.ran += 1;
            self.state.borrow_mut().executed += 1;
            if step.is_stop() {
                report.stopped = true;
                break;
            }
        }
        if report.did_run() {
            debug!(
                ran = report.ran,
                stopped = report.stopped,
                remaining = self.len(),
                "drained idle tasks"
            );
        }
        report
    }

    /// Drop every pending task. Counted as evictions.
    pub fn clear(&self) -> usize {
        let tasks = {
            let mut state = self.state.borrow_mut();
            let tasks = std::mem::take(&mut state.tasks);
            state.evicted += tasks.len() as u64;
            tasks
        };
        tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().tasks.len()
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub fn counts(&self) -> QueueCounts {
        let state = self.state.borrow();
        QueueCounts {
            submitted: state.submitted,
            evicted: state.evicted,
            executed: state.executed,
            pending: state.tasks.len(),
        }
    }

    fn pop_front(&self) -> Option<Box<dyn IdleTask>> {
        self.state.borrow_mut().tasks.pop_front()
    }
}

impl fmt::Debug for IdleTaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdleTaskQueue")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use rstest::rstest;

    use super::*;

    fn queue(capacity: usize) -> IdleTaskQueue {
        IdleTaskQueue::new(Capacity::new(capacity).unwrap())
    }

    /// Submit a task that logs `id` when it runs and returns `stop`.
    fn submit_logged(queue: &IdleTaskQueue, log: &Rc<RefCell<Vec<u32>>>, id: u32, stop: bool) {
        let log = Rc::clone(log);
        queue.submit(move || {
            log.borrow_mut().push(id);
            stop
        });
    }

    #[test]
    fn drains_in_submission_order() {
        let queue = queue(8);
        let log = Rc::new(RefCell::new(Vec::new()));
        for id in 1..=8 {
            submit_logged(&queue, &log, id, false);
        }

        let report = queue.drain();
        assert_eq!(*log.borrow(), (1..=8).collect::<Vec<_>>());
        assert_eq!(report, DrainReport { ran: 8, stopped: false });
        assert!(queue.is_empty());
    }

    #[test]
    fn capacity_evicts_oldest() {
        // capacity = 5, submit 1..7 → [3,4,5,6,7]
        let queue = queue(5);
        let log = Rc::new(RefCell::new(Vec::new()));
        for id in 1..=7 {
            submit_logged(&queue, &log, id, false);
            assert!(queue.len() <= 5);
        }
        assert_eq!(queue.len(), 5);

        let report = queue.drain();
        assert_eq!(*log.borrow(), vec![3, 4, 5, 6, 7]);
        assert_eq!(report.ran, 5);
        assert!(queue.is_empty());
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(10)]
    fn evicted_tasks_never_run(#[case] capacity: usize) {
        let queue = queue(capacity);
        let runs = Rc::new(Cell::new(0));
        for _ in 0..capacity + 5 {
            let runs = Rc::clone(&runs);
            queue.submit(move || {
                runs.set(runs.get() + 1);
                false
            });
        }

        queue.drain();
        assert_eq!(runs.get(), capacity);
        assert_eq!(
            queue.counts(),
            QueueCounts {
                submitted: (capacity + 5) as u64,
                evicted: 5,
                executed: capacity as u64,
                pending: 0,
            }
        );
    }

    #[test]
    fn stop_leaves_rest_queued() {
        // capacity = 3, A, B(stop), C
        let queue = queue(3);
        let log = Rc::new(RefCell::new(Vec::new()));
        submit_logged(&queue, &log, 1, false);
        submit_logged(&queue, &log, 2, true);
        submit_logged(&queue, &log, 3, false);

        let report = queue.drain();
        assert_eq!(*log.borrow(), vec![1, 2]);
        assert_eq!(report, DrainReport { ran: 2, stopped: true });
        assert_eq!(queue.len(), 1);

        let report = queue.drain();
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
        assert_eq!(report, DrainReport { ran: 1, stopped: false });
        assert!(queue.is_empty());
    }

    #[test]
    fn stop_on_last_task_reports_stopped() {
        let queue = queue(2);
        queue.submit(|| true);
        let report = queue.drain();
        assert!(report.stopped);
        assert!(queue.is_empty());
    }

    #[test]
    fn empty_drain_is_noop() {
        let queue = queue(4);
        let report = queue.drain();
        assert!(!report.did_run());
        assert_eq!(report, DrainReport::default());
        assert_eq!(queue.counts(), QueueCounts::default());
    }

    #[test]
    fn task_may_submit_during_drain() {
        let queue = Rc::new(queue(4));
        let log = Rc::new(RefCell::new(Vec::new()));

        let (q, l) = (Rc::clone(&queue), Rc::clone(&log));
        queue.submit(move || {
            l.borrow_mut().push(1);
            submit_logged(&q, &l, 2, false);
            false
        });

        let report = queue.drain();
        assert_eq!(report.ran, 2);
        assert_eq!(*log.borrow(), vec![1, 2]);
    }

    #[test]
    fn huge_capacity_does_not_preallocate() {
        let queue = queue(usize::MAX);
        let log = Rc::new(RefCell::new(Vec::new()));
        for id in 1..=3 {
            submit_logged(&queue, &log, id, false);
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.drain().ran, 3);
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn clear_counts_as_eviction() {
        let queue = queue(4);
        queue.submit(|| false);
        queue.submit(|| false);

        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.counts().evicted, 2);
        assert!(!queue.drain().did_run());
    }

    #[test]
    fn execute_now_bypasses_queue() {
        let queue = queue(1);
        queue.submit(|| false);
        let step = queue.execute_now(|| Step::Stop);

        assert_eq!(step, Step::Stop);
        assert_eq!(queue.len(), 1);
        let counts = queue.counts();
        assert_eq!((counts.submitted, counts.executed, counts.evicted), (2, 1, 0));
    }
}
