//! Task model: a unit of deferred work and the signal it returns.

use serde::{Deserialize, Serialize};

/// What the drain loop should do after a task has run.
///
/// `Stop` leaves every remaining task queued for the next idle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    Continue,
    Stop,
}

impl Step {
    pub fn is_stop(self) -> bool {
        matches!(self, Step::Stop)
    }
}

/// `true` means "stop draining for this cycle".
impl From<bool> for Step {
    fn from(stop: bool) -> Self {
        if stop { Step::Stop } else { Step::Continue }
    }
}

/// A unit of work executed at most once during an idle transition.
///
/// Closures returning `bool` or `Step` are tasks already:
/// ```
/// use lull_core::{IdleTaskQueue, Capacity};
///
/// let queue = IdleTaskQueue::new(Capacity::new(4).unwrap());
/// queue.submit(|| false);
/// assert!(queue.drain().did_run());
/// ```
///
/// A task owns whatever row context it needs. Failures inside the task (a
/// missing resource, a recycled cell) are handled in `run`; the queue never
/// sees them.
pub trait IdleTask {
    fn run(self: Box<Self>) -> Step;
}

impl<F, R> IdleTask for F
where
    F: FnOnce() -> R,
    R: Into<Step>,
{
    fn run(self: Box<Self>) -> Step {
        (*self)().into()
    }
}
