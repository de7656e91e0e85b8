//! IdleDeferral - キューとオブザーバの所有者
//!
//! # 設計
//! - キューとオブザーバは同じ所有者が持ち、生成と破棄は 1:1
//! - オブザーバのコールバックはキューを `Weak` でしか参照しない
//! - オブザーバ登録に失敗した場合は即時実行モードに落とせる

use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use tracing::{info, warn};

use super::observer::IdleObserver;
use crate::domain::{Capacity, IdleError, IdleTask};
use crate::observability::QueueCounts;
use crate::ports::IdleSource;
use crate::queue::IdleTaskQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeferralMode {
    /// Tasks wait for the next idle transition.
    Deferred,
    /// Tasks run inside `submit`.
    Immediate,
}

/// Owns an `IdleTaskQueue` and the observer that drains it.
///
/// # 使用例
/// ```
/// use std::rc::Rc;
/// use lull_core::{Activity, Capacity, IdleDeferral, LoopMode, ObserverRegistry};
///
/// let registry = ObserverRegistry::new();
/// let deferral = IdleDeferral::attach(Rc::new(registry.clone()), Capacity::new(4).unwrap()).unwrap();
/// deferral.submit(|| false);
/// assert_eq!(deferral.pending(), 1);
///
/// registry.fire(Activity::BEFORE_WAITING, LoopMode::Default);
/// assert_eq!(deferral.pending(), 0);
/// ```
pub struct IdleDeferral {
    // Declared first so the registration goes away before the queue.
    observer: Option<IdleObserver>,
    queue: Rc<IdleTaskQueue>,
}

impl IdleDeferral {
    /// Queue tasks and drain them on every default-mode idle transition of `source`.
    pub fn attach(source: Rc<dyn IdleSource>, capacity: Capacity) -> Result<Self, IdleError> {
        let queue = Rc::new(IdleTaskQueue::new(capacity));
        let weak = Rc::downgrade(&queue);
        let observer = IdleObserver::attach(source, move || {
            if let Some(queue) = weak.upgrade() {
                queue.drain();
            }
        })?;
        info!(%capacity, "idle deferral attached");
        Ok(Self {
            observer: Some(observer),
            queue,
        })
    }

    /// No observer: every task runs synchronously in `submit`.
    pub fn immediate(capacity: Capacity) -> Self {
        Self {
            observer: None,
            queue: Rc::new(IdleTaskQueue::new(capacity)),
        }
    }

    /// Like `attach`, but a refused registration degrades to `immediate`
    /// so content is never left unset.
    pub fn attach_or_immediate(source: Rc<dyn IdleSource>, capacity: Capacity) -> Self {
        match Self::attach(source, capacity) {
            Ok(deferral) => deferral,
            Err(error) => {
                warn!(%error, "idle deferral unavailable; running tasks immediately");
                Self::immediate(capacity)
            }
        }
    }

    pub fn submit<T: IdleTask + 'static>(&self, task: T) {
        match self.mode() {
            DeferralMode::Deferred => self.queue.submit(task),
            DeferralMode::Immediate => {
                // The stop signal only matters to a drain.
                let _ = self.queue.execute_now(task);
            }
        }
    }

    pub fn mode(&self) -> DeferralMode {
        if self.observer.is_some() {
            DeferralMode::Deferred
        } else {
            DeferralMode::Immediate
        }
    }

    pub fn is_deferred(&self) -> bool {
        self.mode() == DeferralMode::Deferred
    }

    pub fn capacity(&self) -> Capacity {
        self.queue.capacity()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn counts(&self) -> QueueCounts {
        self.queue.counts()
    }
}

impl fmt::Debug for IdleDeferral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdleDeferral")
            .field("mode", &self.mode())
            .field("queue", &self.queue)
            .finish()
    }
}
