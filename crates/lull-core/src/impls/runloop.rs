//! RunLoop - シングルスレッドのイベントループ
//!
//! # 1 イテレーションの流れ
//! 1. BEFORE_SOURCES
//! 2. 準備済みのイベントをすべて処理（`try_recv`）
//! 3. BEFORE_WAITING ← アイドル遷移。IdleObserver はここで drain する
//! 4. 次のイベントを待ってブロック（`recv().await`）
//! 5. AFTER_WAITING → そのイベントを処理 → 1 へ
//!
//! ENTRY は開始時に 1 回、EXIT は終了時に 1 回。

use std::cell::Cell;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::registry::ObserverRegistry;
use crate::domain::{Activity, IdleError, LoopMode};

/// Sends events into a `RunLoop`. The loop ends once every handle is dropped
/// and the pending events are handled.
#[derive(Debug)]
pub struct LoopHandle<E> {
    tx: mpsc::UnboundedSender<E>,
}

impl<E> Clone for LoopHandle<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<E> LoopHandle<E> {
    pub fn send(&self, event: E) -> Result<(), IdleError> {
        self.tx.send(event).map_err(|_| IdleError::LoopClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Loop controls handed to the event handler.
#[derive(Debug, Default)]
pub struct LoopContext {
    mode: Cell<LoopMode>,
    stopped: Cell<bool>,
}

impl LoopContext {
    pub fn mode(&self) -> LoopMode {
        self.mode.get()
    }

    /// Takes effect from the next activity fired.
    pub fn set_mode(&self, mode: LoopMode) {
        if self.mode.replace(mode) != mode {
            debug!(?mode, "run loop mode changed");
        }
    }

    /// Finish after the current event; pending events are not handled.
    pub fn stop(&self) {
        self.stopped.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopStats {
    pub iterations: u64,
    pub events: u64,
    /// BEFORE_WAITING transitions, in any mode.
    pub idle_transitions: u64,
}

/// A single-threaded host loop with observable phases.
///
/// `run` is a `!Send` future; drive it on a current-thread runtime.
/// ```
/// use lull_core::{Activity, ObserverSpec, IdleSource, RunLoop};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let (run_loop, handle) = RunLoop::<u32>::new();
/// run_loop
///     .observers()
///     .add_observer(ObserverSpec::before_waiting(), Box::new(|_| println!("idle")))
///     .unwrap();
/// handle.send(1).unwrap();
/// drop(handle);
/// let stats = run_loop.run(|_event, _cx| {}).await;
/// assert_eq!(stats.events, 1);
/// # });
/// ```
pub struct RunLoop<E> {
    rx: mpsc::UnboundedReceiver<E>,
    observers: ObserverRegistry,
    context: LoopContext,
    stats: LoopStats,
}

impl<E> RunLoop<E> {
    pub fn new() -> (Self, LoopHandle<E>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let run_loop = Self {
            rx,
            observers: ObserverRegistry::new(),
            context: LoopContext::default(),
            stats: LoopStats::default(),
        };
        (run_loop, LoopHandle { tx })
    }

    /// The loop's `IdleSource`. Registrations fail with `LoopFinished` after `run` returns.
    pub fn observers(&self) -> ObserverRegistry {
        self.observers.clone()
    }

    /// Mode the loop starts in.
    pub fn with_mode(self, mode: LoopMode) -> Self {
        self.context.mode.set(mode);
        self
    }

    pub async fn run<F>(mut self, mut handler: F) -> LoopStats
    where
        F: FnMut(E, &LoopContext),
    {
        self.notify(Activity::ENTRY);
        'iterations: loop {
            self.stats.iterations += 1;

            self.notify(Activity::BEFORE_SOURCES);
            while let Ok(event) = self.rx.try_recv() {
                self.dispatch(event, &mut handler);
                if self.context.is_stopped() {
                    break 'iterations;
                }
            }

            self.notify(Activity::BEFORE_WAITING);
            let Some(event) = self.rx.recv().await else {
                break;
            };
            self.notify(Activity::AFTER_WAITING);
            self.dispatch(event, &mut handler);
            if self.context.is_stopped() {
                break;
            }
        }
        self.notify(Activity::EXIT);

        self.rx.close();
        self.observers.close();
        debug!(
            iterations = self.stats.iterations,
            events = self.stats.events,
            idle = self.stats.idle_transitions,
            "run loop finished"
        );
        self.stats
    }

    fn dispatch<F>(&mut self, event: E, handler: &mut F)
    where
        F: FnMut(E, &LoopContext),
    {
        self.stats.events += 1;
        handler(event, &self.context);
    }

    fn notify(&mut self, activity: Activity) {
        if activity == Activity::BEFORE_WAITING {
            self.stats.idle_transitions += 1;
        }
        let fired = self.observers.fire(activity, self.context.mode());
        trace!(?activity, fired, "activity");
    }
}
