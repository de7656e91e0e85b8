//! IdleSource port - ループの活動フェーズを通知する
//!
//! # 契約
//! - BEFORE_WAITING は「準備済みの仕事をすべて処理し、次の入力を待って
//!   ブロックする直前」に 1 イテレーションにつき 1 回発火する
//! - コールバックはループ自身のスレッドで同期的に呼ばれる

use std::fmt;

use thiserror::Error;

use crate::domain::{Activity, LoopMode};

/// Callback invoked with the single activity that fired.
pub type ObserverCallback = Box<dyn FnMut(Activity)>;

/// Registration handle returned by `IdleSource::add_observer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl ObserverId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer#{}", self.0)
    }
}

/// What an observer wants to hear about.
///
/// Observers matching a fired activity run in ascending `order`; ties keep
/// registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverSpec {
    pub activities: Activity,
    pub mode: LoopMode,
    /// `false` removes the observer after its first call.
    pub repeats: bool,
    pub order: i32,
}

impl ObserverSpec {
    pub fn new(activities: Activity) -> Self {
        Self {
            activities,
            mode: LoopMode::Default,
            repeats: true,
            order: 0,
        }
    }

    /// Repeating `BEFORE_WAITING` observer in the default mode.
    pub fn before_waiting() -> Self {
        Self::new(Activity::BEFORE_WAITING)
    }

    pub fn in_mode(mut self, mode: LoopMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn once(mut self) -> Self {
        self.repeats = false;
        self
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub(crate) fn matches(&self, activity: Activity, running: LoopMode) -> bool {
        self.activities.intersects(activity) && self.mode.includes(running)
    }
}

/// The host refused to create a registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserverError {
    #[error("run loop has already finished")]
    LoopFinished,

    #[error("observer limit reached (limit={limit})")]
    LimitReached { limit: usize },
}

/// IdleSource はホストのスケジューラ
///
/// # 実装
/// - `ObserverRegistry`: 手動で `fire` できる（テスト・同期ホスト用）
/// - `RunLoop`: tokio の current-thread ランタイム上で動くループ
pub trait IdleSource {
    fn add_observer(
        &self,
        spec: ObserverSpec,
        callback: ObserverCallback,
    ) -> Result<ObserverId, ObserverError>;

    /// Returns `false` if `id` was not registered (already removed or fired once).
    fn remove_observer(&self, id: ObserverId) -> bool;
}
