//! lull-core
//!
//! Idle-deferred work for scrolling lists: expensive per-row work is queued
//! at render time and executed only when the host event loop is about to
//! block waiting for input.
//!
//! # モジュール構成
//! - **domain**: タスク・容量・ループの活動フェーズ・エラー型
//! - **ports**: ホストのイベントループへの抽象化（IdleSource）
//! - **queue**: 容量制限付き FIFO（IdleTaskQueue）
//! - **impls**: ObserverRegistry（手動発火）と RunLoop（tokio ベース）
//! - **app**: IdleObserver と、キューとオブザーバを所有する IdleDeferral
//! - **observability**: キューのカウンタ

pub mod app;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;

pub use app::{DeferralBuilder, DeferralConfig, DeferralMode, IdleDeferral, IdleObserver};
pub use domain::{Activity, Capacity, IdleError, IdleTask, LoopMode, Step};
pub use impls::{LoopContext, LoopHandle, LoopStats, ObserverRegistry, RunLoop};
pub use observability::QueueCounts;
pub use ports::{IdleSource, ObserverError, ObserverId, ObserverSpec};
pub use queue::{DrainReport, IdleTaskQueue};
