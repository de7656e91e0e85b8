//! Ports - 抽象化レイヤー
//!
//! ホストのイベントループ（スケジューラ）への窓口を trait として定義します。
//! 実装は `impls`（ObserverRegistry, RunLoop）に置きます。

pub mod idle_source;

pub use self::idle_source::{IdleSource, ObserverCallback, ObserverError, ObserverId, ObserverSpec};
