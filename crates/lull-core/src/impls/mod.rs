//! Impls - IdleSource の実装
//!
//! # 含まれる実装
//! - **ObserverRegistry**: 登録表。`fire` を呼ぶ側がループ
//! - **RunLoop**: tokio の mpsc で入力を受けるシングルスレッドのループ

pub mod registry;
pub mod runloop;

pub use self::registry::ObserverRegistry;
pub use self::runloop::{LoopContext, LoopHandle, LoopStats, RunLoop};
