//! Errors - エラー型
//!
//! タスク内部の失敗はここに現れない（タスク自身が処理する）。

use thiserror::Error;

use crate::ports::ObserverError;

/// IdleError は lull-core の操作エラー
///
/// # 分類
/// - ObserverUnavailable: オブザーバ登録の失敗（起動時に一度だけ報告、リトライしない）
/// - InvalidCapacity / InvalidExtent / Config: 設定エラー
/// - LoopClosed: 終了したループへの送信
#[derive(Debug, Error)]
pub enum IdleError {
    #[error("idle observer could not be registered: {0}")]
    ObserverUnavailable(#[from] ObserverError),

    #[error("capacity must be at least 1 (got {0})")]
    InvalidCapacity(usize),

    #[error("invalid extents: viewport={viewport}, item={item}")]
    InvalidExtent { viewport: f64, item: f64 },

    #[error("run loop has finished")]
    LoopClosed,

    #[error("invalid deferral config: {0}")]
    Config(#[from] serde_json::Error),
}
