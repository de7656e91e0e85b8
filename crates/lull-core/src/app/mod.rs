//! App - アプリケーション層
//!
//! ports とキューを組み合わせて、アイドル遅延実行を提供します。
//!
//! # 主要コンポーネント
//! - **IdleObserver**: アイドル遷移（BEFORE_WAITING）の購読
//! - **IdleDeferral**: キューとオブザーバを所有するコンポーネント
//! - **DeferralBuilder / DeferralConfig**: 構築と設定

pub mod builder;
pub mod config;
pub mod deferral;
pub mod observer;

pub use self::builder::DeferralBuilder;
pub use self::config::DeferralConfig;
pub use self::deferral::{DeferralMode, IdleDeferral};
pub use self::observer::IdleObserver;
