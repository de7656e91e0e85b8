//! DeferralBuilder - IdleDeferral の構築
//!
//! # Fail-fast 設計
//! - 容量の設定エラーは build() 時に返す（オブザーバ登録より先）
//! - オブザーバ登録の失敗は `fallback_to_immediate` が true なら即時実行に落とす

use std::rc::Rc;

use super::config::DeferralConfig;
use super::deferral::IdleDeferral;
use crate::domain::IdleError;
use crate::ports::IdleSource;

/// DeferralBuilder は IdleDeferral を構築
///
/// # 使用例
/// ```ignore
/// let deferral = DeferralBuilder::new(DeferralConfig::viewport(844.0, 120.0))
///     .source(Rc::new(run_loop.observers()))
///     .build()?;
/// ```
///
/// `source` を渡さなければ即時実行モードになる。
pub struct DeferralBuilder {
    config: DeferralConfig,
    source: Option<Rc<dyn IdleSource>>,
    fallback_to_immediate: bool,
}

impl DeferralBuilder {
    pub fn new(config: DeferralConfig) -> Self {
        Self {
            config,
            source: None,
            fallback_to_immediate: true,
        }
    }

    pub fn source(mut self, source: Rc<dyn IdleSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// `false` turns a refused registration into a build error.
    pub fn fallback_to_immediate(mut self, fallback: bool) -> Self {
        self.fallback_to_immediate = fallback;
        self
    }

    pub fn build(self) -> Result<IdleDeferral, IdleError> {
        let capacity = self.config.capacity()?;
        match self.source {
            None => Ok(IdleDeferral::immediate(capacity)),
            Some(source) if self.fallback_to_immediate => {
                Ok(IdleDeferral::attach_or_immediate(source, capacity))
            }
            Some(source) => IdleDeferral::attach(source, capacity),
        }
    }
}
