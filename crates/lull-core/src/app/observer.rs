//! IdleObserver - アイドル遷移の購読トークン
//!
//! 登録はデフォルトモードの BEFORE_WAITING のみ。Drop で必ず解除する。

use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::domain::{IdleError, LoopMode};
use crate::ports::{IdleSource, ObserverId, ObserverSpec};

/// A registration that calls `on_idle` once per idle transition.
///
/// Dropping the observer removes the registration, so the callback never runs
/// after its owner is gone.
pub struct IdleObserver {
    source: Rc<dyn IdleSource>,
    id: Option<ObserverId>,
}

impl IdleObserver {
    /// Register `on_idle` for `BEFORE_WAITING` in `LoopMode::Default`.
    ///
    /// Fails with `IdleError::ObserverUnavailable` if the host refuses the
    /// registration; the caller decides whether to fall back.
    pub fn attach<F>(source: Rc<dyn IdleSource>, mut on_idle: F) -> Result<Self, IdleError>
    where
        F: FnMut() + 'static,
    {
        let spec = ObserverSpec::before_waiting().in_mode(LoopMode::Default);
        let id = source.add_observer(spec, Box::new(move |_| on_idle()))?;
        debug!(observer = %id, "idle observer attached");
        Ok(Self {
            source,
            id: Some(id),
        })
    }

    pub fn id(&self) -> Option<ObserverId> {
        self.id
    }

    pub fn is_attached(&self) -> bool {
        self.id.is_some()
    }

    /// Remove the registration. Calling it again is a no-op.
    pub fn detach(&mut self) {
        if let Some(id) = self.id.take() {
            self.source.remove_observer(id);
            debug!(observer = %id, "idle observer detached");
        }
    }
}

impl Drop for IdleObserver {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for IdleObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdleObserver").field("id", &self.id).finish()
    }
}
