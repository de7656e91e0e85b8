//! ObserverRegistry - オブザーバの登録表
//!
//! # 実装詳細
//! - `Rc<RefCell<..>>` で共有（シングルスレッド専用）
//! - `fire` 中はテーブルの借用を保持しない
//!   → コールバック内で登録・解除してもパニックしない

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::domain::{Activity, LoopMode};
use crate::ports::{IdleSource, ObserverCallback, ObserverError, ObserverId, ObserverSpec};

struct Slot {
    id: ObserverId,
    spec: ObserverSpec,
    /// `None` while the callback is running.
    callback: Option<ObserverCallback>,
}

#[derive(Default)]
struct RegistryState {
    slots: Vec<Slot>,
    next_id: u64,
    limit: Option<usize>,
    closed: bool,
}

impl RegistryState {
    fn slot_mut(&mut self, id: ObserverId) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|slot| slot.id == id)
    }
}

/// An `IdleSource` whose activities are fired by its owner.
///
/// `RunLoop` fires one internally; tests and synchronous hosts call `fire`
/// directly. Clones share the same table.
#[derive(Clone, Default)]
pub struct ObserverRegistry {
    state: Rc<RefCell<RegistryState>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse registrations once `limit` observers are present.
    pub fn with_limit(limit: usize) -> Self {
        let registry = Self::new();
        registry.state.borrow_mut().limit = Some(limit);
        registry
    }

    pub fn len(&self) -> usize {
        self.state.borrow().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    /// Drop every observer and refuse new ones with `LoopFinished`.
    pub fn close(&self) {
        let slots = {
            let mut state = self.state.borrow_mut();
            state.closed = true;
            std::mem::take(&mut state.slots)
        };
        if !slots.is_empty() {
            debug!(dropped = slots.len(), "observer registry closed");
        }
    }

    /// Call every observer registered for `activity` in the `running` mode.
    ///
    /// Returns how many callbacks ran. Observers added during this call first
    /// fire on the next one.
    pub fn fire(&self, activity: Activity, running: LoopMode) -> usize {
        let due: Vec<ObserverId> = {
            let state = self.state.borrow();
            let mut due: Vec<(i32, ObserverId)> = state
                .slots
                .iter()
                .filter(|slot| slot.spec.matches(activity, running))
                .map(|slot| (slot.spec.order, slot.id))
                .collect();
            due.sort();
            due.into_iter().map(|(_, id)| id).collect()
        };

        let mut fired = 0;
        for id in due {
            let taken = {
                let mut state = self.state.borrow_mut();
                state
                    .slot_mut(id)
                    .and_then(|slot| slot.callback.take().map(|cb| (cb, slot.spec.repeats)))
            };
            // Removed by an earlier callback in this pass.
            let Some((mut callback, repeats)) = taken else {
                continue;
            };

            callback(activity);
            fired += 1;

            let mut state = self.state.borrow_mut();
            if repeats {
                if let Some(slot) = state.slot_mut(id) {
                    slot.callback = Some(callback);
                }
            } else {
                state.slots.retain(|slot| slot.id != id);
            }
        }
        fired
    }
}

impl IdleSource for ObserverRegistry {
    fn add_observer(
        &self,
        spec: ObserverSpec,
        callback: ObserverCallback,
    ) -> Result<ObserverId, ObserverError> {
        let mut state = self.state.borrow_mut();
        if state.closed {
            return Err(ObserverError::LoopFinished);
        }
        if let Some(limit) = state.limit
            && state.slots.len() >= limit
        {
            return Err(ObserverError::LimitReached { limit });
        }

        state.next_id += 1;
        let id = ObserverId::new(state.next_id);
        state.slots.push(Slot {
            id,
            spec,
            callback: Some(callback),
        });
        debug!(observer = %id, activities = ?spec.activities, mode = ?spec.mode, "observer added");
        Ok(id)
    }

    fn remove_observer(&self, id: ObserverId) -> bool {
        let removed = {
            let mut state = self.state.borrow_mut();
            state
                .slots
                .iter()
                .position(|slot| slot.id == id)
                .map(|pos| state.slots.remove(pos))
        };
        let found = removed.is_some();
        if found {
            debug!(observer = %id, "observer removed");
        }
        found
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ObserverRegistry")
            .field("observers", &state.slots.len())
            .field("limit", &state.limit)
            .field("closed", &state.closed)
            .finish()
    }
}
