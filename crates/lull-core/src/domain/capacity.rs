//! Queue capacity: how many deferred tasks may be pending at once.

use std::fmt;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use super::errors::IdleError;

/// Extra rows kept on top of the visible-row estimate.
pub const DEFAULT_SLACK: usize = 2;

/// Upper bound on pending tasks in an `IdleTaskQueue`.
///
/// Capacity approximates the number of rows visible at once. Work for rows
/// that scrolled away before the loop went idle is evicted instead of piling
/// up during a fling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Capacity(NonZeroUsize);

impl Capacity {
    pub fn new(n: usize) -> Result<Self, IdleError> {
        NonZeroUsize::new(n)
            .map(Self)
            .ok_or(IdleError::InvalidCapacity(n))
    }

    /// `ceil(viewport_extent / item_extent) + slack`
    ///
    /// # Example
    /// - viewport=844, item=120, slack=2 → 8 + 2 = 10
    /// - viewport=600, item=120, slack=2 → 5 + 2 = 7
    pub fn for_viewport(
        viewport_extent: f64,
        item_extent: f64,
        slack: usize,
    ) -> Result<Self, IdleError> {
        let extent_error = || IdleError::InvalidExtent {
            viewport: viewport_extent,
            item: item_extent,
        };
        let item_ok = item_extent.is_finite() && item_extent > 0.0;
        let viewport_ok = viewport_extent.is_finite() && viewport_extent >= 0.0;
        if !item_ok || !viewport_ok {
            return Err(extent_error());
        }
        let visible = (viewport_extent / item_extent).ceil();
        // usize::MAX as f64 rounds up to 2^64, which no usize can hold.
        if visible >= usize::MAX as f64 {
            return Err(extent_error());
        }
        let total = (visible as usize)
            .checked_add(slack)
            .ok_or_else(extent_error)?;
        Self::new(total)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl TryFrom<usize> for Capacity {
    type Error = IdleError;

    fn try_from(n: usize) -> Result<Self, Self::Error> {
        Self::new(n)
    }
}

impl From<Capacity> for usize {
    fn from(capacity: Capacity) -> Self {
        capacity.get()
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
