//! Run loop phases and modes.

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Phases of one run loop iteration that observers can subscribe to.
    ///
    /// An observer registers a set; when fired, the callback receives exactly
    /// one flag.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Activity: u8 {
        /// The loop started running.
        const ENTRY = 1 << 0;
        /// About to process ready sources.
        const BEFORE_SOURCES = 1 << 1;
        /// All ready work is done; the loop is about to block.
        const BEFORE_WAITING = 1 << 2;
        /// Woken up by a new event.
        const AFTER_WAITING = 1 << 3;
        /// The loop stopped.
        const EXIT = 1 << 4;
    }
}

/// The mode a run loop is running in.
///
/// While the user drags a list the loop runs in `Tracking`; observers
/// registered for `Default` stay silent until the drag ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    #[default]
    Default,
    Tracking,
    /// Registration-only: matches every running mode.
    Common,
}

impl LoopMode {
    /// Does an observer registered for `self` fire while the loop runs in `running`?
    pub fn includes(self, running: LoopMode) -> bool {
        self == LoopMode::Common || self == running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_matching() {
        assert!(LoopMode::Default.includes(LoopMode::Default));
        assert!(!LoopMode::Default.includes(LoopMode::Tracking));
        assert!(LoopMode::Tracking.includes(LoopMode::Tracking));
        assert!(LoopMode::Common.includes(LoopMode::Default));
        assert!(LoopMode::Common.includes(LoopMode::Tracking));
    }

    #[test]
    fn activity_sets() {
        let set = Activity::BEFORE_WAITING | Activity::EXIT;
        assert!(set.intersects(Activity::EXIT));
        assert!(!set.intersects(Activity::ENTRY));
    }
}
