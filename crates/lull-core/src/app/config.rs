//! DeferralConfig - 容量の設定
//!
//! 認識するオプションは容量のみ。直接指定するか、ビューポートと
//! 行の高さから計算する。

use serde::{Deserialize, Serialize};

use crate::domain::{Capacity, DEFAULT_SLACK, IdleError};

/// How the queue bound is chosen.
///
/// JSON forms:
/// - `{ "capacity": 10 }`
/// - `{ "viewport_extent": 844.0, "item_extent": 120.0, "slack": 2 }` (`slack` optional)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeferralConfig {
    Fixed {
        capacity: usize,
    },
    Viewport {
        viewport_extent: f64,
        item_extent: f64,
        #[serde(default = "default_slack")]
        slack: usize,
    },
}

fn default_slack() -> usize {
    DEFAULT_SLACK
}

impl DeferralConfig {
    /// Visible-row estimate with the default slack.
    pub fn viewport(viewport_extent: f64, item_extent: f64) -> Self {
        Self::Viewport {
            viewport_extent,
            item_extent,
            slack: DEFAULT_SLACK,
        }
    }

    pub fn from_json(text: &str) -> Result<Self, IdleError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn capacity(&self) -> Result<Capacity, IdleError> {
        match *self {
            Self::Fixed { capacity } => Capacity::new(capacity),
            Self::Viewport {
                viewport_extent,
                item_extent,
                slack,
            } => Capacity::for_viewport(viewport_extent, item_extent, slack),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"{ "capacity": 4 }"#, 4)]
    #[case(r#"{ "viewport_extent": 844.0, "item_extent": 120.0 }"#, 10)]
    #[case(r#"{ "viewport_extent": 600, "item_extent": 120, "slack": 0 }"#, 5)]
    fn parses_and_computes(#[case] json: &str, #[case] expected: usize) {
        let config = DeferralConfig::from_json(json).unwrap();
        assert_eq!(config.capacity().unwrap().get(), expected);
    }

    #[test]
    fn default_slack_applies() {
        let config = DeferralConfig::from_json(r#"{ "viewport_extent": 240, "item_extent": 120 }"#)
            .unwrap();
        assert_eq!(config, DeferralConfig::viewport(240.0, 120.0));
    }

    #[test]
    fn malformed_json_is_config_error() {
        let result = DeferralConfig::from_json(r#"{ "rows": 100 }"#);
        assert!(matches!(result, Err(IdleError::Config(_))));
    }

    #[test]
    fn max_capacity_builds_a_usable_queue() {
        let config = DeferralConfig::from_json(r#"{ "capacity": 18446744073709551615 }"#).unwrap();
        let queue = crate::queue::IdleTaskQueue::new(config.capacity().unwrap());
        queue.submit(|| false);
        assert!(queue.drain().did_run());
    }

    #[test]
    fn zero_capacity_fails_at_capacity() {
        let config = DeferralConfig::from_json(r#"{ "capacity": 0 }"#).unwrap();
        assert!(matches!(config.capacity(), Err(IdleError::InvalidCapacity(0))));
    }
}
