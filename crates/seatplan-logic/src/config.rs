//! Allocator configuration: relaxation stages and heuristic thresholds.
//!
//! Every knob has a default matching the classroom the engine was tuned on,
//! so `AllocatorConfig::default()` is the normal way to run. A partial JSON
//! document overrides only the fields it names.
//!
//! ```
//! use seatplan_logic::config::{validate_config, AllocatorConfig};
//!
//! let config: AllocatorConfig = serde_json::from_str(r#"{"overflow_capacity": 6}"#).unwrap();
//! assert_eq!(config.stages.len(), 3);
//! assert!(validate_config(&config).is_empty());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::course::{Course, SeatFamily};
use crate::search::StagePolicy;

/// Tunables for one allocation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Relaxation stages, tried in order. Each must allow at least what the
    /// previous one allowed.
    pub stages: Vec<StagePolicy>,
    /// Fill order for long-desk courses inside a run.
    pub shared_order: [Course; 3],
    /// Long-desk-only groups at least this large are seated first.
    pub shared_block_threshold: u32,
    /// Largest robot headcount that may jump over the low-priority seats.
    pub skip_jump_max_focused: u32,
    /// Minimum students that must still get seats when some robot students
    /// are sent to the floor.
    pub min_seated_with_overflow: u32,
    /// Total floor headcount (including floor seats). `None` = unbounded.
    pub overflow_capacity: Option<u32>,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            stages: vec![
                StagePolicy::STRICT,
                StagePolicy::RELAXED,
                StagePolicy::LAST_RESORT,
            ],
            shared_order: Course::SHARED,
            shared_block_threshold: 4,
            skip_jump_max_focused: 7,
            min_seated_with_overflow: 2,
            overflow_capacity: None,
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No stages to try.
    NoStages,
    /// Stage at this position allows less than the stage before it.
    StageNotMonotonic(usize),
    /// Course appears in the shared order but is not a long-desk course.
    NotSharedCourse(Course),
    /// Course appears more than once in the shared order.
    DuplicateSharedCourse(Course),
    /// Block threshold of zero would put every long-desk group first.
    ZeroBlockThreshold,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoStages => write!(f, "at least one relaxation stage is required"),
            ConfigError::StageNotMonotonic(i) => {
                write!(f, "stage {i} is stricter than the stage before it")
            }
            ConfigError::NotSharedCourse(c) => {
                write!(f, "{c} is not a long-desk course and cannot be in the shared order")
            }
            ConfigError::DuplicateSharedCourse(c) => {
                write!(f, "{c} appears more than once in the shared order")
            }
            ConfigError::ZeroBlockThreshold => {
                write!(f, "shared_block_threshold must be at least 1")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Validate an allocator configuration, returning all errors found.
pub fn validate_config(config: &AllocatorConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.stages.is_empty() {
        errors.push(ConfigError::NoStages);
    }
    for (i, pair) in config.stages.windows(2).enumerate() {
        if !pair[1].includes(&pair[0]) {
            errors.push(ConfigError::StageNotMonotonic(i + 1));
        }
    }

    let mut seen = Vec::with_capacity(3);
    for &c in &config.shared_order {
        if c.family() != SeatFamily::Shared {
            errors.push(ConfigError::NotSharedCourse(c));
        } else if seen.contains(&c) {
            errors.push(ConfigError::DuplicateSharedCourse(c));
        }
        seen.push(c);
    }

    if config.shared_block_threshold == 0 {
        errors.push(ConfigError::ZeroBlockThreshold);
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&AllocatorConfig::default()).is_empty());
    }

    #[test]
    fn test_no_stages() {
        let config = AllocatorConfig {
            stages: vec![],
            ..Default::default()
        };
        assert_eq!(validate_config(&config), vec![ConfigError::NoStages]);
    }

    #[test]
    fn test_stage_order_must_relax() {
        let config = AllocatorConfig {
            stages: vec![StagePolicy::LAST_RESORT, StagePolicy::STRICT],
            ..Default::default()
        };
        assert_eq!(
            validate_config(&config),
            vec![ConfigError::StageNotMonotonic(1)]
        );
    }

    #[test]
    fn test_shared_order_checks() {
        let config = AllocatorConfig {
            shared_order: [Course::Robot, Course::Fab, Course::Fab],
            ..Default::default()
        };
        let errors = validate_config(&config);
        assert!(errors.contains(&ConfigError::NotSharedCourse(Course::Robot)));
        assert!(errors.contains(&ConfigError::DuplicateSharedCourse(Course::Fab)));
    }

    #[test]
    fn test_zero_threshold() {
        let config = AllocatorConfig {
            shared_block_threshold: 0,
            ..Default::default()
        };
        assert_eq!(
            validate_config(&config),
            vec![ConfigError::ZeroBlockThreshold]
        );
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: AllocatorConfig =
            serde_json::from_str(r#"{"skip_jump_max_focused": 3}"#).unwrap();
        assert_eq!(config.skip_jump_max_focused, 3);
        assert_eq!(config.shared_block_threshold, 4);
        assert_eq!(config.stages, AllocatorConfig::default().stages);
    }

    #[test]
    fn test_stage_json_shape() {
        let config: AllocatorConfig = serde_json::from_str(
            r#"{"stages": [{"allow_low_priority": true, "allow_overflow": false}]}"#,
        )
        .unwrap();
        assert_eq!(config.stages, vec![StagePolicy::RELAXED]);
    }
}
