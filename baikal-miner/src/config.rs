//! Per-board configuration.
//!
//! Parsed from environment variables like the rest of the miner's backends.
//!
//! # Environment Variables
//!
//! - `BAIKAL_CUTOFF_TEMP`: Board shutdown temperature in °C (default: 85,
//!   clamped to 50-100)
//! - `BAIKAL_FAN_SPEED`: Fan duty in % (default: 100, clamped to 0-100)
//! - `BAIKAL_STALE_SLOTS`: Discard results whose work is more than this many
//!   submissions old (1-254; unset keeps every result)

use crate::{tracing::prelude::*, work_log::WORK_LOG_CAPACITY};

const DEFAULT_CUTOFF_TEMP: u8 = 85;
const DEFAULT_FAN_SPEED: u8 = 100;

/// What to do with results whose work slot has since been overtaken by
/// newer submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalenessPolicy {
    /// Validate every result regardless of age.
    #[default]
    Disabled,

    /// Discard results more than this many submissions old.
    MaxSlotsBehind(u8),
}

impl StalenessPolicy {
    /// Decide from the distance returned by
    /// [`WorkLog::slots_since`](crate::work_log::WorkLog::slots_since).
    pub fn is_stale(&self, slots_since: u8) -> bool {
        match self {
            StalenessPolicy::Disabled => false,
            StalenessPolicy::MaxSlotsBehind(limit) => {
                // Distance 0 is the slot about to be overwritten, a full lap old
                let age = if slots_since == 0 {
                    WORK_LOG_CAPACITY
                } else {
                    slots_since as usize
                };
                age > *limit as usize
            }
        }
    }
}

/// Board settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    /// Temperature at which the board firmware stops hashing.
    pub cutoff_temp: u8,

    /// Fan duty cycle percentage.
    pub fan_speed: u8,

    pub staleness: StalenessPolicy,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            cutoff_temp: DEFAULT_CUTOFF_TEMP,
            fan_speed: DEFAULT_FAN_SPEED,
            staleness: StalenessPolicy::Disabled,
        }
    }
}

impl BoardConfig {
    /// Parse configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let cutoff_temp = parse_env::<u8>("BAIKAL_CUTOFF_TEMP")
            .unwrap_or(DEFAULT_CUTOFF_TEMP)
            .clamp(50, 100);

        let fan_speed = parse_env::<u8>("BAIKAL_FAN_SPEED")
            .unwrap_or(DEFAULT_FAN_SPEED)
            .min(100);

        let staleness = parse_env::<u16>("BAIKAL_STALE_SLOTS")
            .map(|slots| StalenessPolicy::MaxSlotsBehind(slots.clamp(1, 254) as u8))
            .unwrap_or_default();

        Self {
            cutoff_temp,
            fan_speed,
            staleness,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "Ignoring unparsable setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var("BAIKAL_CUTOFF_TEMP");
        std::env::remove_var("BAIKAL_FAN_SPEED");
        std::env::remove_var("BAIKAL_STALE_SLOTS");
    }

    #[test]
    #[serial]
    fn test_defaults_when_not_set() {
        clear_env();

        assert_eq!(BoardConfig::from_env(), BoardConfig::default());
    }

    #[test]
    #[serial]
    fn test_values_clamped_to_valid_range() {
        clear_env();
        std::env::set_var("BAIKAL_CUTOFF_TEMP", "120");
        std::env::set_var("BAIKAL_FAN_SPEED", "250");
        std::env::set_var("BAIKAL_STALE_SLOTS", "0");

        let config = BoardConfig::from_env();
        assert_eq!(config.cutoff_temp, 100);
        assert_eq!(config.fan_speed, 100);
        assert_eq!(config.staleness, StalenessPolicy::MaxSlotsBehind(1));

        std::env::set_var("BAIKAL_CUTOFF_TEMP", "10");
        assert_eq!(BoardConfig::from_env().cutoff_temp, 50);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_stale_slots_above_byte_range_clamp() {
        clear_env();

        for raw in ["255", "256", "1000"] {
            std::env::set_var("BAIKAL_STALE_SLOTS", raw);
            assert_eq!(
                BoardConfig::from_env().staleness,
                StalenessPolicy::MaxSlotsBehind(254),
                "BAIKAL_STALE_SLOTS={}",
                raw
            );
        }

        clear_env();
    }

    #[test]
    #[serial]
    fn test_garbage_falls_back_to_default() {
        clear_env();
        std::env::set_var("BAIKAL_FAN_SPEED", "loud");
        std::env::set_var("BAIKAL_STALE_SLOTS", "-3");

        let config = BoardConfig::from_env();
        assert_eq!(config.fan_speed, DEFAULT_FAN_SPEED);
        assert_eq!(config.staleness, StalenessPolicy::Disabled);

        clear_env();
    }

    #[test]
    fn test_staleness_policy() {
        assert!(!StalenessPolicy::Disabled.is_stale(0));
        assert!(!StalenessPolicy::Disabled.is_stale(200));

        let policy = StalenessPolicy::MaxSlotsBehind(16);
        assert!(!policy.is_stale(1));
        assert!(!policy.is_stale(16));
        assert!(policy.is_stale(17));
        // Full lap
        assert!(policy.is_stale(0));
    }
}
