//! Bot tuning configuration.
//!
//! Scan radii and thresholds are threaded through squad construction as
//! an explicit immutable struct, never read from ambient global state.

use serde::{Deserialize, Serialize};

/// Immutable tuning values for one bot.
///
/// All radii are in cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Radius an idle squad scans for enemies around its target.
    pub idle_scan_radius: i32,
    /// Radius an attacking squad scans for the next victim.
    pub attack_scan_radius: i32,
    /// Radius a protection squad scans for threats to the base.
    pub protection_scan_radius: i32,
    /// Radius used when judging whether a position is dangerous.
    pub danger_scan_radius: i32,
    /// Radius around the base within which closest-enemy lookups stay local.
    pub max_base_radius: i32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            idle_scan_radius: 10,
            attack_scan_radius: 13,
            protection_scan_radius: 8,
            danger_scan_radius: 10,
            max_base_radius: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_radii() {
        let config = BotConfig::default();
        assert_eq!(config.idle_scan_radius, 10);
        assert_eq!(config.attack_scan_radius, 13);
        assert_eq!(config.protection_scan_radius, 8);
        assert_eq!(config.danger_scan_radius, 10);
        assert_eq!(config.max_base_radius, 20);
    }
}
