//! TOML-based application configuration.
//!
//! Stores user preferences:
//! - Default fasting protocol and custom fasting hours
//! - Daily water goal
//! - Notification preferences
//!
//! Configuration is stored at `~/.config/hourglass/config.toml`. Values
//! are validated when written through [`Config::set`]; readers additionally
//! clamp, so a hand-edited file can degrade but never break the engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;
use crate::schedule::{FastingProtocol, CUSTOM_HOURS_MAX, CUSTOM_HOURS_MIN};
use crate::water::DEFAULT_WATER_GOAL;

/// Fasting preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastingConfig {
    /// Protocol used when starting a fast without an explicit choice.
    #[serde(default)]
    pub protocol: FastingProtocol,
    /// Fasting hours for the custom protocol (1-23).
    #[serde(default = "default_custom_hours")]
    pub custom_hours: u8,
}

/// Water tracking preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterConfig {
    /// Glasses per day before the goal counts as met. Seeds the tracker on
    /// first use.
    #[serde(default = "default_water_goal")]
    pub goal_glasses: u32,
}

/// Notification preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/hourglass/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fasting: FastingConfig,
    #[serde(default)]
    pub water: WaterConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

// Default functions
fn default_custom_hours() -> u8 {
    16
}
fn default_water_goal() -> u32 {
    DEFAULT_WATER_GOAL
}
fn default_true() -> bool {
    true
}

impl Default for FastingConfig {
    fn default() -> Self {
        Self {
            protocol: FastingProtocol::default(),
            custom_hours: default_custom_hours(),
        }
    }
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            goal_glasses: default_water_goal(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fasting: FastingConfig::default(),
            water: WaterConfig::default(),
            notifications: NotificationsConfig::default(),
        }
    }
}

/// Every settable key, for `config list` output and error messages.
pub const CONFIG_KEYS: &[&str] = &[
    "fasting.protocol",
    "fasting.custom_hours",
    "water.goal_glasses",
    "notifications.enabled",
];

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::DataDir(e.to_string()))?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing the default file when none exists.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Load from disk, returning default on error. Never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a value as a display string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "fasting.protocol" => Some(self.fasting.protocol.as_token().to_string()),
            "fasting.custom_hours" => Some(self.fasting.custom_hours.to_string()),
            "water.goal_glasses" => Some(self.water.goal_glasses.to_string()),
            "notifications.enabled" => Some(self.notifications.enabled.to_string()),
            _ => None,
        }
    }

    /// Parse and validate `value` into the field named by `key` without
    /// touching disk.
    ///
    /// # Errors
    /// Returns an error for unknown keys and for values that fail
    /// validation (e.g. custom hours outside 1-23).
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        match key {
            "fasting.protocol" => {
                self.fasting.protocol = value.parse().map_err(invalid)?;
            }
            "fasting.custom_hours" => {
                let hours: u8 = value
                    .parse()
                    .map_err(|_| invalid(format!("'{value}' is not a whole number")))?;
                if !(CUSTOM_HOURS_MIN..=CUSTOM_HOURS_MAX).contains(&hours) {
                    return Err(invalid(format!(
                        "must be between {CUSTOM_HOURS_MIN} and {CUSTOM_HOURS_MAX}"
                    )));
                }
                self.fasting.custom_hours = hours;
            }
            "water.goal_glasses" => {
                let goal: u32 = value
                    .parse()
                    .map_err(|_| invalid(format!("'{value}' is not a whole number")))?;
                if goal == 0 {
                    return Err(invalid("must be at least 1".to_string()));
                }
                self.water.goal_glasses = goal;
            }
            "notifications.enabled" => {
                self.notifications.enabled = value
                    .parse()
                    .map_err(|_| invalid(format!("'{value}' is not true or false")))?;
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Set a value by key and persist.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// All keys with their current values, in a stable order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        CONFIG_KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.fasting.protocol, FastingProtocol::SixteenEight);
        assert_eq!(cfg.fasting.custom_hours, 16);
        assert_eq!(cfg.water.goal_glasses, 8);
        assert!(cfg.notifications.enabled);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: Config = toml::from_str("[fasting]\ncustom_hours = 14\n").unwrap();
        assert_eq!(cfg.fasting.custom_hours, 14);
        assert_eq!(cfg.fasting.protocol, FastingProtocol::SixteenEight);
        assert_eq!(cfg.water.goal_glasses, 8);
        assert!(cfg.notifications.enabled);
    }

    #[test]
    fn get_supports_every_listed_key() {
        let cfg = Config::default();
        for key in CONFIG_KEYS {
            assert!(cfg.get(key).is_some(), "no value for {key}");
        }
        assert!(cfg.get("fasting.missing").is_none());
    }

    #[test]
    fn apply_updates_protocol_from_label_or_token() {
        let mut cfg = Config::default();
        cfg.apply("fasting.protocol", "18:6").unwrap();
        assert_eq!(cfg.fasting.protocol, FastingProtocol::EighteenSix);
        cfg.apply("fasting.protocol", "warrior").unwrap();
        assert_eq!(cfg.fasting.protocol, FastingProtocol::Warrior);
        assert!(cfg.apply("fasting.protocol", "13:11").is_err());
    }

    #[test]
    fn apply_validates_custom_hours_range() {
        let mut cfg = Config::default();
        cfg.apply("fasting.custom_hours", "13").unwrap();
        assert_eq!(cfg.fasting.custom_hours, 13);

        assert!(cfg.apply("fasting.custom_hours", "0").is_err());
        assert!(cfg.apply("fasting.custom_hours", "24").is_err());
        assert!(cfg.apply("fasting.custom_hours", "sixteen").is_err());
        // failed writes leave the previous value in place
        assert_eq!(cfg.fasting.custom_hours, 13);
    }

    #[test]
    fn apply_rejects_unknown_keys() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("fasting.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn apply_validates_water_goal() {
        let mut cfg = Config::default();
        cfg.apply("water.goal_glasses", "10").unwrap();
        assert_eq!(cfg.water.goal_glasses, 10);
        assert!(cfg.apply("water.goal_glasses", "0").is_err());
    }

    #[test]
    fn entries_cover_all_keys_in_order() {
        let entries = Config::default().entries();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, CONFIG_KEYS);
    }
}
