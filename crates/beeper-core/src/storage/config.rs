//! TOML-based application configuration.
//!
//! Stores the study settings the scheduler needs at startup:
//! - Which timer profile is active
//! - The beep expiry tolerance window
//! - An optional custom profile overriding the built-in presets
//!
//! Configuration is stored at `~/.config/beeper/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::timer::{TimerProfile, builtin_profiles};

/// Scheduler-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Id of the active timer profile.
    #[serde(default = "default_profile")]
    pub profile: String,
    /// How long past its planned timestamp a beep may still be
    /// delivered before it is expired and replaced.
    #[serde(default = "default_expiry_tolerance")]
    pub expiry_tolerance_secs: i64,
    /// Schedule a fresh beep automatically after every terminal
    /// transition.
    #[serde(default = "default_true")]
    pub auto_reschedule: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/beeper/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Custom profile override (takes precedence over built-ins).
    #[serde(default)]
    pub custom_profile: Option<TimerProfile>,
}

// Default functions
fn default_profile() -> String {
    "standard".into()
}
fn default_expiry_tolerance() -> i64 {
    600
}
fn default_true() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            expiry_tolerance_secs: default_expiry_tolerance(),
            auto_reschedule: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            custom_profile: None,
        }
    }
}

impl Config {
    pub fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path()?, content)?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Resolve the active timer profile.
    ///
    /// A custom profile overrides the built-ins; otherwise the configured
    /// id is looked up among the presets. The result is validated either
    /// way.
    pub fn active_profile(&self) -> Result<TimerProfile, Box<dyn std::error::Error>> {
        let profile = if let Some(ref custom) = self.custom_profile {
            custom.clone()
        } else {
            TimerProfile::builtin(&self.scheduler.profile).ok_or_else(|| {
                format!(
                    "unknown profile '{}'; available: {}",
                    self.scheduler.profile,
                    builtin_profiles()
                        .iter()
                        .map(|p| p.id.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })?
        };
        profile.validate()?;
        Ok(profile)
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
        assert_eq!(parsed.scheduler.profile, "standard");
        assert_eq!(parsed.scheduler.expiry_tolerance_secs, 600);
        assert!(parsed.scheduler.auto_reschedule);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let parsed: Config = toml::from_str("[scheduler]\nprofile = \"dense\"\n").unwrap();
        assert_eq!(parsed.scheduler.profile, "dense");
        assert_eq!(parsed.scheduler.expiry_tolerance_secs, 600);
        assert!(parsed.custom_profile.is_none());
    }

    #[test]
    fn config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.scheduler.expiry_tolerance_secs = 300;
        std::fs::write(&path, toml::to_string_pretty(&cfg).unwrap()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Config = toml::from_str(&content).unwrap();
        assert_eq!(parsed.scheduler.expiry_tolerance_secs, 300);
    }

    #[test]
    fn active_profile_resolves_builtin() {
        let cfg = Config::default();
        assert_eq!(cfg.active_profile().unwrap().id, "standard");
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let mut cfg = Config::default();
        cfg.scheduler.profile = "does-not-exist".into();
        assert!(cfg.active_profile().is_err());
    }

    #[test]
    fn custom_profile_wins_over_builtin() {
        let mut cfg = Config::default();
        let mut custom = TimerProfile::builtin("dense").unwrap();
        custom.id = "study-42".into();
        cfg.custom_profile = Some(custom);
        assert_eq!(cfg.active_profile().unwrap().id, "study-42");
    }

    #[test]
    fn invalid_custom_profile_is_rejected() {
        let mut cfg = Config::default();
        let mut custom = TimerProfile::builtin("dense").unwrap();
        custom.min_beep_interval = custom.max_beep_interval;
        cfg.custom_profile = Some(custom);
        assert!(cfg.active_profile().is_err());
    }
}
