//! Milestone maintenance policy configuration.
//!
//! Loaded once per process from a TOML file and validated before any object
//! is touched. Durations are configured in hours:
//!
//! ```toml
//! freeze_date = "Tuesday, October 17th"
//! warning_interval_hours = 24
//! label_grace_period_hours = 72
//! approval_grace_period_hours = 168
//! slush_update_interval_hours = 72
//! freeze_update_interval_hours = 24
//!
//! [modes]
//! "v1.8" = "slush"
//! "v1.9" = "dev"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::Duration;
use serde::Deserialize;
use thiserror::Error;

/// Release-process phase a milestone is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Dev,
    Slush,
    Freeze,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Slush => "slush",
            Self::Freeze => "freeze",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while loading or validating the policy.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse policy file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0} must be greater than zero")]
    NonPositiveDuration(&'static str),

    #[error("{0} must be supplied")]
    Missing(&'static str),

    #[error("at least one milestone must be mapped to a phase")]
    NoMilestones,
}

/// On-disk shape of the policy file.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    modes: BTreeMap<String, Phase>,
    warning_interval_hours: i64,
    label_grace_period_hours: i64,
    approval_grace_period_hours: i64,
    slush_update_interval_hours: i64,
    freeze_update_interval_hours: i64,
    freeze_date: String,
}

/// Validated milestone maintenance policy.
#[derive(Debug, Clone)]
pub struct MaintainerConfig {
    /// Milestones under management, mapped to their phase.
    pub modes: BTreeMap<String, Phase>,
    /// How often an unchanged warning notification is refreshed.
    pub warning_interval: Duration,
    /// Time allowed to complete the label triad before removal.
    pub label_grace_period: Duration,
    /// Time allowed to obtain milestone approval before removal.
    pub approval_grace_period: Duration,
    /// Required update cadence for blockers during code slush.
    pub slush_update_interval: Duration,
    /// Required update cadence for blockers during code freeze.
    pub freeze_update_interval: Duration,
    /// Display string for the code freeze date, used verbatim in messages.
    pub freeze_date: String,
}

impl MaintainerConfig {
    /// Parse and validate a policy from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        let config = Self {
            modes: file.modes,
            warning_interval: Duration::hours(file.warning_interval_hours),
            label_grace_period: Duration::hours(file.label_grace_period_hours),
            approval_grace_period: Duration::hours(file.approval_grace_period_hours),
            slush_update_interval: Duration::hours(file.slush_update_interval_hours),
            freeze_update_interval: Duration::hours(file.freeze_update_interval_hours),
            freeze_date: file.freeze_date,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a policy file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Fail fast on a policy that must not drive reconciliation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        duration_greater_than_zero("milestone-warning-interval", self.warning_interval)?;
        duration_greater_than_zero("milestone-label-grace-period", self.label_grace_period)?;
        duration_greater_than_zero("milestone-approval-grace-period", self.approval_grace_period)?;
        duration_greater_than_zero("milestone-slush-update-interval", self.slush_update_interval)?;
        duration_greater_than_zero("milestone-freeze-update-interval", self.freeze_update_interval)?;
        if self.freeze_date.is_empty() {
            return Err(ConfigError::Missing("milestone-freeze-date"));
        }
        if self.modes.is_empty() {
            return Err(ConfigError::NoMilestones);
        }
        Ok(())
    }

    /// Phase configured for `milestone`, if it is targeted at all.
    #[must_use]
    pub fn phase_for(&self, milestone: &str) -> Option<Phase> {
        self.modes.get(milestone).copied()
    }

    /// Update cadence required of blockers in `phase`, if any.
    #[must_use]
    pub fn update_interval(&self, phase: Phase) -> Option<Duration> {
        match phase {
            Phase::Dev => None,
            Phase::Slush => Some(self.slush_update_interval),
            Phase::Freeze => Some(self.freeze_update_interval),
        }
    }
}

fn duration_greater_than_zero(name: &'static str, value: Duration) -> Result<(), ConfigError> {
    if value <= Duration::zero() {
        return Err(ConfigError::NonPositiveDuration(name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
freeze_date = "the time heck freezes over"
warning_interval_hours = 24
label_grace_period_hours = 72
approval_grace_period_hours = 168
slush_update_interval_hours = 72
freeze_update_interval_hours = 24

[modes]
"v1.8" = "slush"
"v1.9" = "dev"
"#;

    #[test]
    fn test_parses_a_valid_policy() {
        let config = MaintainerConfig::from_toml(VALID).unwrap();
        assert_eq!(config.phase_for("v1.8"), Some(Phase::Slush));
        assert_eq!(config.phase_for("v1.9"), Some(Phase::Dev));
        assert_eq!(config.phase_for("v2.0"), None);
        assert_eq!(config.label_grace_period, Duration::days(3));
        assert_eq!(config.approval_grace_period, Duration::days(7));
        assert_eq!(config.freeze_date, "the time heck freezes over");
    }

    #[test]
    fn test_update_interval_depends_on_phase() {
        let config = MaintainerConfig::from_toml(VALID).unwrap();
        assert_eq!(config.update_interval(Phase::Dev), None);
        assert_eq!(config.update_interval(Phase::Slush), Some(Duration::days(3)));
        assert_eq!(config.update_interval(Phase::Freeze), Some(Duration::days(1)));
    }

    #[test]
    fn test_rejects_non_positive_durations() {
        let text = VALID.replace("label_grace_period_hours = 72", "label_grace_period_hours = 0");
        let err = MaintainerConfig::from_toml(&text).unwrap_err();
        assert_eq!(
            err.to_string(),
            "milestone-label-grace-period must be greater than zero"
        );
    }

    #[test]
    fn test_rejects_missing_freeze_date() {
        let text = VALID.replace(
            "freeze_date = \"the time heck freezes over\"",
            "freeze_date = \"\"",
        );
        let err = MaintainerConfig::from_toml(&text).unwrap_err();
        assert_eq!(err.to_string(), "milestone-freeze-date must be supplied");
    }

    #[test]
    fn test_rejects_empty_mode_map() {
        let text = VALID.replace("\"v1.8\" = \"slush\"\n\"v1.9\" = \"dev\"\n", "");
        let err = MaintainerConfig::from_toml(&text).unwrap_err();
        assert!(matches!(err, ConfigError::NoMilestones));
    }

    #[test]
    fn test_rejects_unknown_phases() {
        let text = VALID.replace("\"v1.8\" = \"slush\"", "\"v1.8\" = \"thaw\"");
        assert!(matches!(
            MaintainerConfig::from_toml(&text),
            Err(ConfigError::Parse(_))
        ));
    }
}
