//! Walk-mode configuration.
//!
//! Settings resolve through a chain, first value wins:
//!
//! 1. command-line flags
//! 2. the `[walk]` table in `~/.stroll/config.toml`
//! 3. the documented defaults
//!
//! Tuning values are never fatal. Anything non-numeric or out of range is
//! replaced by its default and reported as a [`ConfigError::Invalid`].

use std::{fmt, fs, io, path::Path, path::PathBuf};

use jiff::SignedDuration;
use log::warn;
use serde::Deserialize;

use crate::{geo::DEFAULT_WALK_MPS, model::TargetMode, position::PowerMode};

pub const DEFAULT_RADIUS_M: u32 = 60;
pub const DEFAULT_COOLDOWN_SECS: u32 = 35;
pub const DEFAULT_OFF_ROUTE_M: u32 = 150;

/// Errors that can occur while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {field} '{value}', using default")]
    Invalid { field: &'static str, value: String },

    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Normalized walk-mode tuning. Every field holds a usable value.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkConfig {
    /// Geofence radius in whole meters.
    pub radius_m: u32,

    /// Minimum time between auto-advances, in whole seconds.
    pub cooldown_secs: u32,

    pub target: TargetMode,

    /// Assumed walking speed in m/s.
    pub speed_mps: f64,

    pub power_saving: bool,

    /// Distance from the route line beyond which the walker is off route.
    pub off_route_m: u32,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            radius_m: DEFAULT_RADIUS_M,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            target: TargetMode::default(),
            speed_mps: DEFAULT_WALK_MPS,
            power_saving: false,
            off_route_m: DEFAULT_OFF_ROUTE_M,
        }
    }
}

impl WalkConfig {
    pub fn cooldown(&self) -> SignedDuration {
        SignedDuration::from_secs(i64::from(self.cooldown_secs))
    }

    pub fn power_mode(&self) -> PowerMode {
        if self.power_saving {
            PowerMode::PowerSaving
        } else {
            PowerMode::HighAccuracy
        }
    }
}

/// A raw tuning value as typed by a user: a number or free text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Setting {
    Number(f64),
    Text(String),
}

impl Setting {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Setting {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Unvalidated walk settings from one layer of the resolution chain.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WalkSettings {
    pub radius: Option<Setting>,
    pub cooldown: Option<Setting>,
    pub target: Option<String>,
    pub speed: Option<Setting>,
    pub power_saving: Option<bool>,
    pub off_route: Option<Setting>,
}

impl WalkSettings {
    /// Fills unset values from `fallback`.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            radius: self.radius.or(fallback.radius),
            cooldown: self.cooldown.or(fallback.cooldown),
            target: self.target.or(fallback.target),
            speed: self.speed.or(fallback.speed),
            power_saving: self.power_saving.or(fallback.power_saving),
            off_route: self.off_route.or(fallback.off_route),
        }
    }

    /// Resolves every setting to a usable value.
    ///
    /// Invalid values fall back to their defaults; each one is logged and
    /// returned so a caller can surface it.
    pub fn normalize(&self) -> (WalkConfig, Vec<ConfigError>) {
        let mut issues = Vec::new();

        let radius_m = positive_whole("radius", self.radius.as_ref(), DEFAULT_RADIUS_M, &mut issues);
        let cooldown_secs = positive_whole(
            "cooldown",
            self.cooldown.as_ref(),
            DEFAULT_COOLDOWN_SECS,
            &mut issues,
        );
        let off_route_m = positive_whole(
            "off-route",
            self.off_route.as_ref(),
            DEFAULT_OFF_ROUTE_M,
            &mut issues,
        );

        let speed_mps = match &self.speed {
            None => DEFAULT_WALK_MPS,
            Some(raw) => match raw.as_f64() {
                Some(v) if v.is_finite() && v > 0.0 => v,
                _ => {
                    issues.push(invalid("speed", raw));
                    DEFAULT_WALK_MPS
                }
            },
        };

        let target = match &self.target {
            None => TargetMode::default(),
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                issues.push(ConfigError::Invalid {
                    field: "target",
                    value: raw.clone(),
                });
                TargetMode::default()
            }),
        };

        for issue in &issues {
            warn!("{issue}");
        }

        let config = WalkConfig {
            radius_m,
            cooldown_secs,
            target,
            speed_mps,
            power_saving: self.power_saving.unwrap_or(false),
            off_route_m,
        };
        (config, issues)
    }
}

fn invalid(field: &'static str, raw: &Setting) -> ConfigError {
    ConfigError::Invalid {
        field,
        value: raw.to_string(),
    }
}

/// A whole number of at least one. Fractions are truncated.
fn positive_whole(
    field: &'static str,
    raw: Option<&Setting>,
    default: u32,
    issues: &mut Vec<ConfigError>,
) -> u32 {
    let Some(raw) = raw else {
        return default;
    };
    match raw.as_f64().map(f64::trunc) {
        Some(v) if (1.0..=f64::from(u32::MAX)).contains(&v) => v as u32,
        _ => {
            issues.push(invalid(field, raw));
            default
        }
    }
}

/// The stroll config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub walk: WalkSettings,
}

impl Config {
    /// Loads `~/.stroll/config.toml`. A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads a config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The config file path: `~/.stroll/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".stroll").join("config.toml"))
    }
}
