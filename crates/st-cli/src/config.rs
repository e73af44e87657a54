//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Deserializer, Serialize};
use st_core::IdleThreshold;

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Longest gap, in minutes, a single pair of events may contribute.
    /// Missing, non-numeric or non-positive values mean 15 minutes.
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub max_idle_minutes: Option<f64>,

    /// Workspace folders treated as open when tracking starts.
    #[serde(default)]
    pub folders: Vec<PathBuf>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("max_idle_minutes", &self.max_idle_minutes)
            .field("folders", &self.folders)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("spacetime.db"),
            max_idle_minutes: None,
            folders: Vec::new(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (SPACETIME_*)
        figment = figment.merge(Env::prefixed("SPACETIME_"));

        figment.extract()
    }

    /// The configured idle threshold, with the default substituted as needed.
    pub fn idle_threshold(&self) -> IdleThreshold {
        IdleThreshold::from_minutes(self.max_idle_minutes)
    }
}

/// Accepts any value for the idle setting, keeping only numbers.
fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Number(f64),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Lenient>::deserialize(deserializer)? {
        Some(Lenient::Number(minutes)) => Some(minutes),
        Some(Lenient::Other(_)) | None => None,
    })
}

/// Returns the platform-specific config directory for spacetime.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("spacetime"))
}

/// Returns the platform-specific data directory for spacetime.
///
/// On Linux: `~/.local/share/spacetime`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("spacetime"))
}
