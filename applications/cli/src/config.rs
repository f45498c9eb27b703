/// Player configuration
use encore_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File read when `--config` is not given (skipped if absent)
pub const DEFAULT_CONFIG_FILE: &str = "encore.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Configuration file not found: {0}")]
    Missing(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SessionSettings {
    /// How long the event loop blocks on the engine per turn
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Fixed shuffle seed for reproducible queues
    #[serde(default)]
    pub shuffle_seed: Option<u64>,

    /// Print a status line when track or status changes
    #[serde(default = "default_announce")]
    pub announce: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            shuffle_seed: None,
            announce: default_announce(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_announce() -> bool {
    true
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `encore.toml` in the working
    /// directory is used when present. `ENCORE_` variables override both,
    /// with `__` between section and key (`ENCORE_PLAYBACK__HISTORY_SIZE=100`).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::Missing(path.to_path_buf()));
                }
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("ENCORE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let playback = &self.playback;
        if playback.history_size == 0 {
            return Err(ConfigError::Invalid(
                "playback.history_size must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&playback.initial_volume) {
            return Err(ConfigError::Invalid(format!(
                "playback.initial_volume must be within 0.0-1.0, got {}",
                playback.initial_volume
            )));
        }
        if playback.load_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "playback.load_timeout_ms must be positive".into(),
            ));
        }
        if playback.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "playback.tick_interval_ms must be positive".into(),
            ));
        }
        if playback.max_consecutive_failures == 0 {
            return Err(ConfigError::Invalid(
                "playback.max_consecutive_failures must be at least 1".into(),
            ));
        }
        if self.session.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "session.poll_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn toml_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_are_valid() {
        let config = CliConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.playback.history_size, 50);
        assert_eq!(config.session.poll_interval_ms, 50);
        assert!(config.session.announce);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let file = toml_file(
            r#"
            [playback]
            history_size = 10
            initial_volume = 0.5

            [session]
            shuffle_seed = 7
            "#,
        );

        let config = CliConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.playback.history_size, 10);
        assert_eq!(config.playback.initial_volume, 0.5);
        assert_eq!(config.playback.load_timeout_ms, 20_000);
        assert_eq!(config.session.shuffle_seed, Some(7));
        assert_eq!(config.session.poll_interval_ms, 50);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let result = CliConfig::load(Some(Path::new("/nonexistent/encore.toml")));
        assert!(matches!(result, Err(ConfigError::Missing(_))));
    }

    #[test]
    fn out_of_range_volume_is_rejected() {
        let file = toml_file("[playback]\ninitial_volume = 1.5\n");
        assert!(matches!(
            CliConfig::load(Some(file.path())),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn zero_history_is_rejected() {
        let mut config = CliConfig::default();
        config.playback.history_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let mut config = CliConfig::default();
        config.session.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }
}
