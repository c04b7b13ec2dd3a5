use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

const MIN_REFRESH_SECS: f64 = 0.25;

/// Optional settings read from `~/.config/tasktop/config.toml`.
/// The file is only read, never written.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub refresh_secs: f64,
    pub limit: usize,
    pub show_cpu_per_core: bool,
    pub status_secs: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            refresh_secs: 2.0,
            limit: 0,
            show_cpu_per_core: true,
            status_secs: 3.0,
        }
    }
}

impl Config {
    pub fn load() -> Config {
        let path = get_home_config();
        if !path.exists() {
            return Config::default();
        }
        match std::fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml(&contents).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), error = %err, "bad config, using defaults");
                Config::default()
            }),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "unreadable config");
                Config::default()
            }
        }
    }

    pub fn from_toml(contents: &str) -> Result<Config, toml::de::Error> {
        toml::from_str::<Config>(contents)
    }

    pub fn refresh_interval(&self) -> Duration {
        let secs = if self.refresh_secs.is_finite() {
            self.refresh_secs.max(MIN_REFRESH_SECS)
        } else {
            MIN_REFRESH_SECS
        };
        Duration::from_secs_f64(secs)
    }

    pub fn status_ttl(&self) -> Duration {
        if self.status_secs.is_finite() {
            Duration::from_secs_f64(self.status_secs.clamp(0., 60.))
        } else {
            Duration::ZERO
        }
    }
}

fn get_home_config() -> PathBuf {
    //home directory
    if let Some(mut dir) = dirs::home_dir() {
        dir.push(".config");
        dir.push("tasktop");
        dir.push("config.toml");
        return dir;
    }
    //should not happen, but just in case
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = Config::from_toml("limit = 30").unwrap();
        assert_eq!(config.limit, 30);
        assert_eq!(config.refresh_secs, 2.0);
        assert!(config.show_cpu_per_core);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(Config::from_toml("limit = \"many\"").is_err());
    }

    #[test]
    fn refresh_interval_has_a_floor() {
        let config = Config {
            refresh_secs: 0.01,
            ..Config::default()
        };
        assert_eq!(config.refresh_interval(), Duration::from_millis(250));
        let config = Config {
            refresh_secs: f64::NAN,
            ..Config::default()
        };
        assert_eq!(config.refresh_interval(), Duration::from_millis(250));
        assert_eq!(Config::default().refresh_interval(), Duration::from_secs(2));
    }
}
