//! Application-level configuration loading, including the game rules set.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BLIND_POOL_BACK_CONFIG_PATH";

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    rules: GameRules,
}

/// Tunable parameters of one game round.
#[derive(Debug, Clone, Copy)]
pub struct GameRules {
    /// Budget each player must split between the two assets.
    pub total_budget: u32,
    /// Growth applied to the pooled asset before the even split.
    pub multiplier: f64,
    /// Minimum roster size required to start a round.
    pub min_players: usize,
    /// Hard cap on the roster size at join time.
    pub max_players: usize,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            total_budget: 100,
            multiplier: 1.5,
            min_players: 2,
            max_players: 4,
        }
    }
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in default rules.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        rules = ?app_config.rules,
                        "loaded game rules from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Current game rules.
    pub fn rules(&self) -> GameRules {
        self.rules
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rules: GameRules::default(),
        }
    }
}

/// JSON representation of the configuration file located at
/// [`DEFAULT_CONFIG_PATH`].
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    total_budget: Option<u32>,
    #[serde(default)]
    multiplier: Option<f64>,
    #[serde(default)]
    min_players: Option<usize>,
    #[serde(default)]
    max_players: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = GameRules::default();
        Self {
            rules: GameRules {
                total_budget: value.total_budget.unwrap_or(defaults.total_budget),
                multiplier: value.multiplier.unwrap_or(defaults.multiplier),
                min_players: value.min_players.unwrap_or(defaults.min_players),
                max_players: value.max_players.unwrap_or(defaults.max_players),
            },
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_game_constants() {
        let rules = AppConfig::default().rules();
        assert_eq!(rules.total_budget, 100);
        assert_eq!(rules.multiplier, 1.5);
        assert_eq!(rules.min_players, 2);
        assert_eq!(rules.max_players, 4);
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let raw: RawConfig = serde_json::from_str(r#"{"max_players": 3}"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.rules().max_players, 3);
        assert_eq!(config.rules().total_budget, 100);
    }
}
