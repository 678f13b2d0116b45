//! Command-line and environment configuration

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::player::PlayerConfig;

pub const DEFAULT_API_BASE_URL: &str = "https://api-v2.hearthis.at";

/// Terminal music player for the hearthis catalog
#[derive(Parser, Debug, Clone)]
#[command(name = "musify-rs")]
#[command(about = "Terminal music player for the hearthis catalog")]
#[command(version)]
pub struct AppConfig {
    /// Base URL of the catalog API
    #[arg(long, default_value = DEFAULT_API_BASE_URL, env = "MUSIFY_API_BASE_URL")]
    pub api_base_url: String,

    /// Directory for the rolling log files
    #[arg(long, default_value = ".logs", env = "MUSIFY_LOG_DIR")]
    pub log_dir: PathBuf,

    /// Position sampling period while playing, in milliseconds
    #[arg(long, default_value_t = 250, value_parser = clap::value_parser!(u64).range(10..))]
    pub position_interval_ms: u64,

    /// How long the engine subscription survives its last observer, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub replay_grace_ms: u64,

    /// Seconds before an error notification is dismissed automatically
    #[arg(long, default_value_t = 5)]
    pub error_timeout_secs: u64,
}

impl AppConfig {
    pub fn player_config(&self) -> PlayerConfig {
        PlayerConfig {
            position_interval: Duration::from_millis(self.position_interval_ms),
            replay_grace: Duration::from_millis(self.replay_grace_ms),
        }
    }

    pub fn error_timeout(&self) -> Duration {
        Duration::from_secs(self.error_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_player_defaults() {
        let config = AppConfig::try_parse_from(["musify-rs"]).unwrap();

        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.log_dir, PathBuf::from(".logs"));
        let player = config.player_config();
        assert_eq!(player.position_interval, PlayerConfig::default().position_interval);
        assert_eq!(player.replay_grace, PlayerConfig::default().replay_grace);
        assert_eq!(config.error_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn flags_override_defaults() {
        let config = AppConfig::try_parse_from([
            "musify-rs",
            "--api-base-url",
            "http://localhost:8080",
            "--position-interval-ms",
            "100",
            "--replay-grace-ms",
            "0",
        ])
        .unwrap();

        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.player_config().position_interval, Duration::from_millis(100));
        assert_eq!(config.player_config().replay_grace, Duration::ZERO);
    }

    #[test]
    fn rejects_too_small_interval() {
        assert!(AppConfig::try_parse_from(["musify-rs", "--position-interval-ms", "1"]).is_err());
    }
}
