use secrecy::SecretString;
use std::env;

use crate::models::domain::ProgressSettings;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub api_token: Option<SecretString>,
    pub guest_store_dir: String,
    pub sync_enabled: bool,
    pub ping_interval_secs: u64,
    pub pong_timeout_secs: u64,
    pub persistence_timeout_secs: u64,
    pub default_progress: ProgressSettings,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            api_base_url: env::var("QUIZ_API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080/api".to_string()),
            api_token: env::var("QUIZ_API_TOKEN").ok().map(SecretString::from),
            guest_store_dir: env::var("QUIZ_GUEST_STORE_DIR")
                .unwrap_or_else(|_| ".quiz-sessions".to_string()),
            sync_enabled: env::var("QUIZ_SYNC_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            ping_interval_secs: env::var("QUIZ_PING_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            pong_timeout_secs: env::var("QUIZ_PONG_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            persistence_timeout_secs: env::var("QUIZ_PERSISTENCE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            default_progress: ProgressSettings {
                initial_reoccurrences: env::var("QUIZ_INITIAL_REOCCURRENCES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1),
                wrong_answer_reoccurrences: env::var("QUIZ_WRONG_ANSWER_REOCCURRENCES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1),
            },
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            api_token: None,
            guest_store_dir: ".quiz-sessions-test".to_string(),
            sync_enabled: true,
            ping_interval_secs: 1,
            pong_timeout_secs: 2,
            persistence_timeout_secs: 2,
            default_progress: ProgressSettings {
                initial_reoccurrences: 1,
                wrong_answer_reoccurrences: 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_with_defaults() {
        let config = Config::from_env();

        assert!(!config.api_base_url.is_empty());
        assert!(config.ping_interval_secs > 0);
        assert!(config.pong_timeout_secs >= config.ping_interval_secs);
        assert!(config.default_progress.initial_reoccurrences >= 1);
    }

    #[test]
    fn test_test_config() {
        let config = Config::test_config();

        assert_eq!(config.guest_store_dir, ".quiz-sessions-test");
        assert!(config.sync_enabled);
        assert_eq!(config.default_progress.wrong_answer_reoccurrences, 1);
    }
}
