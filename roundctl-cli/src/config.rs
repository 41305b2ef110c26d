use std::env;
use std::path::PathBuf;
use std::time::Duration;

use roundctl_core::constants::DEFAULT_TICK_MILLIS;

const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STATE_DB: &str = ".roundctl/meta.db";

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the game backend API.
    pub api_url: String,
    /// Bearer token sent with every request, if any.
    pub api_token: Option<String>,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
    /// Round timer tick period.
    pub tick_interval: Duration,
    /// Periodic server clock re-sync. `None` keeps the startup offset.
    pub resync_interval: Option<Duration>,
    /// SQLite file holding the persisted round counter.
    pub state_db: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// - `ROUNDCTL_API_URL` (default `http://localhost:8000/api/v1`)
    /// - `ROUNDCTL_API_TOKEN` (optional)
    /// - `ROUNDCTL_HTTP_TIMEOUT_SECS` (default 10)
    /// - `ROUNDCTL_TICK_MS` (default 200)
    /// - `ROUNDCTL_RESYNC_SECS` (default 0, disabled)
    /// - `ROUNDCTL_STATE_DB` (default `.roundctl/meta.db`)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_u64 = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        let api_url = lookup("ROUNDCTL_API_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let api_token = lookup("ROUNDCTL_API_TOKEN").filter(|s| !s.trim().is_empty());

        let http_timeout = Duration::from_secs(
            parse_u64("ROUNDCTL_HTTP_TIMEOUT_SECS").unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        );

        let tick_interval = Duration::from_millis(
            parse_u64("ROUNDCTL_TICK_MS")
                .filter(|&ms| ms > 0)
                .unwrap_or(DEFAULT_TICK_MILLIS),
        );

        let resync_interval = parse_u64("ROUNDCTL_RESYNC_SECS")
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs);

        let state_db = lookup("ROUNDCTL_STATE_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DB));

        Self {
            api_url,
            api_token,
            http_timeout,
            tick_interval,
            resync_interval,
            state_db,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.api_token, None);
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.tick_interval, Duration::from_millis(200));
        assert_eq!(config.resync_interval, None);
        assert_eq!(config.state_db, PathBuf::from(".roundctl/meta.db"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("ROUNDCTL_API_URL", "https://game.example/api/v1"),
            ("ROUNDCTL_API_TOKEN", "secret"),
            ("ROUNDCTL_TICK_MS", "100"),
            ("ROUNDCTL_RESYNC_SECS", "300"),
        ]);
        assert_eq!(config.api_url, "https://game.example/api/v1");
        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(config.tick_interval, Duration::from_millis(100));
        assert_eq!(config.resync_interval, Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = config_from(&[
            ("ROUNDCTL_TICK_MS", "0"),
            ("ROUNDCTL_HTTP_TIMEOUT_SECS", "soon"),
            ("ROUNDCTL_RESYNC_SECS", "0"),
            ("ROUNDCTL_API_TOKEN", ""),
        ]);
        assert_eq!(config.tick_interval, Duration::from_millis(200));
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.resync_interval, None);
        assert_eq!(config.api_token, None);
    }
}
