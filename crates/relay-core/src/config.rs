use std::{env, fs, path::Path, time::Duration};

use crate::{
    errors::Error,
    messaging::throttled::ThrottleConfig,
    security::{DEFAULT_TOKEN_LENGTH, MIN_TOKEN_LENGTH},
    Result,
};

/// Typed configuration, read from the environment (and `.env` when present).
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,

    // Storage
    pub database_url: String,

    // HTTP
    pub http_address: String,
    /// Bound on the recipient lookup of one request and on each outbound Telegram send.
    pub http_timeout: Duration,

    // Logging
    pub log_level: String,

    // Companies
    pub token_length: usize,

    // Delivery pacing
    pub throttle: ThrottleConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the process env in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").ok_or_else(|| {
            Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })?;

        let database_url =
            get("DATABASE_URL").unwrap_or_else(|| "sqlite://webhook-relay.db?mode=rwc".to_string());
        let http_address = get("HTTP_ADDRESS").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let http_timeout = Duration::from_millis(parse_u64(&get, "HTTP_TIMEOUT_MS")?.unwrap_or(4000));
        let log_level = get("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let token_length = parse_u64(&get, "TOKEN_LENGTH")?
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_TOKEN_LENGTH);
        if token_length < MIN_TOKEN_LENGTH {
            return Err(Error::Config(format!(
                "TOKEN_LENGTH must be at least {MIN_TOKEN_LENGTH}"
            )));
        }

        let defaults = ThrottleConfig::default();
        let throttle = ThrottleConfig {
            global_min_interval: parse_u64(&get, "DELIVERY_GLOBAL_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.global_min_interval),
            per_chat_min_interval: parse_u64(&get, "DELIVERY_PER_CHAT_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.per_chat_min_interval),
        };

        Ok(Self {
            telegram_bot_token,
            database_url,
            http_address,
            http_timeout,
            log_level,
            token_length,
            throttle,
        })
    }
}

fn parse_u64(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    let Some(raw) = get(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = load(&[("TELEGRAM_BOT_TOKEN", "123:abc")]).unwrap();
        assert_eq!(cfg.telegram_bot_token, "123:abc");
        assert_eq!(cfg.http_address, "127.0.0.1:8080");
        assert_eq!(cfg.http_timeout, Duration::from_secs(4));
        assert_eq!(cfg.token_length, 30);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.throttle.per_chat_min_interval, Duration::from_millis(1050));
    }

    #[test]
    fn bot_token_is_required() {
        let err = load(&[("TELEGRAM_BOT_TOKEN", "  ")]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = load(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("HTTP_ADDRESS", "0.0.0.0:9000"),
            ("HTTP_TIMEOUT_MS", "250"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("TOKEN_LENGTH", "40"),
            ("DELIVERY_GLOBAL_INTERVAL_MS", "0"),
        ])
        .unwrap();
        assert_eq!(cfg.http_address, "0.0.0.0:9000");
        assert_eq!(cfg.http_timeout, Duration::from_millis(250));
        assert_eq!(cfg.database_url, "sqlite::memory:");
        assert_eq!(cfg.token_length, 40);
        assert_eq!(cfg.throttle.global_min_interval, Duration::ZERO);
    }

    #[test]
    fn bad_numbers_are_config_errors() {
        assert!(load(&[("TELEGRAM_BOT_TOKEN", "t"), ("HTTP_TIMEOUT_MS", "soon")]).is_err());
        assert!(load(&[("TELEGRAM_BOT_TOKEN", "t"), ("TOKEN_LENGTH", "8")]).is_err());
    }
}
