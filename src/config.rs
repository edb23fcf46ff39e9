use std::env;

use crate::core::error::RelayError;

const DEFAULT_MODEL: &str = "mistralai/mistral-7b-instruct";
const DEFAULT_AUDIT_LOG_FILE: &str = "message_logs.txt";

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub db: u32,
    pub password: String,
}

impl RedisConfig {
    pub fn url(&self) -> String {
        format!(
            "redis://:{}@{}:{}/{}",
            self.password, self.host, self.port, self.db
        )
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_token: String,
    pub openrouter_api_key: String,
    /// Model identifier sent verbatim in every completion request.
    pub openrouter_model: String,
    /// Optional system turn seeded at the start of each fresh conversation.
    pub system_prompt: Option<String>,
    /// Empty means every user is allowed.
    pub allowed_users: Vec<i64>,
    pub redis: RedisConfig,
    pub audit_log_file: String,
}

impl Config {
    /// Reads configuration from the environment. Call `dotenvy::dotenv()`
    /// first so a local `.env` file is honored.
    pub fn from_env() -> Result<Self, RelayError> {
        let telegram_token = env::var("TELEGRAM_BOT_TOKEN").ok();
        let openrouter_api_key = env::var("OPENROUTER_API_KEY").ok();
        let redis_pass = env::var("REDIS_PASS").ok();

        let mut missing = Vec::new();
        if telegram_token.as_deref().is_none_or(str::is_empty) {
            missing.push("TELEGRAM_BOT_TOKEN");
        }
        if openrouter_api_key.as_deref().is_none_or(str::is_empty) {
            missing.push("OPENROUTER_API_KEY");
        }
        if redis_pass.as_deref().is_none_or(str::is_empty) {
            missing.push("REDIS_PASS");
        }
        if !missing.is_empty() {
            return Err(RelayError::Config(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let redis = RedisConfig {
            host: env::var("REDIS_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: parse_var("REDIS_PORT", 6379)?,
            db: parse_var("REDIS_DB", 0)?,
            password: redis_pass.unwrap_or_default(),
        };

        Ok(Self {
            telegram_token: telegram_token.unwrap_or_default(),
            openrouter_api_key: openrouter_api_key.unwrap_or_default(),
            openrouter_model: env::var("OPENROUTER_MODEL")
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            system_prompt: env::var("SYSTEM_PROMPT").ok().filter(|p| !p.is_empty()),
            allowed_users: env::var("ALLOWED_USERS")
                .map(|v| parse_allowed_users(&v))
                .unwrap_or_default(),
            redis,
            audit_log_file: env::var("MESSAGE_LOG_FILE")
                .unwrap_or_else(|_| DEFAULT_AUDIT_LOG_FILE.to_string()),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, RelayError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => value
            .parse()
            .map_err(|_| RelayError::Config(format!("Invalid value for {}: {}", name, value))),
        _ => Ok(default),
    }
}

/// Comma-separated user id list; entries that do not parse are skipped.
fn parse_allowed_users(raw: &str) -> Vec<i64> {
    raw.split(',')
        .filter_map(|entry| entry.trim().parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_users_skips_malformed_entries() {
        assert_eq!(
            parse_allowed_users("123, 456,abc, ,789"),
            vec![123, 456, 789]
        );
        assert!(parse_allowed_users("").is_empty());
    }

    #[test]
    fn redis_url_carries_all_connection_parameters() {
        let redis = RedisConfig {
            host: "cache.internal".to_string(),
            port: 6380,
            db: 2,
            password: "hunter2".to_string(),
        };
        assert_eq!(redis.url(), "redis://:hunter2@cache.internal:6380/2");
    }
}
