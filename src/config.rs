// src/config.rs

use std::{env, path::PathBuf, str::FromStr};

use dotenvy::dotenv;
use thiserror::Error;

use crate::store::rules::RuleMatch;

/// Number of questions drawn for one exam.
pub const EXAM_QUESTION_COUNT: usize = 5;

/// Filler options shown before the stored correct answer.
pub const FILLER_OPTIONS: [&str; 3] = ["Option A", "Option B", "Option C"];

/// Placeholder `time_spent` range (seconds) for newly submitted attempts.
pub const TIME_SPENT_RANGE: std::ops::RangeInclusive<u32> = 15..=60;

/// How many attempts the dashboard lists under "recent".
pub const RECENT_ATTEMPTS_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub attempts_path: PathBuf,
    pub rules_path: PathBuf,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    /// Exam session lifetime in seconds.
    pub session_ttl: u64,
    pub rule_match: RuleMatch,
    pub bind_addr: String,
    pub rust_log: String,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        Ok(Self {
            attempts_path: PathBuf::from(var_or("ATTEMPTS_PATH", "processed_data.csv")),
            rules_path: PathBuf::from(var_or("RULES_PATH", "fp_growth_rules.csv")),
            jwt_secret,
            jwt_expiration: parse_or("JWT_EXPIRATION", 3600)?,
            session_ttl: parse_or("SESSION_TTL", 1800)?,
            rule_match: parse_or("RULE_MATCH", RuleMatch::Exact)?,
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000"),
            rust_log: var_or("RUST_LOG", "info"),
            log_dir: var_or("LOG_DIR", "logs"),
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}
