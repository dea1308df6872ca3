//! Startup configuration
//!
//! Read from the process environment after `.env` has been loaded.
//! Missing credentials are fatal: the process must not serve traffic
//! without them.

use crate::error::AgentError;
use crate::llm::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::notify::PUSHOVER_URL;
use crate::Result;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 8;

#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,

    pub pushover_token: String,
    pub pushover_user: String,
    pub pushover_url: String,

    pub persona_name: String,
    pub profile_path: PathBuf,
    pub biography_path: PathBuf,

    pub max_tool_iterations: usize,
    pub model_timeout: Duration,
    pub notify_timeout: Duration,
    pub port: u16,
}

impl Settings {
    /// Load `.env` (if present) and read settings from the environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let first = |keys: &[&str]| keys.iter().find_map(|key| get(*key));

        let required = |keys: &[&str]| {
            first(keys).ok_or_else(|| {
                AgentError::Config(format!("{} must be set", keys.join(" or ")))
            })
        };

        let number = |keys: &[&str], default| -> Result<u64> {
            match first(keys) {
                Some(raw) => parse_number(keys[0], &raw),
                None => Ok(default),
            }
        };

        Ok(Self {
            openai_api_key: required(&["OPENAI_API_KEY"])?,
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),

            pushover_token: required(&["PUSHOVER_TOKEN", "APP_KEY"])?,
            pushover_user: required(&["PUSHOVER_USER", "USER_KEY"])?,
            pushover_url: get("PUSHOVER_URL").unwrap_or_else(|| PUSHOVER_URL.to_string()),

            persona_name: required(&["PERSONA_NAME"])?,
            profile_path: get("PROFILE_PATH")
                .unwrap_or_else(|| "me/profile.txt".to_string())
                .into(),
            biography_path: get("BIOGRAPHY_PATH")
                .unwrap_or_else(|| "me/about.txt".to_string())
                .into(),

            max_tool_iterations: number(
                &["MAX_TOOL_ITERATIONS"],
                DEFAULT_MAX_TOOL_ITERATIONS as u64,
            )? as usize,
            model_timeout: Duration::from_secs(number(&["MODEL_TIMEOUT_SECS"], 60)?),
            notify_timeout: Duration::from_secs(number(&["NOTIFY_TIMEOUT_SECS"], 10)?),
            port: u16::try_from(number(&["PORT", "API_PORT"], 8080)?)
                .map_err(|_| AgentError::Config("PORT must fit in 16 bits".to_string()))?,
        })
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AgentError::Config(format!("{} must be a number, got '{}'", key, raw)))
}
