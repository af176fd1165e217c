use std::env;
use std::time::Duration;

use tracing::warn;

pub const CHECK_MODEL_ENV: &str = "LEXED_CHECK_MODEL";
pub const GENERATION_MODEL_ENV: &str = "LEXED_GENERATION_MODEL";
pub const REQUEST_TIMEOUT_ENV: &str = "LEXED_REQUEST_TIMEOUT_SECS";

const DEFAULT_CHECK_MODEL: &str = "gpt-4o-mini";
const DEFAULT_GENERATION_MODEL: &str = "gpt-4o";
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 300;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Models and limits used by [`super::OpenAiService`].
///
/// Checking, correcting and explaining go to `check_model`; synthesizing
/// practice sentences goes to `generation_model`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub check_model: String,
    pub generation_model: String,
    pub max_output_tokens: u32,
    pub request_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            check_model: DEFAULT_CHECK_MODEL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(model) = non_empty(CHECK_MODEL_ENV) {
            config.check_model = model;
        }
        if let Some(model) = non_empty(GENERATION_MODEL_ENV) {
            config.generation_model = model;
        }
        if let Some(raw) = non_empty(REQUEST_TIMEOUT_ENV) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => warn!(value = %raw, "ignoring invalid {REQUEST_TIMEOUT_ENV}"),
            }
        }
        config
    }
}
