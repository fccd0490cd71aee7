pub mod types;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::path::Path;
use std::time::Duration;

use crate::aggregator::{DigestRequest, Limits};
use crate::ai::client::{AiConfig, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};
use crate::ai::summarizer::DEFAULT_MAX_TOKENS;
use crate::ai::Locale;
use crate::error::{DigestError, Result};
use crate::github::types::RepoRef;
use crate::retry::BackoffPolicy;

pub use types::Config;

pub const DEFAULT_DAYS_AGO: u32 = 7;
pub const DEFAULT_PAUSE: Duration = Duration::from_millis(5000);

pub fn load(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| DigestError::InvalidInput(format!("invalid config file {}: {e}", path.display())))
}

/// Raw, string-typed run inputs as they arrive from the command line or the
/// environment, before validation.
#[derive(Debug, Default, Clone)]
pub struct Inputs {
    pub repository: Option<String>,
    pub github_token: Option<String>,
    pub github_api_url: Option<String>,
    pub ai_model: Option<String>,
    pub ai_api_key: Option<String>,
    pub ai_api_endpoint: Option<String>,
    pub locale: Option<String>,
    pub days_ago: Option<u32>,
    pub releases_limit: Option<usize>,
    pub pull_requests_limit: Option<usize>,
    pub issues_limit: Option<usize>,
    pub max_retries: Option<u32>,
    pub initial_delay_ms: Option<u64>,
    pub pause_ms: Option<u64>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
}

/// Everything needed to list activity.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub token: String,
    pub api_url: Option<String>,
    pub request: DigestRequest,
}

/// Everything needed for a full digest run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: SourceSettings,
    pub ai: AiConfig,
    pub locale: Locale,
    pub max_tokens: u32,
    pub backoff: BackoffPolicy,
    pub pause: Duration,
}

impl Inputs {
    /// Fills every input not given explicitly from the config file.
    pub fn with_file_defaults(self, file: &Config) -> Self {
        Self {
            repository: self.repository.or_else(|| file.repository.clone()),
            github_api_url: self.github_api_url.or_else(|| file.github_api_url.clone()),
            ai_model: self.ai_model.or_else(|| file.ai.model.clone()),
            ai_api_endpoint: self.ai_api_endpoint.or_else(|| file.ai.endpoint.clone()),
            locale: self.locale.or_else(|| file.locale.clone()),
            days_ago: self.days_ago.or(file.days_ago),
            releases_limit: self.releases_limit.or(file.limits.releases),
            pull_requests_limit: self.pull_requests_limit.or(file.limits.pull_requests),
            issues_limit: self.issues_limit.or(file.limits.issues),
            max_retries: self.max_retries.or(file.retry.max_retries),
            initial_delay_ms: self.initial_delay_ms.or(file.retry.initial_delay_ms),
            pause_ms: self.pause_ms.or(file.retry.pause_ms),
            max_tokens: self.max_tokens.or(file.ai.max_tokens),
            timeout_secs: self.timeout_secs.or(file.ai.timeout_secs),
            ..self
        }
    }

    pub fn validate_source(&self, now: DateTime<Utc>) -> Result<SourceSettings> {
        let repo: RepoRef = required(&self.repository, "repository")?.parse()?;
        let token = required(&self.github_token, "github-token")?;
        let days_ago = self.days_ago.unwrap_or(DEFAULT_DAYS_AGO);
        let since = ChronoDuration::try_days(i64::from(days_ago))
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| DigestError::InvalidInput(format!("days-ago is out of range: {days_ago}")))?;
        let defaults = Limits::default();

        Ok(SourceSettings {
            token,
            api_url: optional(&self.github_api_url),
            request: DigestRequest {
                repo,
                since,
                limits: Limits {
                    releases: self.releases_limit.unwrap_or(defaults.releases),
                    pull_requests: self.pull_requests_limit.unwrap_or(defaults.pull_requests),
                    issues: self.issues_limit.unwrap_or(defaults.issues),
                },
            },
        })
    }

    pub fn validate(&self, now: DateTime<Utc>) -> Result<Settings> {
        let source = self.validate_source(now)?;
        let locale = match optional(&self.locale) {
            Some(locale) => locale.parse()?,
            None => Locale::default(),
        };
        let ai = AiConfig {
            model: required(&self.ai_model, "ai-model")?,
            api_key: required(&self.ai_api_key, "ai-api-key")?,
            endpoint: optional(&self.ai_api_endpoint).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            timeout: self.timeout_secs.map_or(DEFAULT_TIMEOUT, Duration::from_secs),
        };
        let defaults = BackoffPolicy::default();

        Ok(Settings {
            source,
            ai,
            locale,
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            backoff: BackoffPolicy {
                max_retries: self.max_retries.unwrap_or(defaults.max_retries),
                initial_delay: self
                    .initial_delay_ms
                    .map_or(defaults.initial_delay, Duration::from_millis),
            },
            pause: self.pause_ms.map_or(DEFAULT_PAUSE, Duration::from_millis),
        })
    }
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required(value: &Option<String>, name: &str) -> Result<String> {
    optional(value).ok_or_else(|| DigestError::InvalidInput(format!("Input required and not supplied: {name}")))
}
