use serde::{Deserialize, Serialize};

/// Optional TOML configuration file. Credentials are never read from here.
///
/// ```toml
/// repository = "octo/widgets"
/// locale = "ja"
/// days-ago = 14
///
/// [ai]
/// model = "openai/gpt-4.1-mini"
///
/// [limits]
/// issues = 5
///
/// [retry]
/// max-retries = 3
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub repository: Option<String>,
    pub github_api_url: Option<String>,
    pub locale: Option<String>,
    pub days_ago: Option<u32>,
    pub ai: AiFileConfig,
    pub limits: LimitsConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct AiFileConfig {
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct LimitsConfig {
    pub releases: Option<usize>,
    pub pull_requests: Option<usize>,
    pub issues: Option<usize>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RetryConfig {
    pub max_retries: Option<u32>,
    pub initial_delay_ms: Option<u64>,
    /// Pause between consecutive summarization requests.
    pub pause_ms: Option<u64>,
}
