use async_trait::async_trait;
use serde::Serialize;

use super::prompts::{instruction, Locale};
use super::{CompletionRequest, TextGenerator};
use crate::aggregator::sanitizer::sanitize;
use crate::error::{DigestError, Result};
use crate::github::types::{ActivityKind, ActivityRef, Issue, PullRequest, Release, RepoRef};

pub const DEFAULT_MAX_TOKENS: u32 = 4000;

/// Turns one activity item into a short plain-text summary.
#[async_trait]
pub trait Summarize: Send + Sync {
    async fn summarize(&self, repo: &RepoRef, activity: ActivityRef<'_>) -> Result<String>;
}

#[derive(Serialize)]
struct ReleasePayload<'a> {
    name: &'a str,
    body: String,
}

#[derive(Serialize)]
struct ItemPayload<'a> {
    title: &'a str,
    body: String,
}

/// Request/response translator between activity items and a [`TextGenerator`].
pub struct Summarizer<G> {
    generator: G,
    locale: Locale,
    max_tokens: u32,
}

impl<G: TextGenerator> Summarizer<G> {
    pub fn new(generator: G, locale: Locale) -> Self {
        Self {
            generator,
            locale,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub async fn summarize_release(&self, repo: &RepoRef, release: &Release) -> Result<String> {
        let payload = ReleasePayload {
            name: &release.name,
            body: sanitize(&release.body),
        };
        self.generate(ActivityKind::Release, repo, &payload).await
    }

    pub async fn summarize_pull_request(&self, repo: &RepoRef, pull_request: &PullRequest) -> Result<String> {
        let payload = ItemPayload {
            title: &pull_request.title,
            body: sanitize(&pull_request.body),
        };
        self.generate(ActivityKind::PullRequest, repo, &payload).await
    }

    pub async fn summarize_issue(&self, repo: &RepoRef, issue: &Issue) -> Result<String> {
        let payload = ItemPayload {
            title: &issue.title,
            body: sanitize(&issue.body),
        };
        self.generate(ActivityKind::Issue, repo, &payload).await
    }

    async fn generate<P: Serialize + Sync>(&self, kind: ActivityKind, repo: &RepoRef, payload: &P) -> Result<String> {
        let user = serde_json::to_string(payload)
            .map_err(|e| DigestError::Summarization(format!("failed to encode {kind} payload: {e}")))?;
        let request = CompletionRequest {
            system: instruction(kind, self.locale, repo),
            user,
            max_tokens: self.max_tokens,
        };
        let summary = self.generator.complete(&request).await?;
        Ok(summary.trim().to_string())
    }
}

#[async_trait]
impl<G: TextGenerator> Summarize for Summarizer<G> {
    async fn summarize(&self, repo: &RepoRef, activity: ActivityRef<'_>) -> Result<String> {
        match activity {
            ActivityRef::Release(release) => self.summarize_release(repo, release).await,
            ActivityRef::PullRequest(pull_request) => self.summarize_pull_request(repo, pull_request).await,
            ActivityRef::Issue(issue) => self.summarize_issue(repo, issue).await,
        }
    }
}
