use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, info_span, Instrument};

use super::activity_fetcher::ActivitySource;
use super::report_generator::{Report, ReportGenerator};
use crate::ai::Summarize;
use crate::error::Result;
use crate::github::types::{Activity, ActivityKind, Issue, PullRequest, Release, RepoRef};
use crate::retry::{run_with_backoff, BackoffPolicy};

/// Per-kind caps on how many items make it into the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub releases: usize,
    pub pull_requests: usize,
    pub issues: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            releases: 10,
            pull_requests: 10,
            issues: 10,
        }
    }
}

/// What to digest: which repository, from when, and how much.
#[derive(Debug, Clone)]
pub struct DigestRequest {
    pub repo: RepoRef,
    pub since: DateTime<Utc>,
    pub limits: Limits,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summarized<T> {
    pub item: T,
    pub summary: String,
}

/// Summarized items per section, in retrieval order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Digest {
    pub releases: Vec<Summarized<Release>>,
    pub pull_requests: Vec<Summarized<PullRequest>>,
    pub issues: Vec<Summarized<Issue>>,
}

/// Drives one run: fetch each kind, summarize every item in order, render.
///
/// Items are summarized strictly one after another. Any error that survives
/// the backoff aborts the whole run.
pub struct ReportAssembler<S, Z> {
    source: S,
    summarizer: Z,
    generator: ReportGenerator,
    backoff: BackoffPolicy,
    pause: Duration,
}

impl<S: ActivitySource, Z: Summarize> ReportAssembler<S, Z> {
    pub fn new(source: S, summarizer: Z, generator: ReportGenerator) -> Self {
        Self {
            source,
            summarizer,
            generator,
            backoff: BackoffPolicy::default(),
            pause: Duration::ZERO,
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Wait between consecutive summarization requests of a section.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub async fn assemble(&self, request: &DigestRequest) -> Result<Report> {
        let digest = self.collect(request).await?;
        self.generator.generate(&request.repo, &digest)
    }

    pub async fn collect(&self, request: &DigestRequest) -> Result<Digest> {
        let repo = &request.repo;

        let releases = self
            .source
            .fetch_releases(repo, request.since, request.limits.releases)
            .instrument(info_span!("fetch", kind = %ActivityKind::Release))
            .await?;
        info!("Found {} releases", releases.len());
        let releases = self.summarize_section(repo, ActivityKind::Release, releases).await?;

        let pull_requests = self
            .source
            .fetch_merged_pull_requests(repo, request.since, request.limits.pull_requests)
            .instrument(info_span!("fetch", kind = %ActivityKind::PullRequest))
            .await?;
        info!("Found {} pull requests", pull_requests.len());
        let pull_requests = self
            .summarize_section(repo, ActivityKind::PullRequest, pull_requests)
            .await?;

        let issues = self
            .source
            .fetch_issues(repo, request.since, request.limits.issues)
            .instrument(info_span!("fetch", kind = %ActivityKind::Issue))
            .await?;
        info!("Found {} issues", issues.len());
        let issues = self.summarize_section(repo, ActivityKind::Issue, issues).await?;

        Ok(Digest {
            releases,
            pull_requests,
            issues,
        })
    }

    async fn summarize_section<T: Activity + Send + Sync>(
        &self,
        repo: &RepoRef,
        kind: ActivityKind,
        items: Vec<T>,
    ) -> Result<Vec<Summarized<T>>> {
        let mut summarized = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            if index > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }

            let activity = item.as_activity();
            let span = info_span!("summarize", %kind, title = activity.title());
            let summary = run_with_backoff(&self.backoff, || self.summarizer.summarize(repo, activity))
                .instrument(span)
                .await?;
            debug!(%kind, title = activity.title(), %summary, "summarized");

            summarized.push(Summarized { item, summary });
        }
        Ok(summarized)
    }
}
