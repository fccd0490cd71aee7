use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use crate::error::Result;
use crate::github::types::{Issue, PullRequest, Release, RepoRef};
use crate::github::HostingApi;

/// Raw items requested per page.
pub const PAGE_SIZE: u8 = 100;

/// The search API serves at most 1000 results, i.e. 10 pages of 100.
pub const MAX_SEARCH_PAGES: u32 = 10;

/// Bounded, cutoff-filtered listing of a repository's recent activity.
///
/// Every method returns at most `limit` items in the order the hosting platform
/// produced them.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Releases published on or after `since`.
    async fn fetch_releases(&self, repo: &RepoRef, since: DateTime<Utc>, limit: usize) -> Result<Vec<Release>>;

    /// Merged pull requests created on or after `since`.
    async fn fetch_merged_pull_requests(
        &self,
        repo: &RepoRef,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<PullRequest>>;

    /// Issues created on or after `since`, most-reacted first.
    async fn fetch_issues(&self, repo: &RepoRef, since: DateTime<Utc>, limit: usize) -> Result<Vec<Issue>>;
}

pub struct ActivityFetcher<H> {
    api: H,
}

impl<H: HostingApi> ActivityFetcher<H> {
    pub fn new(api: H) -> Self {
        Self { api }
    }

    /// Collects search results page by page until a page comes back empty,
    /// `limit` is reached, or the search window is exhausted.
    ///
    /// Page size says nothing about whether more pages exist: search pages are
    /// not guaranteed to be monotonic.
    async fn collect_search(&self, query: &str, limit: usize) -> Result<Vec<Issue>> {
        let mut items = Vec::new();
        if limit == 0 {
            return Ok(items);
        }

        for page in 1..=MAX_SEARCH_PAGES {
            let batch = self.api.search_issues(query, page, PAGE_SIZE).await?;
            debug!(query, page, count = batch.len(), "fetched search page");
            if batch.is_empty() {
                break;
            }

            items.extend(batch);
            if items.len() >= limit {
                break;
            }
        }

        items.truncate(limit);
        Ok(items)
    }
}

#[async_trait]
impl<H: HostingApi> ActivitySource for ActivityFetcher<H> {
    async fn fetch_releases(&self, repo: &RepoRef, since: DateTime<Utc>, limit: usize) -> Result<Vec<Release>> {
        let mut releases = Vec::new();
        if limit == 0 {
            return Ok(releases);
        }

        // Releases come newest first, so once a page has nothing recent, nothing later will.
        let mut page = 1;
        loop {
            let batch = self.api.list_releases(repo, page, PAGE_SIZE).await?;
            let fetched = batch.len();
            let recent: Vec<Release> = batch
                .into_iter()
                .filter_map(|raw| Release::published_since(raw, since))
                .collect();
            debug!(%repo, page, fetched, recent = recent.len(), "fetched release page");
            if recent.is_empty() {
                break;
            }

            releases.extend(recent);
            if releases.len() >= limit {
                break;
            }
            page += 1;
        }

        releases.truncate(limit);
        Ok(releases)
    }

    async fn fetch_merged_pull_requests(
        &self,
        repo: &RepoRef,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<PullRequest>> {
        let query = merged_pull_requests_query(repo, since);
        let items = self.collect_search(&query, limit).await?;
        Ok(items.into_iter().map(PullRequest::from).collect())
    }

    async fn fetch_issues(&self, repo: &RepoRef, since: DateTime<Utc>, limit: usize) -> Result<Vec<Issue>> {
        let query = issues_query(repo, since);
        self.collect_search(&query, limit).await
    }
}

fn cutoff(since: DateTime<Utc>) -> String {
    since.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn merged_pull_requests_query(repo: &RepoRef, since: DateTime<Utc>) -> String {
    format!("repo:{repo} created:>={} is:pr is:merged", cutoff(since))
}

// Ranked by reactions rather than recency; the cutoff still bounds creation time.
pub fn issues_query(repo: &RepoRef, since: DateTime<Utc>) -> String {
    format!("repo:{repo} created:>={} is:issue sort:reactions-+1-desc", cutoff(since))
}
