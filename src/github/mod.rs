pub mod client;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use types::{Issue, RawRelease, RepoRef};

pub use client::GitHubClient;

/// Page-level access to the hosting platform.
///
/// Pages are 1-based. Implementations return the page exactly as the platform
/// ordered it and never retry.
#[async_trait]
pub trait HostingApi: Send + Sync {
    async fn list_releases(&self, repo: &RepoRef, page: u32, per_page: u8) -> Result<Vec<RawRelease>>;

    /// Runs an issue search; results include pull requests when the query asks for them.
    async fn search_issues(&self, query: &str, page: u32, per_page: u8) -> Result<Vec<Issue>>;
}
