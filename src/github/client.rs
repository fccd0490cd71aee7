use async_trait::async_trait;
use octocrab::models;
use octocrab::Octocrab;

use super::types::{Issue, Label, RawRelease, RepoRef};
use super::HostingApi;
use crate::error::{DigestError, Result};

pub struct GitHubClient {
    client: Octocrab,
}

impl GitHubClient {
    pub fn new(token: String, base_uri: Option<&str>) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token);
        if let Some(base_uri) = base_uri {
            builder = builder
                .base_uri(base_uri)
                .map_err(|e| DigestError::InvalidInput(format!("invalid GitHub API URL {base_uri}: {e}")))?;
        }
        let client = builder
            .build()
            .map_err(|e| DigestError::Fetch(format!("failed to create GitHub client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HostingApi for GitHubClient {
    async fn list_releases(&self, repo: &RepoRef, page: u32, per_page: u8) -> Result<Vec<RawRelease>> {
        let releases = self
            .client
            .repos(&repo.owner, &repo.repo)
            .releases()
            .list()
            .per_page(per_page)
            .page(page)
            .send()
            .await
            .map_err(|e| DigestError::Fetch(format!("failed to list releases of {repo} (page {page}): {e}")))?;

        Ok(releases.items.into_iter().map(to_raw_release).collect())
    }

    async fn search_issues(&self, query: &str, page: u32, per_page: u8) -> Result<Vec<Issue>> {
        let results = self
            .client
            .search()
            .issues_and_pull_requests(query)
            .per_page(per_page)
            .page(page)
            .send()
            .await
            .map_err(|e| DigestError::Fetch(format!("failed to search `{query}` (page {page}): {e}")))?;

        Ok(results.items.into_iter().map(to_issue).collect())
    }
}

fn to_raw_release(release: models::repos::Release) -> RawRelease {
    RawRelease {
        tag_name: release.tag_name,
        name: release.name,
        body: release.body,
        published_at: release.published_at,
    }
}

fn to_issue(issue: models::issues::Issue) -> Issue {
    Issue {
        number: issue.number,
        title: issue.title,
        body: issue.body.unwrap_or_default(),
        created_at: issue.created_at,
        labels: issue
            .labels
            .into_iter()
            .map(|label| Label {
                name: label.name,
                color: label.color,
            })
            .collect(),
    }
}
