use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DigestError;

/// An `owner/repo` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Canonical web URL of the repository.
    pub fn html_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoRef {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [owner, repo] if !owner.is_empty() && !repo.is_empty() => Ok(Self::new(*owner, *repo)),
            _ => Err(DigestError::InvalidInput(
                "repository must be in the format of owner/repo".to_string(),
            )),
        }
    }
}

/// A release as listed by the hosting platform, before cutoff filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRelease {
    pub tag_name: String,
    pub name: Option<String>,
    pub body: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub name: String,
    pub tag_name: String,
    pub body: String,
    pub published_at: DateTime<Utc>,
}

impl Release {
    /// Keeps the release only if it was published on or after `since`.
    pub fn published_since(raw: RawRelease, since: DateTime<Utc>) -> Option<Self> {
        let published_at = raw.published_at.filter(|at| *at >= since)?;
        Some(Self {
            name: raw.name.unwrap_or_default(),
            tag_name: raw.tag_name,
            body: raw.body.unwrap_or_default(),
            published_at,
        })
    }

    /// The name to show for the release, falling back to its tag.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.tag_name
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub labels: Vec<Label>,
}

// Issue search results cover pull requests too; the query decides which one we got.
impl From<Issue> for PullRequest {
    fn from(issue: Issue) -> Self {
        Self {
            number: issue.number,
            title: issue.title,
            body: issue.body,
            created_at: issue.created_at,
            labels: issue.labels,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Release,
    PullRequest,
    Issue,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityKind::Release => write!(f, "release"),
            ActivityKind::PullRequest => write!(f, "pull request"),
            ActivityKind::Issue => write!(f, "issue"),
        }
    }
}

/// A borrowed view of one activity item of any kind.
#[derive(Debug, Clone, Copy)]
pub enum ActivityRef<'a> {
    Release(&'a Release),
    PullRequest(&'a PullRequest),
    Issue(&'a Issue),
}

impl ActivityRef<'_> {
    pub fn kind(&self) -> ActivityKind {
        match self {
            ActivityRef::Release(_) => ActivityKind::Release,
            ActivityRef::PullRequest(_) => ActivityKind::PullRequest,
            ActivityRef::Issue(_) => ActivityKind::Issue,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ActivityRef::Release(release) => release.display_name(),
            ActivityRef::PullRequest(pr) => &pr.title,
            ActivityRef::Issue(issue) => &issue.title,
        }
    }
}

pub trait Activity {
    fn as_activity(&self) -> ActivityRef<'_>;
}

impl Activity for Release {
    fn as_activity(&self) -> ActivityRef<'_> {
        ActivityRef::Release(self)
    }
}

impl Activity for PullRequest {
    fn as_activity(&self) -> ActivityRef<'_> {
        ActivityRef::PullRequest(self)
    }
}

impl Activity for Issue {
    fn as_activity(&self) -> ActivityRef<'_> {
        ActivityRef::Issue(self)
    }
}
