use std::sync::{Arc, Mutex};
use std::time::Duration;

use activity_digest::aggregator::{
    ActivityFetcher, ActivitySource, DigestRequest, Limits, ReportAssembler, ReportGenerator,
};
use activity_digest::ai::{CompletionRequest, Locale, Summarize, Summarizer, TextGenerator};
use activity_digest::github::types::{ActivityRef, Issue, Label, PullRequest, RawRelease, Release, RepoRef};
use activity_digest::github::HostingApi;
use activity_digest::retry::BackoffPolicy;
use activity_digest::{DigestError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use pretty_assertions::assert_eq;

fn since() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

fn request() -> DigestRequest {
    DigestRequest {
        repo: RepoRef::new("octo", "widgets"),
        since: since(),
        limits: Limits::default(),
    }
}

fn release(tag: &str, day: u32) -> Release {
    Release {
        name: format!("Widgets {tag}"),
        tag_name: tag.to_string(),
        body: String::new(),
        published_at: Utc.with_ymd_and_hms(2024, 6, day, 10, 0, 0).unwrap(),
    }
}

fn issue(number: u64, title: &str, labels: Vec<Label>) -> Issue {
    Issue {
        number,
        title: title.to_string(),
        body: String::new(),
        created_at: since() + ChronoDuration::days(1),
        labels,
    }
}

/// Returns canned lists and records which kinds were asked for.
struct StubSource {
    releases: Vec<Release>,
    pull_requests: Vec<PullRequest>,
    issues: Vec<Issue>,
    calls: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl ActivitySource for StubSource {
    async fn fetch_releases(&self, _: &RepoRef, _: DateTime<Utc>, limit: usize) -> Result<Vec<Release>> {
        self.calls.lock().unwrap().push("releases");
        Ok(self.releases.iter().take(limit).cloned().collect())
    }

    async fn fetch_merged_pull_requests(
        &self,
        _: &RepoRef,
        _: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<PullRequest>> {
        self.calls.lock().unwrap().push("pull_requests");
        Ok(self.pull_requests.iter().take(limit).cloned().collect())
    }

    async fn fetch_issues(&self, _: &RepoRef, _: DateTime<Utc>, limit: usize) -> Result<Vec<Issue>> {
        self.calls.lock().unwrap().push("issues");
        Ok(self.issues.iter().take(limit).cloned().collect())
    }
}

struct FixedSummarizer;

#[async_trait]
impl Summarize for FixedSummarizer {
    async fn summarize(&self, _repo: &RepoRef, activity: ActivityRef<'_>) -> Result<String> {
        Ok(format!("Summary of {} {}.", activity.kind(), activity.title()))
    }
}

fn stub_source(calls: Arc<Mutex<Vec<&'static str>>>) -> StubSource {
    StubSource {
        releases: vec![release("v1.1.0", 5), release("v1.0.1", 2)],
        pull_requests: vec![],
        issues: vec![
            issue(30, "Crash on empty config", vec![Label { name: "bug".to_string(), color: "d73a4a".to_string() }]),
            issue(12, "Support Windows", vec![]),
            issue(
                41,
                "Docs typo",
                vec![
                    Label { name: "Good First Issue".to_string(), color: "7057ff".to_string() },
                    Label { name: "docs".to_string(), color: String::new() },
                ],
            ),
        ],
        calls,
    }
}

#[tokio::test]
async fn report_has_one_row_per_item_in_input_order() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let assembler = ReportAssembler::new(
        stub_source(calls.clone()),
        FixedSummarizer,
        ReportGenerator::new(None).unwrap(),
    );

    let report = assembler.assemble(&request()).await.unwrap();
    let lines: Vec<&str> = report.summary.lines().collect();

    let releases_at = lines.iter().position(|l| *l == "# Releases").unwrap();
    let pulls_at = lines.iter().position(|l| *l == "# Pull Requests").unwrap();
    let issues_at = lines.iter().position(|l| *l == "# Issues").unwrap();
    assert!(releases_at < pulls_at && pulls_at < issues_at);

    let rows = |from: usize, to: usize| {
        lines[from..to]
            .iter()
            .copied()
            .filter(|l| l.starts_with("| **["))
            .collect::<Vec<&str>>()
    };

    let release_rows = rows(releases_at, pulls_at);
    assert_eq!(
        release_rows,
        [
            "| **[Widgets v1.1.0](https://github.com/octo/widgets/releases/tag/v1.1.0)** | _2024/06/05_ | Summary of release Widgets v1.1.0. |",
            "| **[Widgets v1.0.1](https://github.com/octo/widgets/releases/tag/v1.0.1)** | _2024/06/02_ | Summary of release Widgets v1.0.1. |",
        ]
    );

    assert!(rows(pulls_at, issues_at).is_empty());
    assert!(lines[pulls_at..issues_at].contains(&"_No pull requests found._"));

    let issue_rows = rows(issues_at, lines.len());
    assert_eq!(issue_rows.len(), 3);
    assert!(issue_rows[0].starts_with("| **[Crash on empty config](https://github.com/octo/widgets/issues/30)**"));
    assert!(issue_rows[1].starts_with("| **[Support Windows](https://github.com/octo/widgets/issues/12)** |  |"));
    assert!(issue_rows[2].contains(
        "[![Good First Issue](https://img.shields.io/badge/-Good__First__Issue-7057ff)](https://github.com/octo/widgets/labels/Good%20First%20Issue) \
         [![docs](https://img.shields.io/badge/-docs-lightgrey)](https://github.com/octo/widgets/labels/docs)"
    ));

    assert!(report.has_new_release);
    assert!(!report.has_new_pull_request);
    assert!(report.has_new_issue);
    assert_eq!(*calls.lock().unwrap(), ["releases", "pull_requests", "issues"]);
}

#[tokio::test]
async fn identical_inputs_render_identical_reports() {
    let first = ReportAssembler::new(stub_source(Arc::default()), FixedSummarizer, ReportGenerator::new(None).unwrap())
        .assemble(&request())
        .await
        .unwrap();
    let second = ReportAssembler::new(stub_source(Arc::default()), FixedSummarizer, ReportGenerator::new(None).unwrap())
        .assemble(&request())
        .await
        .unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn fetch_failure_aborts_the_run() {
    struct BrokenSource;

    #[async_trait]
    impl ActivitySource for BrokenSource {
        async fn fetch_releases(&self, _: &RepoRef, _: DateTime<Utc>, _: usize) -> Result<Vec<Release>> {
            Ok(vec![release("v1.0.0", 3)])
        }

        async fn fetch_merged_pull_requests(
            &self,
            _: &RepoRef,
            _: DateTime<Utc>,
            _: usize,
        ) -> Result<Vec<PullRequest>> {
            Err(DigestError::Fetch("search is down".to_string()))
        }

        async fn fetch_issues(&self, _: &RepoRef, _: DateTime<Utc>, _: usize) -> Result<Vec<Issue>> {
            panic!("issues must not be fetched after a failure");
        }
    }

    let err = ReportAssembler::new(BrokenSource, FixedSummarizer, ReportGenerator::new(None).unwrap())
        .assemble(&request())
        .await
        .unwrap_err();

    assert!(matches!(err, DigestError::Fetch(_)));
    assert_eq!(err.to_string(), "search is down");
}

/// Hosting fake for the full fetch -> summarize -> render chain.
struct FakeHosting;

#[async_trait]
impl HostingApi for FakeHosting {
    async fn list_releases(&self, _repo: &RepoRef, page: u32, _per_page: u8) -> Result<Vec<RawRelease>> {
        Ok(match page {
            1 => vec![
                RawRelease {
                    tag_name: "v2.0.0".to_string(),
                    name: Some("Two".to_string()),
                    body: Some("<!-- release-drafter -->\nBig changes.".to_string()),
                    published_at: Some(since() + ChronoDuration::days(2)),
                },
                RawRelease {
                    tag_name: "v1.9.0".to_string(),
                    name: Some("Old".to_string()),
                    body: None,
                    published_at: Some(since() - ChronoDuration::days(2)),
                },
            ],
            _ => vec![],
        })
    }

    async fn search_issues(&self, query: &str, page: u32, _per_page: u8) -> Result<Vec<Issue>> {
        if page > 1 {
            return Ok(vec![]);
        }
        if query.contains("is:pr") {
            Ok(vec![issue(7, "Speed up parser", vec![])])
        } else {
            Ok(vec![])
        }
    }
}

/// Fails once per request, then echoes the user payload.
struct EchoGenerator {
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let mut seen = self.seen.lock().unwrap();
        let first_time = !seen.contains(&request.user);
        seen.push(request.user.clone());
        if first_time {
            return Err(DigestError::Summarization("503 Service Unavailable".to_string()));
        }
        Ok(format!("  echo {}  \n", request.user))
    }
}

#[tokio::test(start_paused = true)]
async fn full_chain_with_fakes() {
    let summarizer = Summarizer::new(EchoGenerator { seen: Mutex::new(Vec::new()) }, Locale::En);
    let assembler = ReportAssembler::new(
        ActivityFetcher::new(FakeHosting),
        summarizer,
        ReportGenerator::new(None).unwrap(),
    )
        .with_backoff(BackoffPolicy::new(2, Duration::from_millis(100)))
        .with_pause(Duration::from_millis(50));

    let report = assembler.assemble(&request()).await.unwrap();

    assert!(report.summary.contains(
        r#"| **[Two](https://github.com/octo/widgets/releases/tag/v2.0.0)** | _2024/06/03_ | echo {"name":"Two","body":"Big changes."} |"#
    ));
    assert!(!report.summary.contains("v1.9.0"));
    assert!(report.summary.contains(
        r#"| **[Speed up parser](https://github.com/octo/widgets/pull/7)** |  | echo {"title":"Speed up parser","body":""} |"#
    ));
    assert!(report.summary.contains("_No issues found._"));
    assert_eq!((report.has_new_release, report.has_new_pull_request, report.has_new_issue), (true, true, false));
}
