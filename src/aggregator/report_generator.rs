use chrono::{DateTime, Utc};
use handlebars::Handlebars;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::assembler::{Digest, Summarized};
use crate::error::Result;
use crate::github::types::{Issue, Label, PullRequest, Release, RepoRef};

const SECTION_TEMPLATE: &str = "section";

/// Characters a label name may carry that would end a URL path segment, a
/// markdown link or a table cell.
const LABEL_PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'?')
    .add(b'|')
    .add(b'<')
    .add(b'>')
    .add(b'(')
    .add(b')')
    .add(b'[')
    .add(b']')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'\\');

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
    Html,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// The rendered digest plus which sections had anything in them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub summary: String,
    pub has_new_release: bool,
    pub has_new_pull_request: bool,
    pub has_new_issue: bool,
}

impl Report {
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Markdown => Ok(self.summary.clone()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self).map_err(std::io::Error::other)?),
            OutputFormat::Html => Ok(self.to_html()),
        }
    }

    fn to_html(&self) -> String {
        let parser = pulldown_cmark::Parser::new_ext(&self.summary, pulldown_cmark::Options::ENABLE_TABLES);
        let mut body = String::new();
        pulldown_cmark::html::push_html(&mut body, parser);

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Activity digest</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif; max-width: 1100px; margin: 0 auto; padding: 20px; }}
        h1 {{ border-bottom: 1px solid #e1e4e8; padding-bottom: 0.3em; }}
        table {{ border-collapse: collapse; }}
        th, td {{ border: 1px solid #e1e4e8; padding: 6px 10px; vertical-align: top; }}
    </style>
</head>
<body>
{}
</body>
</html>"#,
            body
        )
    }
}

#[derive(Serialize)]
struct SectionData {
    heading: &'static str,
    column: &'static str,
    empty_message: &'static str,
    rows: Vec<Row>,
}

#[derive(Serialize)]
struct Row {
    title: String,
    url: String,
    meta: String,
    summary: String,
}

/// Renders a [`Digest`] into the markdown report, one section per activity kind.
pub struct ReportGenerator {
    template_engine: Handlebars<'static>,
}

impl ReportGenerator {
    pub fn new(template_path: Option<&Path>) -> Result<Self> {
        let mut template_engine = Handlebars::new();
        // Cells hold markdown, not HTML.
        template_engine.register_escape_fn(handlebars::no_escape);

        match template_path {
            Some(path) => {
                let template_content = std::fs::read_to_string(path)?;
                template_engine.register_template_string(SECTION_TEMPLATE, template_content)?;
            }
            None => {
                let default_template = include_str!("../../templates/section.md.hbs");
                template_engine.register_template_string(SECTION_TEMPLATE, default_template)?;
            }
        }

        Ok(Self { template_engine })
    }

    pub fn generate(&self, repo: &RepoRef, digest: &Digest) -> Result<Report> {
        let sections = [
            SectionData {
                heading: "Releases",
                column: "Published at",
                empty_message: "_No releases found._",
                rows: digest.releases.iter().map(|entry| release_row(repo, entry)).collect(),
            },
            SectionData {
                heading: "Pull Requests",
                column: "Labels",
                empty_message: "_No pull requests found._",
                rows: digest
                    .pull_requests
                    .iter()
                    .map(|entry| pull_request_row(repo, entry))
                    .collect(),
            },
            SectionData {
                heading: "Issues",
                column: "Labels",
                empty_message: "_No issues found._",
                rows: digest.issues.iter().map(|entry| issue_row(repo, entry)).collect(),
            },
        ];

        let mut blocks = Vec::with_capacity(sections.len());
        for section in &sections {
            let rendered = self.template_engine.render(SECTION_TEMPLATE, section)?;
            blocks.push(rendered.trim_end().to_string());
        }

        let mut summary = blocks.join("\n\n");
        summary.push('\n');

        Ok(Report {
            summary,
            has_new_release: !digest.releases.is_empty(),
            has_new_pull_request: !digest.pull_requests.is_empty(),
            has_new_issue: !digest.issues.is_empty(),
        })
    }
}

fn release_row(repo: &RepoRef, entry: &Summarized<Release>) -> Row {
    let release = &entry.item;
    Row {
        title: table_cell(release.display_name()),
        url: format!("{}/releases/tag/{}", repo.html_url(), release.tag_name),
        meta: format!("_{}_", format_date(release.published_at)),
        summary: table_cell(&entry.summary),
    }
}

fn pull_request_row(repo: &RepoRef, entry: &Summarized<PullRequest>) -> Row {
    let pull_request = &entry.item;
    Row {
        title: table_cell(&pull_request.title),
        url: format!("{}/pull/{}", repo.html_url(), pull_request.number),
        meta: label_badges(repo, &pull_request.labels),
        summary: table_cell(&entry.summary),
    }
}

fn issue_row(repo: &RepoRef, entry: &Summarized<Issue>) -> Row {
    let issue = &entry.item;
    Row {
        title: table_cell(&issue.title),
        url: format!("{}/issues/{}", repo.html_url(), issue.number),
        meta: label_badges(repo, &issue.labels),
        summary: table_cell(&entry.summary),
    }
}

/// `yyyy/MM/dd` in UTC.
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y/%m/%d").to_string()
}

/// Keeps a value on one table row: line breaks become spaces and pipes are escaped.
pub fn table_cell(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\r', '\n'], " ").replace('|', "\\|")
}

/// Encodes a label name for a shields.io static badge path segment.
///
/// Each pass works on the previous pass's output: spaces to `_`, then `-` to
/// `--`, then every `_` (including the ones just inserted) to `__`.
pub fn badge_segment(name: &str) -> String {
    name.replace(' ', "_").replace('-', "--").replace('_', "__")
}

pub fn label_badge(repo: &RepoRef, label: &Label) -> String {
    let color = if label.color.is_empty() { "lightgrey" } else { label.color.as_str() };
    format!(
        "[![{alt}](https://img.shields.io/badge/-{segment}-{color})]({repo_url}/labels/{path})",
        alt = badge_alt(&label.name),
        segment = utf8_percent_encode(&badge_segment(&label.name), LABEL_PATH),
        color = utf8_percent_encode(color, LABEL_PATH),
        repo_url = repo.html_url(),
        path = utf8_percent_encode(&label.name, LABEL_PATH),
    )
}

fn badge_alt(name: &str) -> String {
    table_cell(name).replace('[', "\\[").replace(']', "\\]")
}

/// One badge per label, in platform order, space separated.
pub fn label_badges(repo: &RepoRef, labels: &[Label]) -> String {
    labels
        .iter()
        .map(|label| label_badge(repo, label))
        .collect::<Vec<_>>()
        .join(" ")
}
