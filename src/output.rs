//! Step outputs for a GitHub Actions runner (`$GITHUB_OUTPUT`).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::aggregator::Report;
use crate::error::Result;

/// Appends `summary` and the three section flags to the runner's output file.
pub fn write_step_outputs(path: &Path, report: &Report) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(format_step_outputs(report).as_bytes())?;
    Ok(())
}

fn format_step_outputs(report: &Report) -> String {
    let delimiter = delimiter_for(&report.summary);
    let mut out = String::new();
    out.push_str(&format!("summary<<{delimiter}\n{}", report.summary));
    if !report.summary.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!("{delimiter}\n"));
    out.push_str(&format!("hasNewRelease={}\n", report.has_new_release));
    out.push_str(&format!("hasNewPullRequest={}\n", report.has_new_pull_request));
    out.push_str(&format!("hasNewIssue={}\n", report.has_new_issue));
    out
}

// The heredoc delimiter must not appear on its own line in the value.
fn delimiter_for(value: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let mut delimiter = format!("ghadelimiter_{nanos}");
    while value.lines().any(|line| line == delimiter) {
        delimiter.push('_');
    }
    delimiter
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(summary: &str) -> Report {
        Report {
            summary: summary.to_string(),
            has_new_release: true,
            has_new_pull_request: false,
            has_new_issue: true,
        }
    }

    #[test]
    fn formats_multiline_summary_and_flags() {
        let out = format_step_outputs(&report("# Releases\n\nrow\n"));
        let lines: Vec<&str> = out.lines().collect();

        let delimiter = lines[0].strip_prefix("summary<<").unwrap();
        assert_eq!(&lines[1..4], ["# Releases", "", "row"]);
        assert_eq!(lines[4], delimiter);
        assert_eq!(&lines[5..], ["hasNewRelease=true", "hasNewPullRequest=false", "hasNewIssue=true"]);
    }

    #[test]
    fn appends_to_existing_file() {
        let path = std::env::temp_dir().join(format!("activity-digest-output-{}", std::process::id()));
        std::fs::write(&path, "previous=1\n").unwrap();

        write_step_outputs(&path, &report("text")).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(content.starts_with("previous=1\nsummary<<ghadelimiter_"));
        assert!(content.contains("\ntext\nghadelimiter_"));
        assert!(content.ends_with("hasNewIssue=true\n"));
    }
}
