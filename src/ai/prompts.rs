use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DigestError;
use crate::github::types::{ActivityKind, RepoRef};

/// Language the summaries are written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ja,
}

impl FromStr for Locale {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Locale::En),
            "ja" => Ok(Locale::Ja),
            _ => Err(DigestError::InvalidInput(format!(
                "locale must be one of `en` or `ja`, got `{s}`"
            ))),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Ja => write!(f, "ja"),
        }
    }
}

/// System instruction for summarizing one item of `kind`.
///
/// Depends only on the kind, the locale and the repository, never on the item.
/// Every variant asks for plain text, a locale-appropriate length and a
/// consistent register.
pub fn instruction(kind: ActivityKind, locale: Locale, repo: &RepoRef) -> String {
    match locale {
        Locale::En => {
            let subject = match kind {
                ActivityKind::Release => "release notes",
                ActivityKind::PullRequest => "pull requests",
                ActivityKind::Issue => "issues",
            };
            let item = match kind {
                ActivityKind::Release => "release notes",
                ActivityKind::PullRequest => "pull request",
                ActivityKind::Issue => "issue",
            };
            format!(
                "You are an assistant that summarizes {subject} of the {repo} repository.\n\
                 Summarize the {item} provided by the user concisely in English, following these rules:\n\
                 \n\
                 - Write the summary as plain text without any markdown formatting.\n\
                 - Keep the summary to about 400 characters.\n\
                 - Use a neutral, professional tone."
            )
        }
        Locale::Ja => {
            let subject = match kind {
                ActivityKind::Release => "リリースノート",
                ActivityKind::PullRequest => "Pull Request",
                ActivityKind::Issue => "Issue",
            };
            format!(
                "あなたは {repo} リポジトリの{subject}の内容を要約するアシスタントです。\n\
                 以下の条件に基づいて、ユーザーから提供された{subject}の内容を日本語で簡潔に要約してください。\n\
                 \n\
                 - 要約のフォーマットはプレーンテキストを使用してください。\n\
                 - 要約は 200 文字程度に収めてください。\n\
                 - 文体は「ですます調」を使用してください。"
            )
        }
    }
}
