use anyhow::Result;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use activity_digest::aggregator::{ActivityFetcher, ActivitySource, OutputFormat, ReportAssembler, ReportGenerator};
use activity_digest::ai::{AiClient, Summarizer};
use activity_digest::config::{self, Inputs};
use activity_digest::github::GitHubClient;
use activity_digest::output;

#[derive(Parser)]
#[command(name = "activity-digest")]
#[command(about = "Summarize a repository's recent releases, pull requests and issues")]
struct Cli {
    /// GitHub token (can also be set via GITHUB_TOKEN env var)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Repository in the form owner/repo
    #[arg(short, long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    /// GitHub API base URL, for GitHub Enterprise Server
    #[arg(long, env = "GITHUB_API_URL")]
    github_api_url: Option<String>,

    /// TOML config file with defaults for the options below
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    window: WindowArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct WindowArgs {
    /// How many days back to look [default: 7]
    #[arg(long)]
    days_ago: Option<u32>,

    /// Maximum number of releases [default: 10]
    #[arg(long)]
    releases_limit: Option<usize>,

    /// Maximum number of merged pull requests [default: 10]
    #[arg(long)]
    pull_requests_limit: Option<usize>,

    /// Maximum number of issues [default: 10]
    #[arg(long)]
    issues_limit: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch recent activity, summarize every item and render the report
    Generate {
        /// Text-generation model identifier
        #[arg(long, env = "AI_MODEL")]
        ai_model: Option<String>,

        /// Text-generation API key
        #[arg(long, env = "AI_API_KEY", hide_env_values = true)]
        ai_api_key: Option<String>,

        /// Chat completions endpoint
        #[arg(long, env = "AI_API_ENDPOINT")]
        ai_api_endpoint: Option<String>,

        /// Summary language: en or ja [default: en]
        #[arg(short, long)]
        locale: Option<String>,

        /// Retries per summary after the first attempt [default: 5]
        #[arg(long)]
        max_retries: Option<u32>,

        /// Backoff before the first retry, doubled for each further one [default: 2000]
        #[arg(long)]
        initial_delay_ms: Option<u64>,

        /// Pause between summarization requests [default: 5000]
        #[arg(long)]
        pause_ms: Option<u64>,

        /// Output file path (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short = 'f', long, default_value = "markdown")]
        format: OutputFormat,

        /// Custom handlebars template for each section
        #[arg(long)]
        template: Option<PathBuf>,

        /// GitHub Actions step output file
        #[arg(long, env = "GITHUB_OUTPUT")]
        github_output: Option<PathBuf>,
    },

    /// List the activity that would be summarized, without calling the text-generation service
    List,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout is reserved for the report.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if std::env::var_os("GITHUB_ACTIONS").is_some() {
                println!("::error::{}", escape_annotation(&format!("{err:#}")));
            } else {
                eprintln!("Error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let file_config = match &cli.config {
        Some(path) => config::load(path)?,
        None => config::Config::default(),
    };

    let mut inputs = Inputs {
        repository: cli.repository,
        github_token: cli.token,
        github_api_url: cli.github_api_url,
        days_ago: cli.window.days_ago,
        releases_limit: cli.window.releases_limit,
        pull_requests_limit: cli.window.pull_requests_limit,
        issues_limit: cli.window.issues_limit,
        ..Inputs::default()
    };

    match cli.command {
        Commands::Generate {
            ai_model,
            ai_api_key,
            ai_api_endpoint,
            locale,
            max_retries,
            initial_delay_ms,
            pause_ms,
            output,
            format,
            template,
            github_output,
        } => {
            inputs.ai_model = ai_model;
            inputs.ai_api_key = ai_api_key;
            inputs.ai_api_endpoint = ai_api_endpoint;
            inputs.locale = locale;
            inputs.max_retries = max_retries;
            inputs.initial_delay_ms = initial_delay_ms;
            inputs.pause_ms = pause_ms;
            let settings = inputs.with_file_defaults(&file_config).validate(Utc::now())?;

            let request = &settings.source.request;
            info!(
                repository = %request.repo,
                since = %request.since,
                locale = %settings.locale,
                max_retries = settings.backoff.max_retries,
                worst_case_backoff_ms = settings.backoff.worst_case_wait().as_millis() as u64,
                "Generating activity digest"
            );

            let github = GitHubClient::new(settings.source.token.clone(), settings.source.api_url.as_deref())?;
            let ai = AiClient::new(settings.ai.clone())?;
            let summarizer = Summarizer::new(ai, settings.locale).with_max_tokens(settings.max_tokens);
            let generator = ReportGenerator::new(template.as_deref())?;

            let assembler = ReportAssembler::new(ActivityFetcher::new(github), summarizer, generator)
                .with_backoff(settings.backoff)
                .with_pause(settings.pause);
            let report = assembler.assemble(request).await?;

            if let Some(path) = github_output {
                output::write_step_outputs(&path, &report)?;
            }

            let content = report.render(format)?;
            if let Some(output_path) = output {
                std::fs::write(&output_path, content)?;
                info!("Report written to {}", output_path.display());
            } else {
                println!("{}", content);
            }
        }
        Commands::List => {
            let source = inputs.with_file_defaults(&file_config).validate_source(Utc::now())?;
            let request = &source.request;
            let fetcher = ActivityFetcher::new(GitHubClient::new(source.token.clone(), source.api_url.as_deref())?);

            println!("Activity in {} since {}:", request.repo, request.since.format("%Y/%m/%d"));
            println!();

            let releases = fetcher
                .fetch_releases(&request.repo, request.since, request.limits.releases)
                .await?;
            println!("Releases ({}):", releases.len());
            for release in releases {
                println!("  - {}: {}", release.tag_name, release.published_at.format("%Y/%m/%d"));
            }
            println!();

            let pull_requests = fetcher
                .fetch_merged_pull_requests(&request.repo, request.since, request.limits.pull_requests)
                .await?;
            println!("Pull requests ({}):", pull_requests.len());
            for pull_request in pull_requests {
                println!("  - #{} {}", pull_request.number, pull_request.title);
            }
            println!();

            let issues = fetcher
                .fetch_issues(&request.repo, request.since, request.limits.issues)
                .await?;
            println!("Issues ({}):", issues.len());
            for issue in issues {
                println!("  - #{} {}", issue.number, issue.title);
            }
        }
    }

    Ok(())
}

// Workflow commands need `%`, CR and LF percent-encoded.
fn escape_annotation(message: &str) -> String {
    message.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}
