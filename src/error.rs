use thiserror::Error;

/// Everything that can abort a digest run.
///
/// Each variant displays its message verbatim so the runner's failure status
/// carries exactly what went wrong.
#[derive(Debug, Error)]
pub enum DigestError {
    /// Malformed or missing input, raised before any network call.
    #[error("{0}")]
    InvalidInput(String),

    /// The hosting platform call failed or returned an unexpected shape.
    #[error("{0}")]
    Fetch(String),

    /// The text-generation call failed or returned an unusable response.
    #[error("{0}")]
    Summarization(String),

    #[error("invalid report template: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("failed to render report: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = DigestError> = std::result::Result<T, E>;
