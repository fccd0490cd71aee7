//! Weekly digest of a repository's releases, merged pull requests and issues,
//! each summarized by a text-generation service and laid out as markdown tables.

pub mod aggregator;
pub mod ai;
pub mod config;
pub mod error;
pub mod github;
pub mod output;
pub mod retry;

pub use error::{DigestError, Result};
