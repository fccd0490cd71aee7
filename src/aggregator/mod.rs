pub mod activity_fetcher;
pub mod assembler;
pub mod report_generator;
pub mod sanitizer;

pub use activity_fetcher::{ActivityFetcher, ActivitySource};
pub use assembler::{Digest, DigestRequest, Limits, ReportAssembler, Summarized};
pub use report_generator::{OutputFormat, Report, ReportGenerator};
