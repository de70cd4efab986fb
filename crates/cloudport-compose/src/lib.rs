//! Cloudport output
//!
//! Turns a batch of mapping results into the files an operator deploys from:
//! a compose manifest, generated configs and scripts, and a Markdown migration
//! report.

pub mod compose;
pub mod error;
pub mod report;
pub mod writer;

pub use compose::ComposeFile;
pub use error::{ComposeError, ComposeResult};
pub use report::{MigrationReport, ReportEntry};
pub use writer::{OutputBundle, OutputWriter};
