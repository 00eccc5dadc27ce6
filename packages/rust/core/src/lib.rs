//! Samples build orchestration.
//!
//! Ties the parser bridge, the artifact generators and the change cache
//! into end-to-end builds, with optional clean and watch modes.

pub mod categorizer;
pub mod clean;
pub mod document;
pub mod parser;
pub mod pipeline;
pub mod sitemap;
pub mod watch;

pub use parser::{CommandParser, SampleParser};
pub use pipeline::{
    BuildResult, BuildTrigger, ProgressReporter, SamplesBuilder, SilentProgress,
};
pub use sitemap::SitemapWrite;
pub use watch::watch;
