//! Shared types, error model, and configuration for the samples builder.
//!
//! This crate is the foundation depended on by all other samplebuilder crates.
//! It provides:
//! - [`SampleBuilderError`], the unified error type
//! - Domain types ([`SourceFile`], [`Sample`], [`ParsedSample`], [`GeneratedArtifact`])
//! - Category keys and [`Routes`]
//! - Configuration ([`AppConfig`], [`BuildConfig`], config loading)

pub mod config;
pub mod error;
pub mod project;
pub mod routes;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BuildConfig, BuildDefaults, BuildPaths, BuildProfile, CONFIG_FILE_NAME,
    ExtractorKind, HostsConfig, PROFILE_ENV, ParserConfig, PathsConfig, TemplatesConfig,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, SampleBuilderError};
pub use project::Project;
pub use routes::{Category, DEFAULT_ROUTE_BASE, Routes};
pub use types::{
    ArtifactKind, Format, GeneratedArtifact, Metadata, ParsedSample, Sample, SampleDocument,
    Section, SourceFile, routing_path,
};
