//! Artifact generators for parsed samples.
//!
//! Four independent generators turn one `(Sample, ParsedSample)` pair into
//! output files:
//! - [`DocumentationGenerator`]: pod page with front matter + JSON data file
//! - [`SourceGenerator`]: full raw source and optional standalone section sources
//! - [`PreviewGenerator`]: preview pod page for stories and samples asking for one
//! - [`EmbedGenerator`]: embeddable story/ad variants
//!
//! Generators never touch shared state and never write to disk; placement is
//! the orchestrator's job.

pub mod components;
mod documentation;
mod embed;
mod frontmatter;
mod preview;
mod sources;

use tracing::{debug, instrument};

use samplebuilder_shared::{BuildConfig, GeneratedArtifact, ParsedSample, Result, Sample};

pub use components::{
    ComponentExtractor, HtmlComponentExtractor, ScriptTagExtractor, UsedComponent,
    UsedComponents, extractor_for,
};
pub use documentation::DocumentationGenerator;
pub use embed::EmbedGenerator;
pub use preview::PreviewGenerator;
pub use sources::SourceGenerator;

/// A pure function from a parsed sample to zero or more artifacts.
pub trait ArtifactGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    fn generate(
        &self,
        sample: &Sample,
        parsed: &ParsedSample,
        ctx: &GeneratorContext,
    ) -> Result<Vec<GeneratedArtifact>>;
}

// ---------------------------------------------------------------------------
// GeneratorContext
// ---------------------------------------------------------------------------

/// Run-scoped inputs shared by every generator.
pub struct GeneratorContext {
    pub documentation_template: String,
    pub preview_template: String,
    /// Pod path of the documentation collection, with a leading `/`.
    pub documentation_pod_path: String,
    pub platform_host: String,
    /// Navigation script injected into story embeds.
    pub story_embed_snippet: String,
    /// Template source for ad embeds.
    pub ads_embed_template: String,
    pub extractor: Box<dyn ComponentExtractor>,
}

impl GeneratorContext {
    /// Build the context from resolved config and the per-run assets.
    ///
    /// The ads template is compiled once here so a broken template fails the
    /// run up front instead of every ad sample.
    pub fn new(
        config: &BuildConfig,
        story_embed_snippet: String,
        ads_embed_template: String,
    ) -> Result<Self> {
        embed::check_template(&ads_embed_template)?;

        Ok(Self {
            documentation_template: config.templates.documentation.clone(),
            preview_template: config.templates.preview.clone(),
            documentation_pod_path: config.documentation_pod_path.clone(),
            platform_host: config.hosts.platform.clone(),
            story_embed_snippet,
            ads_embed_template,
            extractor: extractor_for(config.component_extractor),
        })
    }
}

/// The fixed generator set, in output order.
pub fn generators() -> Vec<Box<dyn ArtifactGenerator>> {
    vec![
        Box::new(DocumentationGenerator),
        Box::new(SourceGenerator),
        Box::new(PreviewGenerator),
        Box::new(EmbedGenerator),
    ]
}

/// Run every generator for one sample. The first failure abandons the whole
/// set, so a sample either yields all of its artifacts or none.
#[instrument(skip_all, fields(sample = %sample.file.relative))]
pub fn generate_all(
    sample: &Sample,
    parsed: &ParsedSample,
    ctx: &GeneratorContext,
) -> Result<Vec<GeneratedArtifact>> {
    let mut artifacts = Vec::new();
    for generator in generators() {
        let generated = generator.generate(sample, parsed, ctx)?;
        debug!(
            generator = generator.name(),
            count = generated.len(),
            "generated artifacts"
        );
        artifacts.extend(generated);
    }
    Ok(artifacts)
}

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------
