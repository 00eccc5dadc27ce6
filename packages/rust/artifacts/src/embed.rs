use minijinja::{Environment, context};

use samplebuilder_shared::{
    ArtifactKind, Format, GeneratedArtifact, ParsedSample, Result, Sample, SampleBuilderError,
};

use crate::{ArtifactGenerator, GeneratorContext};

/// Embeddable variants: stories get the navigation snippet, ads are rendered
/// from the ads embed template. Other formats have no embed.
pub struct EmbedGenerator;

impl ArtifactGenerator for EmbedGenerator {
    fn name(&self) -> &'static str {
        "embed"
    }

    fn generate(
        &self,
        sample: &Sample,
        parsed: &ParsedSample,
        ctx: &GeneratorContext,
    ) -> Result<Vec<GeneratedArtifact>> {
        let contents = match parsed.format() {
            Format::Stories => inject_snippet(&parsed.source, &ctx.story_embed_snippet),
            Format::Ads => render_ad(sample, parsed, ctx)?,
            Format::Email | Format::Websites => return Ok(Vec::new()),
        };

        Ok(vec![GeneratedArtifact::new(
            ArtifactKind::Embed,
            format!("{}.html", sample.file.stem().to_lowercase()),
            contents,
        )])
    }
}

/// Insert the snippet as an inline script before the first `</body>`.
fn inject_snippet(source: &str, snippet: &str) -> String {
    source.replacen("</body>", &format!("<script>{snippet}</script></body>"), 1)
}

fn render_ad(sample: &Sample, parsed: &ParsedSample, ctx: &GeneratorContext) -> Result<String> {
    let env = Environment::new();
    env.render_str(
        &ctx.ads_embed_template,
        context! {
            metadata => &parsed.document.metadata,
            canonical => format!("{}{}", ctx.platform_host, sample.routes.documentation()),
            source => sample.routes.source(),
            title => &parsed.document.title,
        },
    )
    .map_err(|e| SampleBuilderError::Render(format!("ads embed for {}: {e}", sample.file.relative)))
}

/// Compile the ads template once to surface syntax errors.
pub(crate) fn check_template(source: &str) -> Result<()> {
    Environment::new()
        .template_from_str(source)
        .map(|_| ())
        .map_err(|e| SampleBuilderError::Render(format!("ads embed template: {e}")))
}
