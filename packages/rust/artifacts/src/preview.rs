use samplebuilder_shared::{ArtifactKind, Format, GeneratedArtifact, ParsedSample, Result, Sample};

use crate::frontmatter::{self, Header};
use crate::{ArtifactGenerator, GeneratorContext};

/// Preview pod page, only for stories and samples whose metadata asks for one.
pub struct PreviewGenerator;

impl ArtifactGenerator for PreviewGenerator {
    fn name(&self) -> &'static str {
        "preview"
    }

    fn generate(
        &self,
        sample: &Sample,
        parsed: &ParsedSample,
        ctx: &GeneratorContext,
    ) -> Result<Vec<GeneratedArtifact>> {
        let format = parsed.format();
        if !(parsed.document.metadata.wants_preview() || format == Format::Stories) {
            return Ok(Vec::new());
        }

        let stem = sample.file.stem();
        let route = sample.routes.preview();

        let header = Header::new()
            .str("$title", &parsed.document.title)
            .str("$view", &ctx.preview_template)
            .str("$category", sample.category.display())
            .str("$path", &route)
            .nested(
                "$localization",
                Header::new().str("path", format!("/{{locale}}{route}")),
            )
            .value("formats", &[format.as_str()])?
            .str("source", sample.routes.source())
            .str("embed", sample.routes.embed());

        let page = frontmatter::document(&[
            header.to_yaml()?,
            frontmatter::data_reference(&ctx.documentation_pod_path, stem),
        ]);

        Ok(vec![GeneratedArtifact::new(
            ArtifactKind::Preview,
            format!("{stem}.html"),
            page,
        )])
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::fixtures::{context, parsed, sample};

    #[test]
    fn no_preview_for_plain_websites() {
        let parsed = parsed(json!({"title": "t", "sections": []}));
        let artifacts = PreviewGenerator
            .generate(&sample("01-category/Sample.html"), &parsed, &context())
            .unwrap();
        assert!(artifacts.is_empty());
    }

    #[test]
    fn stories_always_get_a_preview() {
        let parsed = parsed(json!({"title": "Story", "sections": [], "isAmpStory": true, "isAmpAds": true}));
        let artifacts = PreviewGenerator
            .generate(&sample("20_stories/My_Story.html"), &parsed, &context())
            .unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].name, "My_Story.html");
        assert_eq!(
            artifacts[0].text(),
            "---\n\
             $title: Story\n\
             $view: /views/examples/preview.j2\n\
             $category: stories\n\
             $path: /documentation/examples/stories/my_story/preview/index.html\n\
             $localization:\n  \
             path: /{locale}/documentation/examples/stories/my_story/preview/index.html\n\
             formats:\n\
             - stories\n\
             source: /documentation/examples/stories/my_story\n\
             embed: /documentation/examples/stories/my_story/embed\n\
             example: !g.json /content/amp-dev/documentation/examples/documentation/My_Story.json\n\
             ---\n"
        );
    }

    #[test]
    fn metadata_can_request_a_preview() {
        let parsed = parsed(json!({"title": "Ad", "sections": [], "metadata": {"preview": "a4a"}}));
        let artifacts = PreviewGenerator
            .generate(&sample("01-category/Ad.html"), &parsed, &context())
            .unwrap();
        assert_eq!(artifacts[0].kind, ArtifactKind::Preview);
    }
}
