use serde::Serialize;

use samplebuilder_shared::{
    ArtifactKind, GeneratedArtifact, ParsedSample, Result, Sample, SampleBuilderError,
};

use crate::components::UsedComponents;
use crate::frontmatter::{self, Header};
use crate::{ArtifactGenerator, GeneratorContext};

/// Documentation pod page plus the JSON data file it renders from.
pub struct DocumentationGenerator;

impl ArtifactGenerator for DocumentationGenerator {
    fn name(&self) -> &'static str {
        "documentation"
    }

    fn generate(
        &self,
        sample: &Sample,
        parsed: &ParsedSample,
        ctx: &GeneratorContext,
    ) -> Result<Vec<GeneratedArtifact>> {
        let stem = sample.file.stem();
        let document = &parsed.document;
        let route = sample.routes.documentation();

        let mut header = Header::new()
            .bool("$$injectAmpDependencies", false)
            .str("$title", &document.title)
            .str("$view", &ctx.documentation_template)
            .str("$category", sample.category.ordered())
            .str("$path", &route)
            .nested(
                "$localization",
                Header::new().str("path", format!("/{{locale}}{route}")),
            )
            .str("description", document.description())
            .str("source", sample.routes.source());

        let metadata = &document.metadata;
        for (key, value) in [("author", &metadata.author), ("translator", &metadata.translator)] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                header = header.str(key, value);
            }
        }
        if let Some(contributors) = metadata.contributors.as_ref().filter(|c| !c.is_null()) {
            header = header.value("contributors", contributors)?;
        }

        let teaser = Teaser {
            formats: [parsed.format().as_str()],
            used_components: ctx.extractor.extract(&document.head),
            teaser: metadata.teaser_image.as_deref().map(|src| TeaserImage {
                image: ImageSource { src },
            }),
        };
        let teaser = serde_yaml::to_string(&teaser)
            .map_err(|e| SampleBuilderError::Render(format!("teaser: {e}")))?;

        let page = frontmatter::document(&[
            header.to_yaml()?,
            frontmatter::data_reference(&ctx.documentation_pod_path, stem),
            teaser.trim_end().to_string(),
        ]);

        let data = serde_json::to_vec(parsed).map_err(|e| {
            SampleBuilderError::Render(format!("serializing {}: {e}", parsed.file_path))
        })?;

        Ok(vec![
            GeneratedArtifact::new(ArtifactKind::DocumentationPage, format!("{stem}.html"), page),
            GeneratedArtifact::new(ArtifactKind::DocumentationData, format!("{stem}.json"), data),
        ])
    }
}

/// Extra front matter rendered by the example teaser.
#[derive(Serialize)]
struct Teaser<'a> {
    formats: [&'a str; 1],
    used_components: UsedComponents,
    #[serde(skip_serializing_if = "Option::is_none")]
    teaser: Option<TeaserImage<'a>>,
}

#[derive(Serialize)]
struct TeaserImage<'a> {
    image: ImageSource<'a>,
}

#[derive(Serialize)]
struct ImageSource<'a> {
    src: &'a str,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::fixtures::{context, parsed, sample};

    #[test]
    fn page_front_matter() {
        let sample = sample("01-category/Sample.html");
        let parsed = parsed(json!({
            "title": "Sample",
            "description": "Shows things.",
            "sections": [],
            "head": "<script async custom-element=\"amp-bind\" src=\"https://cdn.ampproject.org/v0/amp-bind-0.1.js\"></script>",
            "metadata": {"author": "Ada", "translator": "", "teaserImage": "/img/t.png"},
        }));

        let artifacts = DocumentationGenerator
            .generate(&sample, &parsed, &context())
            .unwrap();
        assert_eq!(artifacts[0].name, "Sample.html");
        assert_eq!(
            artifacts[0].text(),
            "---\n\
             $$injectAmpDependencies: false\n\
             $title: Sample\n\
             $view: /views/examples/documentation.j2\n\
             $category: 01-category\n\
             $path: /documentation/examples/category/sample/index.html\n\
             $localization:\n  \
             path: /{locale}/documentation/examples/category/sample/index.html\n\
             description: Shows things.\n\
             source: /documentation/examples/category/sample\n\
             author: Ada\n\
             example: !g.json /content/amp-dev/documentation/examples/documentation/Sample.json\n\
             formats:\n\
             - websites\n\
             used_components:\n  \
             amp-bind:\n    \
             version: '0.1'\n    \
             type: element\n\
             teaser:\n  \
             image:\n    \
             src: /img/t.png\n\
             ---\n"
        );
    }

    #[test]
    fn data_file_is_the_serialized_sample() {
        let sample = sample("01-category/Sample.html");
        let parsed = parsed(json!({"title": "Sample", "sections": [], "isAmpEmail": true}));

        let artifacts = DocumentationGenerator
            .generate(&sample, &parsed, &context())
            .unwrap();
        assert_eq!(artifacts[1].kind, ArtifactKind::DocumentationData);
        assert_eq!(artifacts[1].name, "Sample.json");

        let data: serde_json::Value = serde_json::from_slice(&artifacts[1].contents).unwrap();
        assert_eq!(data["document"]["title"], "Sample");
        assert_eq!(data["route"], "/documentation/examples/category/sample/index.html");
        assert!(artifacts[0].text().contains("formats:\n- email\n"));
    }

    #[test]
    fn contributors_are_transferred_verbatim() {
        let sample = sample("01-category/Sample.html");
        let parsed = parsed(json!({
            "title": "Sample",
            "sections": [],
            "metadata": {"contributors": ["Ada", "Grace"]},
        }));

        let page = DocumentationGenerator
            .generate(&sample, &parsed, &context())
            .unwrap()
            .remove(0)
            .text();
        assert!(page.contains("contributors:\n- Ada\n- Grace\n"));
        assert!(!page.contains("author:"));
        assert!(page.contains("used_components: {}\n"));
    }
}
