use samplebuilder_shared::{ArtifactKind, GeneratedArtifact, ParsedSample, Result, Sample, SampleDocument};

use crate::{ArtifactGenerator, GeneratorContext};

const TITLE_PLACEHOLDER: &str = "<!-- samplesBuilder: title-->";
const SECTION_PLACEHOLDER: &str = "<!-- samplesBuilder: section-->";

/// Raw sources for the playground: the full sample and, for samples marked
/// `standaloneSnippets`, one runnable document per qualifying section.
pub struct SourceGenerator;

impl ArtifactGenerator for SourceGenerator {
    fn name(&self) -> &'static str {
        "sources"
    }

    fn generate(
        &self,
        sample: &Sample,
        parsed: &ParsedSample,
        _ctx: &GeneratorContext,
    ) -> Result<Vec<GeneratedArtifact>> {
        let stem = sample.file.stem().to_lowercase();
        let document = &parsed.document;

        let mut sources = vec![GeneratedArtifact::new(
            ArtifactKind::SourceFull,
            format!("{stem}.html"),
            parsed.source.as_bytes(),
        )];

        if !document.metadata.standalone_snippets {
            return Ok(sources);
        }

        let skeleton = skeleton(document);
        sources.extend(
            document
                .sections
                .iter()
                .filter(|section| section.is_standalone())
                .map(|section| {
                    let contents = skeleton
                        .replacen(SECTION_PLACEHOLDER, &section.preview, 1)
                        .replacen(TITLE_PLACEHOLDER, &section.id, 1);
                    GeneratedArtifact::new(
                        ArtifactKind::SourceSection,
                        format!("{stem}-{}.html", section.id),
                        contents,
                    )
                }),
        );

        Ok(sources)
    }
}

/// Standalone document shell with title and section placeholders.
fn skeleton(document: &SampleDocument) -> String {
    let title = format!("<title>{} / {TITLE_PLACEHOLDER}</title>", document.title);
    let closing = format!("{SECTION_PLACEHOLDER}</body>\n</html>");
    let parts: [&str; 9] = [
        "<!doctype html>\n<html ⚡>\n<head>",
        &document.head,
        &title,
        "<style amp-custom>",
        &document.styles,
        "</style>\n<meta name=\"robots\" content=\"noindex, nofollow\">\n</head>",
        &document.body,
        &document.elements_after_body,
        &closing,
    ];
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::fixtures::{context, parsed, sample};

    fn snippet_sample(standalone: bool) -> ParsedSample {
        parsed(json!({
            "title": "Carousel",
            "head": "<meta charset=\"utf-8\">",
            "styles": "p { color: red; }",
            "body": "<body>",
            "elementsAfterBody": "",
            "metadata": {"standaloneSnippets": standalone},
            "sections": [
                {"id": "basic", "preview": "<amp-carousel></amp-carousel>", "inBody": true},
                {"id": "head-only", "preview": "<meta name=x>", "inBody": false},
                {"id": "slides", "preview": "<amp-img></amp-img>", "inBody": true},
                {"id": "empty", "preview": " \n ", "inBody": true},
                {"id": "autoplay", "preview": "<amp-carousel autoplay></amp-carousel>", "inBody": true},
            ],
        }))
    }

    #[test]
    fn full_source_only_without_standalone_flag() {
        let sample = sample("01-category/Carousel.html");
        let artifacts = SourceGenerator
            .generate(&sample, &snippet_sample(false), &context())
            .unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].kind, ArtifactKind::SourceFull);
        assert_eq!(artifacts[0].name, "carousel.html");
        assert_eq!(artifacts[0].text(), "<html><body><p>hi</p></body></html>");
    }

    #[test]
    fn one_source_per_qualifying_section() {
        let sample = sample("01-category/Carousel.html");
        let artifacts = SourceGenerator
            .generate(&sample, &snippet_sample(true), &context())
            .unwrap();

        let names: Vec<_> = artifacts.iter().map(|a| (a.kind, a.name.as_str())).collect();
        assert_eq!(
            names,
            vec![
                (ArtifactKind::SourceFull, "carousel.html"),
                (ArtifactKind::SourceSection, "carousel-basic.html"),
                (ArtifactKind::SourceSection, "carousel-slides.html"),
                (ArtifactKind::SourceSection, "carousel-autoplay.html"),
            ]
        );
    }

    #[test]
    fn section_document_fills_the_skeleton() {
        let sample = sample("01-category/Carousel.html");
        let artifacts = SourceGenerator
            .generate(&sample, &snippet_sample(true), &context())
            .unwrap();
        assert_eq!(
            artifacts[1].text(),
            "<!doctype html>\n<html ⚡>\n<head>\n\
             <meta charset=\"utf-8\">\n\
             <title>Carousel / basic</title>\n\
             <style amp-custom>\n\
             p { color: red; }\n\
             </style>\n<meta name=\"robots\" content=\"noindex, nofollow\">\n</head>\n\
             <body>\n\
             \n\
             <amp-carousel></amp-carousel></body>\n</html>"
        );
    }
}
