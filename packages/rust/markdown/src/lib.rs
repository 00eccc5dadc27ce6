//! Section markdown normalization for the documentation renderer.
//!
//! Parsed sample sections carry markdown written for GitHub. Before the page
//! renderer consumes it, each section goes through:
//! 1. code fence rewrite to `[sourcecode]` blocks
//! 2. mustache tag escaping
//! 3. protection of literal code regions
//! 4. + 5. whitespace collapsing outside those regions
//! 6. restoration of the protected regions

mod cleanup;
mod protect;

use tracing::{instrument, trace};

use samplebuilder_shared::SampleDocument;

pub use cleanup::{collapse_whitespace, escape_mustache_tags, rewrite_code_blocks};
pub use protect::{ProtectedBlocks, protect_code_blocks};

/// Run the full normalization on one section's markdown.
pub fn normalize_markdown(md: &str) -> String {
    let md = rewrite_code_blocks(md);
    let md = escape_mustache_tags(&md);

    let (md, protected) = protect_code_blocks(&md);
    let md = collapse_whitespace(&md);

    trace!(blocks = protected.len(), "restoring protected code blocks");
    protected.restore(&md)
}

/// Normalize the markdown of every section of a parsed document in place.
#[instrument(skip_all, fields(title = %document.title, sections = document.sections.len()))]
pub fn normalize_document(document: &mut SampleDocument) {
    for section in &mut document.sections {
        section.markdown = normalize_markdown(&section.markdown);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_preserves_code_and_collapses_prose() {
        let input = "Intro text.\n\n\n\n```html\n<amp-img\n    src=\"a.jpg\">\n\n\n</amp-img>\n```\n  \nMore {{name}}.";
        assert_eq!(
            normalize_markdown(input),
            "Intro text.\n\n[sourcecode:html]\n<amp-img\n    src=\"a.jpg\">\n\n\n</amp-img>\n[/sourcecode]\n\nMore {% raw %}{{name}}{% endraw %}."
        );
    }

    #[test]
    fn normalize_keeps_existing_sourcecode_blocks_verbatim() {
        let block = "[sourcecode:css]\n.a {\n\n\n    color: red;\n}\n[/sourcecode]";
        let input = format!("Style it:\n\n\n{block}\n\n\n\nDone.");
        assert_eq!(
            normalize_markdown(&input),
            format!("Style it:\n\n{block}\n\nDone.")
        );
    }

    #[test]
    fn normalize_repeated_identical_blocks() {
        let block = "[sourcecode]\n  x\n[/sourcecode]";
        let input = format!("{block}\n\n\n{block}");
        assert_eq!(normalize_markdown(&input), format!("{block}\n\n{block}"));
    }

    #[test]
    fn normalize_document_touches_every_section() {
        let mut document: SampleDocument = sample_document();
        normalize_document(&mut document);
        assert_eq!(document.sections[0].markdown, "a\n\nb");
        assert_eq!(document.sections[1].markdown, "{% raw %}{{x}}{% endraw %}");
    }

    fn sample_document() -> SampleDocument {
        let mut document = SampleDocument {
            title: "t".into(),
            description: None,
            metadata: Default::default(),
            sections: Vec::new(),
            head: String::new(),
            body: String::new(),
            styles: String::new(),
            elements_after_body: String::new(),
            is_amp_story: false,
            is_amp_ads: false,
            is_amp_email: false,
            is_amp_website: true,
            extra: Default::default(),
        };
        for (id, markdown) in [("s1", "a\n\n\n\nb"), ("s2", "{{x}}")] {
            document.sections.push(samplebuilder_shared::Section {
                id: id.into(),
                markdown: markdown.into(),
                preview: String::new(),
                in_body: true,
                extra: Default::default(),
            });
        }
        document
    }
}
