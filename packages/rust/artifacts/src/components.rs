//! Used-component detection for the documentation teaser.
//!
//! Callers only see [`ComponentExtractor`]; the regex heuristic and the
//! structural HTML parse are interchangeable behind it.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;

use samplebuilder_shared::ExtractorKind;

/// A component script found in a sample's head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsedComponent {
    pub version: String,
    /// `element`, `template`, ... (the suffix of the `custom-*` attribute).
    #[serde(rename = "type")]
    pub kind: String,
}

/// Components keyed by name, e.g. `amp-carousel`.
pub type UsedComponents = BTreeMap<String, UsedComponent>;

/// Extracts used components from a head markup fragment.
pub trait ComponentExtractor: Send + Sync {
    fn extract(&self, head: &str) -> UsedComponents;

    /// Human-readable extractor name for tracing.
    fn name(&self) -> &str;
}

/// Build the extractor selected in config.
pub fn extractor_for(kind: ExtractorKind) -> Box<dyn ComponentExtractor> {
    match kind {
        ExtractorKind::ScriptTag => Box::new(ScriptTagExtractor),
        ExtractorKind::Html => Box::new(HtmlComponentExtractor),
    }
}

// ---------------------------------------------------------------------------
// Regex heuristic
// ---------------------------------------------------------------------------

/// Quick regex scan for `<script custom-{type}="{name}" src="...-{version}.js"></script>`.
pub struct ScriptTagExtractor;

impl ComponentExtractor for ScriptTagExtractor {
    fn extract(&self, head: &str) -> UsedComponents {
        static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(
                r#"<script[^>]*?custom-(?P<type>[a-z]+)="(?P<name>[^"]+)"[^>]*src="[^"]+-(?P<version>\d+(?:\.\d+)*)\.js"[^>]*>\s*</script>"#,
            )
            .expect("valid regex")
        });

        SCRIPT_RE
            .captures_iter(head)
            .map(|caps| {
                (
                    caps["name"].to_string(),
                    UsedComponent {
                        version: caps["version"].to_string(),
                        kind: caps["type"].to_string(),
                    },
                )
            })
            .collect()
    }

    fn name(&self) -> &str {
        "script-tag"
    }
}

// ---------------------------------------------------------------------------
// Structural parse
// ---------------------------------------------------------------------------

/// Parses the head fragment and inspects every `<script src>` element.
pub struct HtmlComponentExtractor;

impl ComponentExtractor for HtmlComponentExtractor {
    fn extract(&self, head: &str) -> UsedComponents {
        static SCRIPT_SEL: LazyLock<Selector> =
            LazyLock::new(|| Selector::parse("script[src]").expect("valid selector"));
        static VERSION_RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"-(\d+(?:\.\d+)*)\.js$").expect("valid regex"));

        let fragment = Html::parse_fragment(head);
        let mut components = UsedComponents::new();

        for script in fragment.select(&SCRIPT_SEL) {
            let element = script.value();
            let Some((kind, name)) = element
                .attrs()
                .find_map(|(attr, value)| attr.strip_prefix("custom-").map(|k| (k, value)))
            else {
                continue;
            };
            let Some(version) = element
                .attr("src")
                .and_then(|src| VERSION_RE.captures(src))
                .map(|caps| caps[1].to_string())
            else {
                continue;
            };

            components.insert(
                name.to_string(),
                UsedComponent {
                    version,
                    kind: kind.to_string(),
                },
            );
        }

        components
    }

    fn name(&self) -> &str {
        "html"
    }
}
