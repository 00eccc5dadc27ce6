//! Core domain types: source files, parsed samples and generated artifacts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SampleBuilderError};
use crate::routes::{Category, Routes};

// ---------------------------------------------------------------------------
// SourceFile
// ---------------------------------------------------------------------------

/// One raw sample document read from the source tree. Immutable once read.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Routing path: `{dir}/index.html` samples are normalized to `{dir}.html`.
    pub path: PathBuf,
    /// The file as it exists on disk.
    pub origin: PathBuf,
    /// Path relative to the source root, for display.
    pub relative: String,
    /// Raw file contents.
    pub contents: Vec<u8>,
}

impl SourceFile {
    pub fn new(origin: impl Into<PathBuf>, source_root: &Path, contents: Vec<u8>) -> Self {
        let origin = origin.into();
        let relative = origin
            .strip_prefix(source_root)
            .unwrap_or(&origin)
            .to_string_lossy()
            .replace('\\', "/");
        Self {
            path: routing_path(&origin),
            origin,
            relative,
            contents,
        }
    }

    /// File name without extension, taken from the routing path.
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }

    /// Directory of the routing path.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }

    /// Contents as UTF-8 text.
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.contents).map_err(|e| {
            SampleBuilderError::parse(format!("{} is not valid UTF-8: {e}", self.relative))
        })
    }
}

/// Map a directory-style sample (`{dir}/index.html`) to its flat sibling form
/// (`{dir}.html`) so both layouts route identically. Other paths are unchanged.
pub fn routing_path(path: &Path) -> PathBuf {
    let is_index = path.file_name().is_some_and(|name| name == "index.html");
    match (is_index, path.parent()) {
        (true, Some(dir)) => match dir.file_name() {
            Some(name) => dir.with_file_name(format!("{}.html", name.to_string_lossy())),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}

// ---------------------------------------------------------------------------
// Sample
// ---------------------------------------------------------------------------

/// A source file together with its resolved category and routes.
#[derive(Debug, Clone)]
pub struct Sample {
    pub file: SourceFile,
    pub category: Category,
    pub routes: Routes,
}

impl Sample {
    pub fn new(file: SourceFile, category: Category, route_base: &str) -> Self {
        let routes = Routes::new(route_base, &category, file.stem());
        Self {
            file,
            category,
            routes,
        }
    }
}

// ---------------------------------------------------------------------------
// ParsedSample
// ---------------------------------------------------------------------------

/// The structured sample returned by the external parser, decorated by the
/// document adapter. Unknown fields are carried through untouched so the
/// serialized data file stays complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSample {
    /// Absolute on input; rewritten to project-relative by the adapter.
    pub file_path: String,
    pub document: SampleDocument,
    /// Full reconstructed sample source.
    pub source: String,
    /// Documentation route, attached by the adapter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ParsedSample {
    pub fn format(&self) -> Format {
        Format::classify(&self.document)
    }
}

/// The parsed document model of a sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleDocument {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    pub sections: Vec<Section>,
    #[serde(default)]
    pub head: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub styles: String,
    #[serde(default)]
    pub elements_after_body: String,
    #[serde(default)]
    pub is_amp_story: bool,
    #[serde(default)]
    pub is_amp_ads: bool,
    #[serde(default)]
    pub is_amp_email: bool,
    #[serde(default)]
    pub is_amp_website: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SampleDocument {
    /// The explicit description, or the first paragraph of the first section
    /// that has any text.
    pub fn description(&self) -> String {
        if let Some(description) = self.description.as_deref().filter(|d| !d.trim().is_empty()) {
            return description.trim().to_string();
        }

        self.sections
            .iter()
            .flat_map(|s| s.markdown.split("\n\n"))
            .map(str::trim)
            .find(|p| !p.is_empty() && !p.starts_with('[') && !p.starts_with('#'))
            .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default()
    }
}

/// Recognized sample metadata flags; anything else lands in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub drafts: bool,
    #[serde(default)]
    pub disable_playground: bool,
    /// Either a flag or a named preview mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<Value>,
    #[serde(default)]
    pub standalone_snippets: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teaser_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributors: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metadata {
    /// Whether the sample asks for a dedicated preview page.
    pub fn wants_preview(&self) -> bool {
        match &self.preview {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(mode)) => !mode.is_empty(),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::Array(_) | Value::Object(_)) => true,
        }
    }

    /// Samples built but kept out of the playground sitemap.
    pub fn hidden_from_sitemap(&self) -> bool {
        self.disable_playground || self.drafts
    }
}

/// A titled sub-unit of a parsed sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    /// Section documentation text, normalized by the adapter.
    #[serde(default, rename = "doc_")]
    pub markdown: String,
    /// Rendered preview fragment.
    #[serde(default)]
    pub preview: String,
    #[serde(default)]
    pub in_body: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Section {
    /// Whether the section can be rendered as its own standalone document.
    pub fn is_standalone(&self) -> bool {
        self.in_body && self.preview.chars().any(|c| !c.is_whitespace())
    }
}

// ---------------------------------------------------------------------------
// Format
// ---------------------------------------------------------------------------

/// Format bucket, the primary classification axis of the sitemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Stories,
    Ads,
    Email,
    Websites,
}

impl Format {
    /// First match wins: story, ad, email, then websites as the fallback
    /// (the website flag can be set for any format).
    pub fn classify(document: &SampleDocument) -> Self {
        if document.is_amp_story {
            Self::Stories
        } else if document.is_amp_ads {
            Self::Ads
        } else if document.is_amp_email {
            Self::Email
        } else {
            Self::Websites
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stories => "stories",
            Self::Ads => "ads",
            Self::Email => "email",
            Self::Websites => "websites",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GeneratedArtifact
// ---------------------------------------------------------------------------

/// Kind tag of a generated artifact; determines its destination root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    DocumentationPage,
    DocumentationData,
    Preview,
    SourceFull,
    SourceSection,
    Embed,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentationPage => "documentation-page",
            Self::DocumentationData => "documentation-data",
            Self::Preview => "preview",
            Self::SourceFull => "source-full",
            Self::SourceSection => "source-section",
            Self::Embed => "embed",
        }
    }
}

/// One generated output file, before placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub kind: ArtifactKind,
    /// File name; the destination directory is derived from `kind`.
    pub name: String,
    pub contents: Vec<u8>,
}

impl GeneratedArtifact {
    pub fn new(kind: ArtifactKind, name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// Contents as text (lossy), mostly for tests and logging.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents).into_owned()
    }
}
