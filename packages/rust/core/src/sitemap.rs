//! Playground sitemap: every visible sample grouped by format, then category.
//!
//! Groups keep insertion order. The index is written once per destination;
//! an existing file is left untouched.

use std::path::Path;

use serde::ser::{Serialize, Serializer};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{info, instrument, warn};

use samplebuilder_shared::{Format, ParsedSample, Result, Sample, SampleBuilderError};

/// One playground link.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SitemapEntry {
    pub title: String,
    pub url: String,
}

/// Samples of one category within a format.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CategoryGroup {
    pub name: String,
    pub examples: Vec<SitemapEntry>,
}

/// Categories of one format bucket.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FormatGroup {
    pub title: String,
    pub name: String,
    pub categories: Vec<CategoryGroup>,
}

/// The finalized index, serialized as `{format: {title, name, categories}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapIndex {
    pub formats: Vec<FormatGroup>,
}

impl Serialize for SitemapIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.formats.iter().map(|f| (&f.name, f)))
    }
}

/// Outcome of the terminal sitemap write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapWrite {
    Written,
    AlreadyExists,
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// Run-scoped accumulator, owned by the orchestrator.
#[derive(Debug)]
pub struct Sitemap {
    preview_host: String,
    formats: Vec<(Format, Vec<CategoryGroup>)>,
}

impl Sitemap {
    pub fn new(preview_host: impl Into<String>) -> Self {
        Self {
            preview_host: preview_host.into(),
            formats: Vec::new(),
        }
    }

    /// Number of recorded samples.
    pub fn len(&self) -> usize {
        self.formats
            .iter()
            .flat_map(|(_, categories)| categories)
            .map(|c| c.examples.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a sample under its format bucket and category display name.
    /// The link points at the sample's source route on the preview host.
    pub fn record(&mut self, sample: &Sample, parsed: &ParsedSample, category_name: &str) {
        let format = parsed.format();
        let entry = SitemapEntry {
            title: parsed.document.title.clone(),
            url: format!("{}{}", self.preview_host, sample.routes.source()),
        };

        self.push(format, category_name, entry);
    }

    fn push(&mut self, format: Format, category_name: &str, entry: SitemapEntry) {
        let index = match self.formats.iter().position(|(f, _)| *f == format) {
            Some(i) => i,
            None => {
                self.formats.push((format, Vec::new()));
                self.formats.len() - 1
            }
        };
        let categories = &mut self.formats[index].1;

        match categories.iter_mut().find(|c| c.name == category_name) {
            Some(group) => group.examples.push(entry),
            None => categories.push(CategoryGroup {
                name: category_name.to_string(),
                examples: vec![entry],
            }),
        }
    }

    /// Flatten the accumulator into its serializable shape.
    pub fn finalize(self) -> SitemapIndex {
        SitemapIndex {
            formats: self
                .formats
                .into_iter()
                .map(|(format, categories)| FormatGroup {
                    title: format.as_str().to_string(),
                    name: format.as_str().to_string(),
                    categories,
                })
                .collect(),
        }
    }
}

/// Write the index unless `path` already exists.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn write(index: &SitemapIndex, path: &Path) -> Result<SitemapWrite> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SampleBuilderError::io(parent, e))?;
    }

    let json = serde_json::to_vec(index)
        .map_err(|e| SampleBuilderError::validation(format!("sitemap serialization: {e}")))?;

    let file = match tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            info!("samples sitemap already exists");
            return Ok(SitemapWrite::AlreadyExists);
        }
        Err(e) => return Err(SampleBuilderError::io(path, e)),
    };
    fill(file, path, &json).await?;

    info!(formats = index.formats.len(), "wrote samples sitemap");
    Ok(SitemapWrite::Written)
}

/// Write `json` to the freshly created file at `path`. On failure the
/// partial file is removed so a later run can write the index again.
async fn fill<W: AsyncWrite + Unpin>(mut out: W, path: &Path, json: &[u8]) -> Result<()> {
    let result = async {
        out.write_all(json).await?;
        out.flush().await
    }
    .await;

    if let Err(e) = result {
        drop(out);
        if let Err(remove) = tokio::fs::remove_file(path).await {
            warn!(error = %remove, "failed to remove partial sitemap");
        }
        return Err(SampleBuilderError::io(path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use pretty_assertions::assert_eq;
    use samplebuilder_shared::{Category, DEFAULT_ROUTE_BASE, SourceFile};
    use serde_json::json;

    use super::*;

    fn sample(relative: &str) -> Sample {
        let root = Path::new("/project/examples/source");
        let file = SourceFile::new(root.join(relative), root, Vec::new());
        let category = relative.split('/').next().unwrap_or_default();
        Sample::new(file, Category::new(category), DEFAULT_ROUTE_BASE)
    }

    fn parsed(title: &str, flags: serde_json::Value) -> ParsedSample {
        let mut document = json!({"title": title, "sections": []});
        if let (Some(doc), Some(flags)) = (document.as_object_mut(), flags.as_object()) {
            doc.extend(flags.clone());
        }
        serde_json::from_value(json!({"filePath": "x", "source": "", "document": document})).unwrap()
    }

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("sb-sitemap-{}", uuid::Uuid::now_v7()))
            .join("samples.json")
    }

    #[test]
    fn groups_by_format_then_category_in_insertion_order() {
        let mut sitemap = Sitemap::new("http://localhost:8083");
        sitemap.record(&sample("20_stories/B.html"), &parsed("B", json!({"isAmpStory": true})), "Stories");
        sitemap.record(&sample("01-layout/A.html"), &parsed("A", json!({})), "Layout");
        sitemap.record(&sample("02-forms/C.html"), &parsed("C", json!({"isAmpWebsite": true})), "Forms");
        sitemap.record(&sample("01-layout/D.html"), &parsed("D", json!({})), "Layout");
        assert_eq!(sitemap.len(), 4);

        let json = serde_json::to_string(&sitemap.finalize()).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"stories":{"title":"stories","name":"stories","categories":["#,
                r#"{"name":"Stories","examples":[{"title":"B","url":"http://localhost:8083/documentation/examples/stories/b"}]}]},"#,
                r#""websites":{"title":"websites","name":"websites","categories":["#,
                r#"{"name":"Layout","examples":["#,
                r#"{"title":"A","url":"http://localhost:8083/documentation/examples/layout/a"},"#,
                r#"{"title":"D","url":"http://localhost:8083/documentation/examples/layout/d"}]},"#,
                r#"{"name":"Forms","examples":[{"title":"C","url":"http://localhost:8083/documentation/examples/forms/c"}]}]}}"#,
            )
        );
    }

    #[test]
    fn empty_sitemap_serializes_to_empty_object() {
        let sitemap = Sitemap::new("http://localhost:8083");
        assert!(sitemap.is_empty());
        assert_eq!(serde_json::to_string(&sitemap.finalize()).unwrap(), "{}");
    }

    #[tokio::test]
    async fn second_write_leaves_file_unchanged() {
        let path = temp_path();

        let mut first = Sitemap::new("http://a");
        first.record(&sample("01-layout/A.html"), &parsed("A", json!({})), "Layout");
        assert_eq!(write(&first.finalize(), &path).await.unwrap(), SitemapWrite::Written);
        let written = std::fs::read(&path).unwrap();

        let mut second = Sitemap::new("http://b");
        second.record(&sample("01-layout/Z.html"), &parsed("Z", json!({})), "Layout");
        assert_eq!(
            write(&second.finalize(), &path).await.unwrap(),
            SitemapWrite::AlreadyExists
        );
        assert_eq!(
            write(&SitemapIndex::default(), &path).await.unwrap(),
            SitemapWrite::AlreadyExists
        );
        assert_eq!(std::fs::read(&path).unwrap(), written);

        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    /// Writer that fails like a full disk.
    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            Poll::Ready(Err(std::io::Error::other("no space left on device")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn failed_write_leaves_no_partial_sitemap() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{\"stor").unwrap();

        let err = fill(FullDisk, &path, b"{}").await.unwrap_err();
        assert!(matches!(err, SampleBuilderError::Io { .. }));
        assert!(!path.exists());

        let mut sitemap = Sitemap::new("http://a");
        sitemap.record(&sample("01-layout/A.html"), &parsed("A", json!({})), "Layout");
        assert_eq!(write(&sitemap.finalize(), &path).await.unwrap(), SitemapWrite::Written);

        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }
}
