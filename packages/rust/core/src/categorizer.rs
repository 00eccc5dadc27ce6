//! Category resolution for sample paths, cached for the lifetime of one run.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use samplebuilder_shared::{Category, Result, SampleBuilderError};

/// Descriptor record stored as `index.json` in each category directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDescriptor {
    /// Human-readable name shown in the playground.
    pub public_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Owned by the orchestrator and discarded at the end of a run.
#[derive(Debug)]
pub struct Categorizer {
    source_root: PathBuf,
    categories: HashMap<PathBuf, Category>,
    descriptors: HashMap<String, CategoryDescriptor>,
}

impl Categorizer {
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            categories: HashMap::new(),
            descriptors: HashMap::new(),
        }
    }

    /// Resolve the category of a sample: the first directory below the
    /// source root. Cached by path.
    pub fn resolve(&mut self, path: &Path) -> Result<Category> {
        if let Some(category) = self.categories.get(path) {
            return Ok(category.clone());
        }

        let relative = path.strip_prefix(&self.source_root).map_err(|_| {
            SampleBuilderError::validation(format!(
                "{} is outside the sample source root {}",
                path.display(),
                self.source_root.display()
            ))
        })?;

        let mut components = relative.components();
        let category = match (components.next(), components.next()) {
            (Some(Component::Normal(first)), Some(_)) => Category::new(first.to_string_lossy()),
            _ => {
                return Err(SampleBuilderError::validation(format!(
                    "{} is not inside a category directory",
                    path.display()
                )));
            }
        };

        debug!(path = %path.display(), category = %category, "resolved category");
        self.categories.insert(path.to_path_buf(), category.clone());
        Ok(category)
    }

    /// Category key with or without its ordinal prefix.
    pub fn category(&mut self, path: &Path, include_ordinal: bool) -> Result<String> {
        self.resolve(path)
            .map(|category| category.get(include_ordinal).to_string())
    }

    /// Load (once) the descriptor of a category from
    /// `{source}/{ordered category}/index.json`.
    pub fn descriptor(&mut self, category: &Category) -> Result<&CategoryDescriptor> {
        let key = category.ordered().to_string();
        if !self.descriptors.contains_key(&key) {
            let descriptor = self.read_descriptor(category)?;
            self.descriptors.insert(key.clone(), descriptor);
        }
        self.descriptors
            .get(&key)
            .ok_or_else(|| SampleBuilderError::category(key, "descriptor not cached"))
    }

    fn read_descriptor(&self, category: &Category) -> Result<CategoryDescriptor> {
        let path = self.source_root.join(category.ordered()).join("index.json");
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            SampleBuilderError::category(category.ordered(), format!("{}: {e}", path.display()))
        })?;
        let descriptor: CategoryDescriptor = serde_json::from_str(&raw).map_err(|e| {
            SampleBuilderError::category(category.ordered(), format!("{}: {e}", path.display()))
        })?;

        if descriptor.public_name.trim().is_empty() {
            return Err(SampleBuilderError::category(
                category.ordered(),
                "publicName is empty",
            ));
        }
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sb-categorizer-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn category_with_and_without_ordinal() {
        let mut categorizer = Categorizer::new("/src");
        let path = Path::new("/src/01-category/sample.html");
        assert_eq!(categorizer.category(path, true).unwrap(), "01-category");
        assert_eq!(categorizer.category(path, false).unwrap(), "category");
    }

    #[test]
    fn display_form_is_ordered_form_without_prefix() {
        let mut categorizer = Categorizer::new("/src");
        for dir in ["01-layout", "10_stories", "layout", "2.ads", "x1-y"] {
            let path = PathBuf::from(format!("/src/{dir}/a/index.html"));
            let ordered = categorizer.category(&path, true).unwrap();
            let display = categorizer.category(&path, false).unwrap();
            assert_eq!(display, Category::new(ordered.clone()).display());
            assert_eq!(categorizer.category(&path, true).unwrap(), ordered);
        }
    }

    #[test]
    fn nested_samples_use_first_segment() {
        let mut categorizer = Categorizer::new("/src");
        let category = categorizer
            .resolve(Path::new("/src/30_ads/fluid/index.html"))
            .unwrap();
        assert_eq!(category.ordered(), "30_ads");
    }

    #[test]
    fn paths_outside_a_category_are_rejected() {
        let mut categorizer = Categorizer::new("/src");
        assert!(categorizer.resolve(Path::new("/other/a/b.html")).is_err());
        assert!(categorizer.resolve(Path::new("/src/loose.html")).is_err());
    }

    #[test]
    fn descriptor_is_read_and_cached() {
        let root = temp_root();
        std::fs::create_dir_all(root.join("01-category")).unwrap();
        std::fs::write(
            root.join("01-category/index.json"),
            r#"{"publicName": "Category", "order": 1}"#,
        )
        .unwrap();

        let mut categorizer = Categorizer::new(&root);
        let category = Category::new("01-category");
        assert_eq!(categorizer.descriptor(&category).unwrap().public_name, "Category");

        std::fs::remove_file(root.join("01-category/index.json")).unwrap();
        assert_eq!(categorizer.descriptor(&category).unwrap().public_name, "Category");

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn missing_or_malformed_descriptor_is_a_category_error() {
        let root = temp_root();
        std::fs::create_dir_all(root.join("02-broken")).unwrap();
        std::fs::write(root.join("02-broken/index.json"), r#"{"name": "x"}"#).unwrap();

        let mut categorizer = Categorizer::new(&root);
        let missing = categorizer.descriptor(&Category::new("01-missing"));
        assert!(matches!(missing, Err(SampleBuilderError::Category { .. })));
        let broken = categorizer.descriptor(&Category::new("02-broken"));
        assert!(matches!(broken, Err(SampleBuilderError::Category { .. })));

        std::fs::remove_dir_all(&root).ok();
    }
}
