//! Project-relative path helpers.

use std::path::{Path, PathBuf};

/// The project root every configured path is resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a project-relative path. Leading slashes are ignored so that
    /// `/pages/x` and `pages/x` resolve to the same location.
    pub fn absolute(&self, relative: impl AsRef<Path>) -> PathBuf {
        let relative = relative.as_ref();
        let relative = relative.strip_prefix("/").unwrap_or(relative);
        self.root.join(relative)
    }

    /// Express `path` relative to the project root with `/` separators.
    ///
    /// Paths outside the project are returned unchanged.
    pub fn relative(&self, path: impl AsRef<Path>) -> String {
        let path = path.as_ref();
        match path.strip_prefix(&self.root) {
            Ok(rel) => rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => path.to_string_lossy().into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_ignores_leading_slash() {
        let project = Project::new("/srv/site");
        assert_eq!(
            project.absolute("/pages/content"),
            PathBuf::from("/srv/site/pages/content")
        );
        assert_eq!(
            project.absolute("pages/content"),
            PathBuf::from("/srv/site/pages/content")
        );
    }

    #[test]
    fn relative_strips_root() {
        let project = Project::new("/srv/site");
        assert_eq!(
            project.relative("/srv/site/examples/source/01-intro/hello.html"),
            "examples/source/01-intro/hello.html"
        );
    }

    #[test]
    fn relative_outside_project_is_unchanged() {
        let project = Project::new("/srv/site");
        assert_eq!(project.relative("/elsewhere/a.html"), "/elsewhere/a.html");
    }
}
