//! Category keys and the server-relative routes derived from them.
//!
//! Routes are pure functions of (category, stem). They never look at parsed
//! sample content, so they stay stable when the parser output changes.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default prefix for every sample route.
pub const DEFAULT_ROUTE_BASE: &str = "/documentation/examples";

static ORDINAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+.").expect("valid regex"));

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// The first directory segment below the sample source root.
///
/// The key is kept with its ordinal prefix (`01-layout`) for lookups that need
/// ordering; [`Category::display`] strips it (`layout`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(ordered: impl Into<String>) -> Self {
        Self(ordered.into())
    }

    /// The category key including any ordinal prefix.
    pub fn ordered(&self) -> &str {
        &self.0
    }

    /// The category key with a leading `^\d+.` prefix removed.
    pub fn display(&self) -> &str {
        match ORDINAL_RE.find(&self.0) {
            Some(m) => &self.0[m.end()..],
            None => &self.0,
        }
    }

    /// Select the ordered or display form.
    pub fn get(&self, include_ordinal: bool) -> &str {
        if include_ordinal {
            self.ordered()
        } else {
            self.display()
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// Server-relative routes for one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    base: String,
}

impl Routes {
    /// Build routes from the route base, the sample's category and its file stem.
    pub fn new(route_base: &str, category: &Category, stem: &str) -> Self {
        let route_base = route_base.trim_end_matches('/');
        Self {
            base: format!(
                "{route_base}/{}/{}",
                category.display(),
                stem.to_lowercase()
            ),
        }
    }

    /// `{ROUTE_BASE}/{category}/{stem}`
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The base route with `/index.html` appended unless already present.
    pub fn documentation(&self) -> String {
        if self.base.ends_with("/index.html") {
            self.base.clone()
        } else {
            format!("{}/index.html", self.base)
        }
    }

    pub fn preview(&self) -> String {
        format!("{}/preview/index.html", self.base)
    }

    pub fn source(&self) -> String {
        self.base.clone()
    }

    pub fn embed(&self) -> String {
        format!("{}/embed", self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_strips_ordinal_prefix() {
        let category = Category::new("01-category");
        assert_eq!(category.ordered(), "01-category");
        assert_eq!(category.display(), "category");
        assert_eq!(category.get(true), "01-category");
        assert_eq!(category.get(false), "category");
    }

    #[test]
    fn display_without_ordinal_is_unchanged() {
        let category = Category::new("visual-effects");
        assert_eq!(category.display(), "visual-effects");
    }

    #[test]
    fn ordinal_separator_can_be_any_char() {
        assert_eq!(Category::new("7_misc").display(), "misc");
        assert_eq!(Category::new("12.faq").display(), "faq");
    }

    #[test]
    fn routes_for_sample() {
        let routes = Routes::new(DEFAULT_ROUTE_BASE, &Category::new("01-category"), "sample");
        assert_eq!(routes.base(), "/documentation/examples/category/sample");
        assert_eq!(
            routes.documentation(),
            "/documentation/examples/category/sample/index.html"
        );
        assert_eq!(
            routes.preview(),
            "/documentation/examples/category/sample/preview/index.html"
        );
        assert_eq!(routes.source(), "/documentation/examples/category/sample");
        assert_eq!(routes.embed(), "/documentation/examples/category/sample/embed");
    }

    #[test]
    fn routes_lowercase_the_stem() {
        let routes = Routes::new(DEFAULT_ROUTE_BASE, &Category::new("02-ads"), "Sticky_Ad");
        assert_eq!(routes.base(), "/documentation/examples/ads/sticky_ad");
    }

    #[test]
    fn documentation_route_does_not_double_index() {
        let routes = Routes::new("/docs", &Category::new("misc"), "index.html");
        assert_eq!(routes.documentation(), "/docs/misc/index.html");
    }
}
