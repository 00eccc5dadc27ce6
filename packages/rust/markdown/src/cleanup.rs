//! Text passes applied to section markdown before it reaches the renderer.
//!
//! Each pass is a function `&str -> String`. Ordering and code-region
//! protection are handled by [`crate::normalize_markdown`].

use std::sync::LazyLock;

use regex::{Captures, Regex};

// ---------------------------------------------------------------------------
// Pass 1: Rewrite code fences
// ---------------------------------------------------------------------------

/// Rewrite GitHub-style fenced code blocks into the renderer's
/// `[sourcecode:lang] ... [/sourcecode]` blocks.
///
/// The fence's indentation is kept on both markers; the code between the
/// fences is copied byte for byte.
pub fn rewrite_code_blocks(md: &str) -> String {
    static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?ms)^([ \t]*)```[ \t]*([\w+#.-]*)[ \t]*\n(.*?)\n[ \t]*```[ \t]*$")
            .expect("valid regex")
    });

    FENCE_RE
        .replace_all(md, |caps: &Captures| {
            let indent = &caps[1];
            let lang = &caps[2];
            let code = &caps[3];
            let open = if lang.is_empty() {
                "[sourcecode]".to_string()
            } else {
                format!("[sourcecode:{lang}]")
            };
            format!("{indent}{open}\n{code}\n{indent}[/sourcecode]")
        })
        .into_owned()
}

// ---------------------------------------------------------------------------
// Pass 2: Escape mustache tags
// ---------------------------------------------------------------------------

/// Wrap `{{ ... }}` expressions in `{% raw %}` so the page renderer does not
/// evaluate them. Text already inside a raw block is left alone.
pub fn escape_mustache_tags(md: &str) -> String {
    static RAW_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)\{%-?\s*raw\s*-?%\}.*?\{%-?\s*endraw\s*-?%\}").expect("valid regex")
    });
    static MUSTACHE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)\{\{.*?\}\}").expect("valid regex"));

    let mut result = String::with_capacity(md.len());
    let mut last = 0;

    for raw in RAW_RE.find_iter(md) {
        result.push_str(&MUSTACHE_RE.replace_all(&md[last..raw.start()], "{% raw %}$0{% endraw %}"));
        result.push_str(raw.as_str());
        last = raw.end();
    }
    result.push_str(&MUSTACHE_RE.replace_all(&md[last..], "{% raw %}$0{% endraw %}"));

    result
}

// ---------------------------------------------------------------------------
// Pass 4 + 5: Collapse whitespace
// ---------------------------------------------------------------------------

/// Replace leading whitespace runs at line starts with a bare newline, then
/// fold a newline followed by indentation, or any run of two or more
/// newlines, into exactly one blank line.
///
/// Must only run on text whose literal code regions have been protected.
pub fn collapse_whitespace(md: &str) -> String {
    static LEADING_WS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^\s+").expect("valid regex"));
    static BREAKS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n +|\n{2,}").expect("valid regex"));

    let md = LEADING_WS_RE.replace_all(md, "\n");
    BREAKS_RE.replace_all(&md, "\n\n").into_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
