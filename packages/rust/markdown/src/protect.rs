//! Literal code region protection.
//!
//! `[sourcecode ...] ... [/sourcecode]` regions are swapped for content-derived
//! placeholders while whitespace passes run, then restored verbatim.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

static CODE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\[sourcecode.*?\[/sourcecode\]").expect("valid regex")
});

/// Protected regions keyed by their placeholder.
#[derive(Debug, Default, Clone)]
pub struct ProtectedBlocks {
    blocks: HashMap<String, String>,
}

impl ProtectedBlocks {
    /// Number of distinct protected regions.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Put every protected region back in place of its placeholder.
    pub fn restore(&self, text: &str) -> String {
        let mut restored = text.to_string();
        for (placeholder, block) in &self.blocks {
            restored = restored.replace(placeholder.as_str(), block);
        }
        restored
    }
}

/// Placeholder for a code region: a SHA-256 digest of its exact bytes.
///
/// Identical regions share a placeholder; the token holds no whitespace so
/// the collapse passes never touch it.
fn placeholder(block: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(block.as_bytes());
    format!("@@SOURCECODE_{:x}@@", hasher.finalize())
}

/// Replace each `[sourcecode]...[/sourcecode]` region (non-greedy, spanning
/// lines) with its placeholder.
pub fn protect_code_blocks(md: &str) -> (String, ProtectedBlocks) {
    let mut protected = ProtectedBlocks::default();

    let text = CODE_BLOCK_RE
        .replace_all(md, |caps: &regex::Captures| {
            let block = &caps[0];
            let key = placeholder(block);
            protected.blocks.entry(key.clone()).or_insert_with(|| block.to_string());
            key
        })
        .into_owned();

    (text, protected)
}
