//! Removal of previously generated output before a full rebuild.

use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info, instrument};

use samplebuilder_shared::{BuildPaths, Result, SampleBuilderError};
use samplebuilder_storage::BuildCache;

/// Collection config kept in every cleaned pod directory.
const BLUEPRINT: &str = "_blueprint.yaml";

/// Clean every build destination:
/// - the pages collection keeps only its blueprint and `index.html`
/// - the documentation and preview directories keep only their blueprint
/// - the source and embed trees and the cache record are removed
///
/// Missing paths are ignored. Returns the number of removed entries.
#[instrument(skip_all)]
pub fn clean_destinations(paths: &BuildPaths) -> Result<usize> {
    info!("cleaning sample destinations for rebuild");
    let mut removed = 0;

    for pod in [&paths.documentation_dest, &paths.preview_dest] {
        removed += clean_dir(pod, &[BLUEPRINT], &[])?;
    }
    removed += clean_dir(
        &paths.pages_collection,
        &[BLUEPRINT, "index.html"],
        &[paths.documentation_dest.as_path(), paths.preview_dest.as_path()],
    )?;

    for tree in [&paths.sources_dest, &paths.embeds_dest] {
        removed += remove_path(tree)?;
    }
    if paths.cache.exists() {
        BuildCache::remove(&paths.cache)?;
        removed += 1;
    }

    info!(removed, "cleaned sample destinations");
    Ok(removed)
}

/// Remove the contents of `dir` except top-level files named in `keep` and
/// the directories in `skip`.
fn clean_dir(dir: &Path, keep: &[&str], skip: &[&Path]) -> Result<usize> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(SampleBuilderError::io(dir, e)),
    };

    let mut removed = 0;
    for entry in entries {
        let path = entry.map_err(|e| SampleBuilderError::io(dir, e))?.path();
        let kept = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| keep.contains(&name));
        if kept || skip.contains(&path.as_path()) {
            continue;
        }
        removed += remove_path(&path)?;
    }
    Ok(removed)
}

/// Remove a file or directory tree; a missing path counts as nothing removed.
fn remove_path(path: &Path) -> Result<usize> {
    let result = match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(SampleBuilderError::io(path, e)),
    };
    result.map_err(|e| SampleBuilderError::io(path, e))?;
    debug!(path = %path.display(), "removed");
    Ok(1)
}
