//! End-to-end samples build: discover → filter → parse → generate → place → sitemap.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use samplebuilder_artifacts::GeneratorContext;
use samplebuilder_shared::{
    ArtifactKind, BuildConfig, BuildPaths, BuildProfile, Category, GeneratedArtifact,
    HostsConfig, ParsedSample, Project, Result, Sample, SampleBuilderError, SourceFile,
};
use samplebuilder_storage::BuildCache;

use crate::categorizer::Categorizer;
use crate::clean::clean_destinations;
use crate::document::parse_sample;
use crate::parser::SampleParser;
use crate::sitemap::{self, Sitemap, SitemapWrite};

/// What started a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTrigger {
    /// First run of the process; honours `--clean`.
    Initial,
    /// File change under the source root; always incremental.
    Watch,
}

/// Summary of one build run.
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// Samples matched by discovery.
    pub discovered: usize,
    /// Samples skipped because their content is unchanged.
    pub cached: usize,
    /// Draft samples skipped for this profile.
    pub drafts: usize,
    pub built: usize,
    pub failed: usize,
    /// Artifact files written.
    pub artifacts: usize,
    pub sitemap: SitemapWrite,
    pub elapsed: Duration,
}

/// Progress callback for reporting build status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a sample's artifacts have been written.
    fn sample_built(&self, path: &str, current: usize, total: usize);
    /// Called when a sample is skipped because of an error.
    fn sample_failed(&self, path: &str, error: &str);
    /// Called when the build completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn sample_built(&self, _path: &str, _current: usize, _total: usize) {}
    fn sample_failed(&self, _path: &str, _error: &str) {}
    fn done(&self, _result: &BuildResult) {}
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// Destination roots, one per artifact family.
#[derive(Debug, Clone)]
pub struct Destinations {
    pub documentation: PathBuf,
    pub preview: PathBuf,
    pub sources: PathBuf,
    pub embeds: PathBuf,
}

impl Destinations {
    pub fn new(paths: &BuildPaths) -> Self {
        Self {
            documentation: paths.documentation_dest.clone(),
            preview: paths.preview_dest.clone(),
            sources: paths.sources_dest.clone(),
            embeds: paths.embeds_dest.clone(),
        }
    }

    /// Final location of an artifact. Pod pages are flat; sources and embeds
    /// nest under the category display name.
    pub fn place(&self, kind: ArtifactKind, category: &Category, name: &str) -> PathBuf {
        match kind {
            ArtifactKind::DocumentationPage | ArtifactKind::DocumentationData => {
                self.documentation.join(name)
            }
            ArtifactKind::Preview => self.preview.join(name),
            ArtifactKind::SourceFull | ArtifactKind::SourceSection => {
                self.sources.join(category.display()).join(name)
            }
            ArtifactKind::Embed => self.embeds.join(category.display()).join(name),
        }
    }

    /// Paths a sample owns before it is parsed: its pod pages by stem, its
    /// full source and embed by lowercase stem.
    pub fn reserved(&self, category: &Category, stem: &str) -> [PathBuf; 5] {
        let lower = format!("{}.html", stem.to_lowercase());
        [
            self.place(ArtifactKind::DocumentationPage, category, &format!("{stem}.html")),
            self.place(ArtifactKind::DocumentationData, category, &format!("{stem}.json")),
            self.place(ArtifactKind::Preview, category, &format!("{stem}.html")),
            self.place(ArtifactKind::SourceFull, category, &lower),
            self.place(ArtifactKind::Embed, category, &lower),
        ]
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Read-only inputs shared with every sample task.
struct TaskShared<P> {
    parser: Arc<P>,
    generators: GeneratorContext,
    hosts: HostsConfig,
    project: Project,
    profile: BuildProfile,
}

/// What a finished sample task hands back to the orchestrator.
enum SampleOutcome {
    /// Draft outside development; nothing generated.
    Draft,
    Generated {
        parsed: Box<ParsedSample>,
        artifacts: Vec<GeneratedArtifact>,
    },
}

struct TaskReport {
    sample: Sample,
    cache_key: String,
    hash: String,
    outcome: Result<SampleOutcome>,
}

/// Drives sample builds for one project.
pub struct SamplesBuilder<P> {
    config: BuildConfig,
    parser: Arc<P>,
}

impl<P: SampleParser> SamplesBuilder<P> {
    pub fn new(config: BuildConfig, parser: P) -> Self {
        Self {
            config,
            parser: Arc::new(parser),
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Run one build.
    ///
    /// Per-sample failures are logged and counted, never returned. Errors
    /// before the first sample starts (assets, discovery) or after the last
    /// one settles (sitemap write) abort the run.
    #[instrument(skip_all, fields(trigger = ?trigger, profile = ?self.config.profile))]
    pub async fn build(
        &self,
        trigger: BuildTrigger,
        progress: &dyn ProgressReporter,
    ) -> Result<BuildResult> {
        let start = Instant::now();
        let paths = &self.config.paths;
        let clean = self.config.clean && trigger == BuildTrigger::Initial;

        info!(source = %paths.source.display(), clean, "starting to build samples");

        // --- Phase 1: Clean ---
        if clean {
            progress.phase("Cleaning sample destinations");
            clean_destinations(paths)?;
        }

        // --- Phase 2: Assets ---
        progress.phase("Loading embed assets");
        let generators = GeneratorContext::new(
            &self.config,
            read_asset(&paths.story_embed_snippet).await?,
            read_asset(&paths.ads_embed_template).await?,
        )?;
        debug!(extractor = generators.extractor.name(), "generator context ready");

        // --- Phase 3: Discovery ---
        progress.phase("Discovering samples");
        let files = discover(&paths.source)?;
        let discovered = files.len();

        let mut cache = if clean {
            BuildCache::empty(&paths.cache)
        } else {
            BuildCache::load(&paths.cache)
        };

        // --- Phase 4: Parse + generate, bounded ---
        progress.phase("Building samples");
        let shared = Arc::new(TaskShared {
            parser: Arc::clone(&self.parser),
            generators,
            hosts: self.config.hosts.clone(),
            project: self.config.project.clone(),
            profile: self.config.profile,
        });
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut categorizer = Categorizer::new(&paths.source);
        let destinations = Destinations::new(paths);
        // Destination path -> owning sample. Filled in discovery order, so
        // the first sample keeps a contested name on every run.
        let mut claimed: HashMap<PathBuf, String> = HashMap::new();
        let mut tasks = JoinSet::new();
        let mut cached = 0;
        let mut failed = 0;

        for path in files {
            let rel_path = self.config.project.relative(&path);
            let contents = match tokio::fs::read(&path).await {
                Ok(contents) => contents,
                Err(e) => {
                    error!(sample = %rel_path, error = %e, "failed to read sample");
                    progress.sample_failed(&rel_path, &e.to_string());
                    failed += 1;
                    continue;
                }
            };

            let hash = BuildCache::content_hash(&contents);
            let file = SourceFile::new(&path, &paths.source, contents);
            let category = match categorizer.resolve(&file.path) {
                Ok(category) => category,
                Err(e) => {
                    error!(sample = %rel_path, error = %e, "failed to categorize sample");
                    progress.sample_failed(&rel_path, &e.to_string());
                    failed += 1;
                    continue;
                }
            };

            let reserved = destinations.reserved(&category, file.stem());
            if let Some((taken, owner)) = reserved
                .iter()
                .find_map(|p| claimed.get(p).map(|owner| (p, owner)))
            {
                let e = SampleBuilderError::validation(format!(
                    "{} is already produced by {owner}",
                    taken.display()
                ));
                error!(sample = %rel_path, error = %e, "skipping colliding sample");
                progress.sample_failed(&rel_path, &e.to_string());
                cache.forget(&rel_path);
                failed += 1;
                continue;
            }
            claimed.extend(reserved.into_iter().map(|p| (p, rel_path.clone())));

            if !clean && cache.is_fresh(&rel_path, &hash) {
                debug!(sample = %rel_path, "unchanged, skipping");
                cached += 1;
                continue;
            }

            let sample = Sample::new(file, category, &self.config.route_base);

            let shared = Arc::clone(&shared);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => process_sample(&shared, &sample).await,
                    Err(e) => Err(SampleBuilderError::validation(format!("build aborted: {e}"))),
                };
                TaskReport {
                    sample,
                    cache_key: rel_path,
                    hash,
                    outcome,
                }
            });
        }

        // --- Phase 5: Place artifacts as samples settle ---
        let total = tasks.len();
        let mut sitemap = Sitemap::new(&self.config.hosts.preview);
        let mut settled = 0;
        let mut drafts = 0;
        let mut built = 0;
        let mut written = 0;

        while let Some(joined) = tasks.join_next().await {
            settled += 1;
            let report = match joined {
                Ok(report) => report,
                Err(e) => {
                    error!(error = %e, "sample task panicked");
                    failed += 1;
                    continue;
                }
            };
            let relative = report.sample.file.relative.clone();

            let result = match report.outcome {
                Ok(SampleOutcome::Draft) => {
                    debug!(sample = %relative, "skipping draft");
                    drafts += 1;
                    cache.record(report.cache_key, report.hash);
                    continue;
                }
                Ok(SampleOutcome::Generated { parsed, artifacts }) => {
                    place_sample(
                        &report.sample,
                        &report.cache_key,
                        &parsed,
                        artifacts,
                        &destinations,
                        &mut categorizer,
                        &mut sitemap,
                        &mut claimed,
                    )
                    .await
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(count) => {
                    built += 1;
                    written += count;
                    cache.record(report.cache_key, report.hash);
                    progress.sample_built(&relative, settled, total);
                    debug!(sample = %relative, artifacts = count, "built sample");
                }
                Err(e) => {
                    failed += 1;
                    cache.forget(&report.cache_key);
                    progress.sample_failed(&relative, &e.to_string());
                    error!(sample = %relative, error = %e, "failed to build sample");
                }
            }
        }

        // --- Phase 6: Barrier passed; persist cache and sitemap ---
        progress.phase("Writing sitemap");
        if let Err(e) = cache.save() {
            warn!(error = %e, "failed to save build cache");
        }
        let sitemap = sitemap::write(&sitemap.finalize(), &paths.sitemap).await?;

        let result = BuildResult {
            discovered,
            cached,
            drafts,
            built,
            failed,
            artifacts: written,
            sitemap,
            elapsed: start.elapsed(),
        };
        progress.done(&result);

        info!(
            discovered = result.discovered,
            cached = result.cached,
            drafts = result.drafts,
            built = result.built,
            failed = result.failed,
            artifacts = result.artifacts,
            elapsed_ms = result.elapsed.as_millis(),
            "built samples"
        );

        Ok(result)
    }
}

/// Parse one sample, apply the draft gate and run the generators. Touches no
/// orchestrator state.
async fn process_sample<P: SampleParser>(
    shared: &TaskShared<P>,
    sample: &Sample,
) -> Result<SampleOutcome> {
    debug!(sample = %sample.file.relative, "building sample");
    let parsed = parse_sample(&*shared.parser, sample, &shared.hosts, &shared.project).await?;

    if parsed.document.metadata.draft && !shared.profile.is_development() {
        return Ok(SampleOutcome::Draft);
    }

    let artifacts = samplebuilder_artifacts::generate_all(sample, &parsed, &shared.generators)?;
    Ok(SampleOutcome::Generated {
        parsed: Box::new(parsed),
        artifacts,
    })
}

/// Claim destinations, resolve the sitemap category, write every artifact,
/// then record the sample. Any failure before the first write leaves no
/// trace; a failed write removes what this sample already wrote.
#[allow(clippy::too_many_arguments)]
async fn place_sample(
    sample: &Sample,
    owner: &str,
    parsed: &ParsedSample,
    artifacts: Vec<GeneratedArtifact>,
    destinations: &Destinations,
    categorizer: &mut Categorizer,
    sitemap: &mut Sitemap,
    claimed: &mut HashMap<PathBuf, String>,
) -> Result<usize> {
    let placed: Vec<(PathBuf, GeneratedArtifact)> = artifacts
        .into_iter()
        .map(|a| (destinations.place(a.kind, &sample.category, &a.name), a))
        .collect();

    let mut own = HashSet::with_capacity(placed.len());
    for (path, _) in &placed {
        if !own.insert(path) {
            return Err(SampleBuilderError::validation(format!(
                "{} is produced twice by this sample",
                path.display()
            )));
        }
        if let Some(other) = claimed.get(path).filter(|other| *other != owner) {
            return Err(SampleBuilderError::validation(format!(
                "{} is already produced by {other}",
                path.display()
            )));
        }
    }

    let category_name = if parsed.document.metadata.hidden_from_sitemap() {
        None
    } else {
        Some(categorizer.descriptor(&sample.category)?.public_name.clone())
    };

    let mut written: Vec<&Path> = Vec::with_capacity(placed.len());
    for (path, artifact) in &placed {
        if let Err(e) = write_atomic(path, &artifact.contents).await {
            for done in written {
                let _ = tokio::fs::remove_file(done).await;
            }
            return Err(e);
        }
        written.push(path);
    }

    let count = written.len();
    claimed.extend(placed.into_iter().map(|(path, _)| (path, owner.to_string())));
    if let Some(name) = category_name {
        sitemap.record(sample, parsed, &name);
    }
    Ok(count)
}

// ---------------------------------------------------------------------------
// Filesystem helpers
// ---------------------------------------------------------------------------

/// Samples two and three levels below the source root, in sorted order.
pub fn discover(source: &Path) -> Result<Vec<PathBuf>> {
    let meta = std::fs::metadata(source).map_err(|e| SampleBuilderError::io(source, e))?;
    if !meta.is_dir() {
        return Err(SampleBuilderError::config(format!(
            "sample source {} is not a directory",
            source.display()
        )));
    }

    let root = glob::Pattern::escape(&source.to_string_lossy());
    let mut files = Vec::new();
    for pattern in [format!("{root}/*/*.html"), format!("{root}/*/*/*.html")] {
        let entries = glob::glob(&pattern)
            .map_err(|e| SampleBuilderError::config(format!("invalid pattern {pattern}: {e}")))?;
        for entry in entries {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                SampleBuilderError::io(path, e.into_error())
            })?;
            if path.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();

    info!(count = files.len(), "discovered samples");
    Ok(files)
}

async fn read_asset(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SampleBuilderError::io(path, e))
}

/// Write to a temporary sibling, then rename into place.
async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SampleBuilderError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    tokio::fs::write(&tmp, contents)
        .await
        .map_err(|e| SampleBuilderError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| SampleBuilderError::io(path, e))
}
