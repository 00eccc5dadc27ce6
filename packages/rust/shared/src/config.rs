//! Project configuration for the samples builder.
//!
//! Config lives at `<project root>/samplebuilder.toml`.
//! CLI flags override environment, which overrides the config file, which
//! overrides defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SampleBuilderError};
use crate::project::Project;
use crate::routes::DEFAULT_ROUTE_BASE;

/// Default configuration file name, relative to the project root.
pub const CONFIG_FILE_NAME: &str = "samplebuilder.toml";

/// Environment variable selecting the build profile.
pub const PROFILE_ENV: &str = "SAMPLEBUILDER_PROFILE";

// ---------------------------------------------------------------------------
// Config structs (matching samplebuilder.toml schema)
// ---------------------------------------------------------------------------

/// Top-level project config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub templates: TemplatesConfig,

    #[serde(default)]
    pub hosts: HostsConfig,

    #[serde(default)]
    pub build: BuildDefaults,

    #[serde(default)]
    pub parser: ParserConfig,
}

/// `[paths]` section. Every path is project-relative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of the sample source tree.
    #[serde(default = "default_source")]
    pub source: String,
    /// Root of the pages pod.
    #[serde(default = "default_pages")]
    pub pages: String,
    /// Pod path of the documentation collection.
    #[serde(default = "default_documentation_pod_path")]
    pub documentation_pod_path: String,
    /// Pod path of the preview collection.
    #[serde(default = "default_preview_pod_path")]
    pub preview_pod_path: String,
    /// Where raw sources are vended from.
    #[serde(default = "default_sources_dest")]
    pub sources_dest: String,
    /// Where embeds are vended from.
    #[serde(default = "default_embeds_dest")]
    pub embeds_dest: String,
    /// Change detection record.
    #[serde(default = "default_cache")]
    pub cache: String,
    /// Playground sitemap index.
    #[serde(default = "default_sitemap")]
    pub sitemap: String,
    /// Script injected into story embeds.
    #[serde(default = "default_story_embed_snippet")]
    pub story_embed_snippet: String,
    /// Template rendered for ad embeds.
    #[serde(default = "default_ads_embed_template")]
    pub ads_embed_template: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            pages: default_pages(),
            documentation_pod_path: default_documentation_pod_path(),
            preview_pod_path: default_preview_pod_path(),
            sources_dest: default_sources_dest(),
            embeds_dest: default_embeds_dest(),
            cache: default_cache(),
            sitemap: default_sitemap(),
            story_embed_snippet: default_story_embed_snippet(),
            ads_embed_template: default_ads_embed_template(),
        }
    }
}

fn default_source() -> String {
    "examples/source".into()
}
fn default_pages() -> String {
    "pages".into()
}
fn default_documentation_pod_path() -> String {
    "content/amp-dev/documentation/examples/documentation".into()
}
fn default_preview_pod_path() -> String {
    "content/amp-dev/documentation/examples/previews".into()
}
fn default_sources_dest() -> String {
    "dist/examples/sources".into()
}
fn default_embeds_dest() -> String {
    "dist/examples/embeds".into()
}
fn default_cache() -> String {
    ".cache/examples.json".into()
}
fn default_sitemap() -> String {
    "examples/static/samples/samples.json".into()
}
fn default_story_embed_snippet() -> String {
    "frontend/js/story-progress.js".into()
}
fn default_ads_embed_template() -> String {
    "frontend/templates/views/examples/embed-ads.j2".into()
}

/// `[templates]` section: views referenced from generated front matter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    #[serde(default = "default_documentation_template")]
    pub documentation: String,
    #[serde(default = "default_preview_template")]
    pub preview: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            documentation: default_documentation_template(),
            preview: default_preview_template(),
        }
    }
}

fn default_documentation_template() -> String {
    "/views/examples/documentation.j2".into()
}
fn default_preview_template() -> String {
    "/views/examples/preview.j2".into()
}

/// `[hosts]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostsConfig {
    /// Host serving the documentation platform.
    #[serde(default = "default_platform_host")]
    pub platform: String,
    /// API host used by samples depending on one.
    #[serde(default = "default_api_host")]
    pub api: String,
    /// Host used for samples depending on a backend.
    #[serde(default = "default_backend_host")]
    pub backend: String,
    /// Host serving playground previews.
    #[serde(default = "default_preview_host")]
    pub preview: String,
}

impl Default for HostsConfig {
    fn default() -> Self {
        Self {
            platform: default_platform_host(),
            api: default_api_host(),
            backend: default_backend_host(),
            preview: default_preview_host(),
        }
    }
}

fn default_platform_host() -> String {
    "http://localhost:8080".into()
}
fn default_api_host() -> String {
    "https://amp-by-example-api.appspot.com".into()
}
fn default_backend_host() -> String {
    "https://ampbyexample.com".into()
}
fn default_preview_host() -> String {
    "http://localhost:8083".into()
}

impl HostsConfig {
    /// Validate every host as an absolute URL and strip trailing slashes.
    pub fn normalized(&self) -> Result<Self> {
        Ok(Self {
            platform: normalize_host("platform", &self.platform)?,
            api: normalize_host("api", &self.api)?,
            backend: normalize_host("backend", &self.backend)?,
            preview: normalize_host("preview", &self.preview)?,
        })
    }
}

fn normalize_host(name: &str, value: &str) -> Result<String> {
    let url = Url::parse(value)
        .map_err(|e| SampleBuilderError::config(format!("invalid {name} host '{value}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(SampleBuilderError::config(format!(
            "{name} host '{value}' is not an absolute URL"
        )));
    }
    Ok(value.trim_end_matches('/').to_string())
}

/// Build profile; drafts are only built in development.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildProfile {
    #[default]
    Development,
    Staging,
    Production,
}

impl BuildProfile {
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl std::str::FromStr for BuildProfile {
    type Err = SampleBuilderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(SampleBuilderError::config(format!("unknown build profile '{other}'"))),
        }
    }
}

/// Which used-component extractor feeds the documentation teaser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractorKind {
    /// Regex heuristic over `<script custom-*>` tags.
    #[default]
    ScriptTag,
    /// Structural parse of the head fragment.
    Html,
}

/// `[build]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildDefaults {
    #[serde(default)]
    pub profile: BuildProfile,
    /// Maximum number of samples in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Prefix of every sample route.
    #[serde(default = "default_route_base")]
    pub route_base: String,
    #[serde(default)]
    pub component_extractor: ExtractorKind,
}

impl Default for BuildDefaults {
    fn default() -> Self {
        Self {
            profile: BuildProfile::default(),
            concurrency: default_concurrency(),
            route_base: default_route_base(),
            component_extractor: ExtractorKind::default(),
        }
    }
}

fn default_concurrency() -> usize {
    8
}
fn default_route_base() -> String {
    DEFAULT_ROUTE_BASE.into()
}

/// `[parser]` section: the external sample parser subprocess.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default = "default_parser_command")]
    pub command: String,
    #[serde(default = "default_parser_args")]
    pub args: Vec<String>,
    /// Working directory (project-relative); defaults to the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            command: default_parser_command(),
            args: default_parser_args(),
            working_dir: None,
        }
    }
}

fn default_parser_command() -> String {
    "node".into()
}
fn default_parser_args() -> Vec<String> {
    vec!["platform/lib/build/parseSample.js".into()]
}

// ---------------------------------------------------------------------------
// Build config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Absolute locations used by one build.
#[derive(Debug, Clone)]
pub struct BuildPaths {
    pub source: PathBuf,
    /// Parent collection of the documentation and preview pods.
    pub pages_collection: PathBuf,
    pub documentation_dest: PathBuf,
    pub preview_dest: PathBuf,
    pub sources_dest: PathBuf,
    pub embeds_dest: PathBuf,
    pub cache: PathBuf,
    pub sitemap: PathBuf,
    pub story_embed_snippet: PathBuf,
    pub ads_embed_template: PathBuf,
}

/// Runtime build configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub project: Project,
    pub paths: BuildPaths,
    /// Pod path used in data-file references, e.g. `/content/.../documentation`.
    pub documentation_pod_path: String,
    pub templates: TemplatesConfig,
    pub hosts: HostsConfig,
    pub profile: BuildProfile,
    pub concurrency: usize,
    pub route_base: String,
    pub component_extractor: ExtractorKind,
    /// Remove generated destinations before building.
    pub clean: bool,
}

impl BuildConfig {
    /// Resolve an [`AppConfig`] against a project root.
    pub fn resolve(config: &AppConfig, project: Project) -> Result<Self> {
        let paths = &config.paths;
        let pages = project.absolute(&paths.pages);
        let documentation_pod_path = paths.documentation_pod_path.trim_matches('/').to_string();
        let documentation_dest = pages.join(&documentation_pod_path);
        let pages_collection = documentation_dest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| pages.clone());

        let build_paths = BuildPaths {
            source: project.absolute(&paths.source),
            pages_collection,
            documentation_dest,
            preview_dest: pages.join(paths.preview_pod_path.trim_matches('/')),
            sources_dest: project.absolute(&paths.sources_dest),
            embeds_dest: project.absolute(&paths.embeds_dest),
            cache: project.absolute(&paths.cache),
            sitemap: project.absolute(&paths.sitemap),
            story_embed_snippet: project.absolute(&paths.story_embed_snippet),
            ads_embed_template: project.absolute(&paths.ads_embed_template),
        };

        if config.build.concurrency == 0 {
            return Err(SampleBuilderError::config("build.concurrency must be at least 1"));
        }

        Ok(Self {
            paths: build_paths,
            documentation_pod_path: format!("/{documentation_pod_path}"),
            templates: config.templates.clone(),
            hosts: config.hosts.normalized()?,
            profile: config.build.profile,
            concurrency: config.build.concurrency,
            route_base: config.build.route_base.clone(),
            component_extractor: config.build.component_extractor,
            clean: false,
            project,
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Path of the config file for a project root.
pub fn config_file_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Load the project config. Returns defaults if the file does not exist.
pub fn load_config(root: &Path) -> Result<AppConfig> {
    let path = config_file_path(root);

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the project config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SampleBuilderError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        SampleBuilderError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a default config file into the project root.
/// Returns the path to the created file.
pub fn init_config(root: &Path) -> Result<PathBuf> {
    let path = config_file_path(root);
    if path.exists() {
        return Err(SampleBuilderError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| SampleBuilderError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SampleBuilderError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
