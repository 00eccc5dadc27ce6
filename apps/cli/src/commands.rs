//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use samplebuilder_core::{
    BuildResult, BuildTrigger, CommandParser, ProgressReporter, SamplesBuilder, SitemapWrite,
};
use samplebuilder_shared::{
    AppConfig, BuildConfig, BuildProfile, PROFILE_ENV, Project, init_config, load_config,
    load_config_from,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// samplebuilder: turn sample markup into documentation and playground artifacts.
#[derive(Parser)]
#[command(
    name = "samplebuilder",
    version,
    about = "Build documentation pages, previews, sources and embeds from sample HTML.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Project root (defaults to the current directory).
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file (defaults to <root>/samplebuilder.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Build profile: development, staging or production.
    #[arg(long, env = PROFILE_ENV, global = true)]
    pub profile: Option<BuildProfile>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build every changed sample.
    Build {
        /// Remove generated output and rebuild everything.
        #[arg(long)]
        clean: bool,

        /// Keep running and rebuild when samples change.
        #[arg(long)]
        watch: bool,

        /// Maximum number of samples built at once.
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "samplebuilder=info",
        1 => "samplebuilder=debug",
        _ => "samplebuilder=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().wrap_err("cannot determine working directory")?,
    };
    let config = resolve_config(&root, cli.config.as_deref(), cli.profile)?;

    match cli.command {
        Command::Build {
            clean,
            watch,
            concurrency,
        } => cmd_build(root, config, clean, watch, concurrency).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(&root),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

/// File (or defaults), then the profile flag/environment on top.
fn resolve_config(
    root: &Path,
    file: Option<&Path>,
    profile: Option<BuildProfile>,
) -> Result<AppConfig> {
    let mut config = match file {
        Some(path) => load_config_from(path)?,
        None => load_config(root)?,
    };
    if let Some(profile) = profile {
        config.build.profile = profile;
    }
    Ok(config)
}

async fn cmd_build(
    root: PathBuf,
    mut config: AppConfig,
    clean: bool,
    watch: bool,
    concurrency: Option<usize>,
) -> Result<()> {
    if let Some(concurrency) = concurrency {
        config.build.concurrency = concurrency;
    }

    let project = Project::new(root);
    let parser = CommandParser::new(&config.parser, &project);
    let mut build_config = BuildConfig::resolve(&config, project)?;
    build_config.clean = clean;

    info!(
        root = %build_config.project.root().display(),
        profile = ?build_config.profile,
        clean,
        watch,
        "building samples"
    );

    let builder = SamplesBuilder::new(build_config, parser);
    let reporter = CliProgress::new();

    builder.build(BuildTrigger::Initial, &reporter).await?;

    if watch {
        println!("  Watching for changes (Ctrl-C to stop)");
        samplebuilder_core::watch(&builder, &reporter).await?;
    }

    Ok(())
}

fn cmd_config_init(root: &Path) -> Result<()> {
    let path = init_config(root)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner, recreated for every
/// build so watch-mode rebuilds get their own.
struct CliProgress {
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn with_spinner(&self, f: impl FnOnce(&ProgressBar)) {
        let Ok(mut guard) = self.spinner.lock() else {
            return;
        };
        let spinner = guard.get_or_insert_with(new_spinner);
        f(spinner);
    }
}

fn new_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(
            style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
    }
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.with_spinner(|s| s.set_message(name.to_string()));
    }

    fn sample_built(&self, path: &str, current: usize, total: usize) {
        self.with_spinner(|s| s.set_message(format!("Building [{current}/{total}] {path}")));
    }

    fn sample_failed(&self, path: &str, error: &str) {
        self.with_spinner(|s| s.println(format!("  ✗ {path}: {error}")));
    }

    fn done(&self, result: &BuildResult) {
        let finished = self.spinner.lock().ok().and_then(|mut guard| guard.take());
        if let Some(spinner) = finished {
            spinner.finish_and_clear();
        }

        let sitemap = match result.sitemap {
            SitemapWrite::Written => "written",
            SitemapWrite::AlreadyExists => "already exists",
        };
        println!();
        println!("  Samples built.");
        println!("  Discovered: {}", result.discovered);
        println!("  Unchanged:  {}", result.cached);
        println!("  Drafts:     {}", result.drafts);
        println!("  Built:      {}", result.built);
        println!("  Failed:     {}", result.failed);
        println!("  Artifacts:  {}", result.artifacts);
        println!("  Sitemap:    {sitemap}");
        println!("  Time:       {:.1}s", result.elapsed.as_secs_f64());
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_flags_parse() {
        let cli = Cli::try_parse_from([
            "samplebuilder",
            "build",
            "--clean",
            "--watch",
            "--concurrency",
            "2",
            "--profile",
            "production",
            "--root",
            "/srv/site",
        ])
        .unwrap();

        assert_eq!(cli.profile, Some(BuildProfile::Production));
        assert_eq!(cli.root, Some(PathBuf::from("/srv/site")));
        match cli.command {
            Command::Build {
                clean,
                watch,
                concurrency,
            } => {
                assert!(clean);
                assert!(watch);
                assert_eq!(concurrency, Some(2));
            }
            Command::Config { .. } => panic!("expected build"),
        }
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let result = Cli::try_parse_from(["samplebuilder", "build", "--profile", "nightly"]);
        assert!(result.is_err());
    }

    #[test]
    fn profile_flag_overrides_file() {
        let root = std::env::temp_dir().join(format!("sb-cli-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(
            root.join("samplebuilder.toml"),
            "[build]\nprofile = \"staging\"\nconcurrency = 3\n",
        )
        .unwrap();

        let from_file = resolve_config(&root, None, None).unwrap();
        assert_eq!(from_file.build.profile, BuildProfile::Staging);
        assert_eq!(from_file.build.concurrency, 3);

        let overridden = resolve_config(&root, None, Some(BuildProfile::Production)).unwrap();
        assert_eq!(overridden.build.profile, BuildProfile::Production);

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn missing_explicit_config_file_fails() {
        let missing = std::env::temp_dir().join(format!("sb-cli-{}.toml", uuid::Uuid::now_v7()));
        assert!(resolve_config(Path::new("/"), Some(&missing), None).is_err());
    }

    #[test]
    fn progress_survives_repeated_builds() {
        let progress = CliProgress::new();
        progress.phase("first");
        progress.sample_built("a.html", 1, 1);
        assert!(progress.spinner.lock().unwrap().is_some());
        progress.done(&BuildResult {
            discovered: 1,
            cached: 0,
            drafts: 0,
            built: 1,
            failed: 0,
            artifacts: 3,
            sitemap: SitemapWrite::Written,
            elapsed: std::time::Duration::from_millis(5),
        });
        assert!(progress.spinner.lock().unwrap().is_none());
        progress.phase("second");
        assert!(progress.spinner.lock().unwrap().is_some());
    }
}
