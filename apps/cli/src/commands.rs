//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tenderscout_core::{CrawlReport, ProgressReporter, run_crawl};
use tenderscout_shared::{
    AppConfig, PageEngine, RunConfig, init_config, load_config, load_config_from, render_config,
};
use tracing::info;
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// TenderScout: collect recent tender documents from procurement portals.
#[derive(Parser)]
#[command(
    name = "tenderscout",
    version,
    about = "Crawl a procurement listing page and download recent tender documents.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Page engine selectable on the command line.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum EngineArg {
    /// Headless Chromium; runs the portal's scripts.
    Chromium,
    /// Plain HTTP fetch of the served HTML.
    Http,
}

impl From<EngineArg> for PageEngine {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Chromium => PageEngine::Chromium,
            EngineArg::Http => PageEngine::Http,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Crawl a listing page and download relevant documents.
    Run(RunArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `tenderscout run`. Anything left unset comes from the config file.
#[derive(Args, Debug)]
pub(crate) struct RunArgs {
    /// Listing page to crawl.
    pub url: String,

    /// Directory downloaded documents are written to.
    #[arg(short, long)]
    pub download_dir: Option<PathBuf>,

    /// Path of the JSON manifest.
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Maximum number of accepted candidates.
    #[arg(long)]
    pub max_candidates: Option<usize>,

    /// Recency window in calendar months.
    #[arg(long)]
    pub recency_months: Option<u32>,

    /// Relevance keyword; repeat to replace the configured vocabulary.
    #[arg(short, long = "keyword")]
    pub keywords: Vec<String>,

    /// Run the browser with a visible window.
    #[arg(long)]
    pub headed: bool,

    /// Page engine; defaults to the configured one (chromium).
    #[arg(long, value_enum)]
    pub engine: Option<EngineArg>,

    /// Read configuration from this file instead of ~/.tenderscout/tenderscout.toml.
    #[arg(long, env = "TENDERSCOUT_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show {
        /// Read configuration from this file instead of ~/.tenderscout/tenderscout.toml.
        #[arg(long, env = "TENDERSCOUT_CONFIG")]
        config: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "tenderscout=info",
        1 => "tenderscout=debug",
        _ => "tenderscout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => cmd_run(args).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show { config } => cmd_config_show(config.as_deref()).await,
        },
    }
}

async fn cmd_run(args: RunArgs) -> Result<()> {
    let app = resolve_app_config(args.config.as_deref())?;
    let config = build_run_config(&app, &args)?;
    config.validate()?;

    info!(
        url = %config.start_url,
        download_dir = %config.download_dir.display(),
        max_candidates = config.max_candidates,
        "starting run"
    );

    let reporter = CliProgress::new();
    let result = run_crawl(&config, &reporter).await;
    reporter.spinner.finish_and_clear();
    let report = result?;

    println!("{}", summary_line(&report));
    if report.stats.aborted {
        println!(
            "  Stopped early: listing page was lost ({} candidate(s) skipped)",
            report.stats.skipped_after_abort
        );
    }
    Ok(())
}

/// Merge CLI flags over the loaded configuration. Flags win.
fn build_run_config(app: &AppConfig, args: &RunArgs) -> Result<RunConfig> {
    let start_url =
        Url::parse(&args.url).map_err(|e| eyre!("invalid URL '{}': {e}", args.url))?;

    let mut config = RunConfig::from_app(app, start_url);
    if let Some(dir) = &args.download_dir {
        config.download_dir = dir.clone();
    }
    if let Some(manifest) = &args.manifest {
        config.manifest_path = manifest.clone();
    }
    if let Some(max) = args.max_candidates {
        config.max_candidates = max;
    }
    if let Some(months) = args.recency_months {
        config.recency_months = months;
    }
    if !args.keywords.is_empty() {
        config.keywords = args.keywords.clone();
    }
    if args.headed {
        config.headless = false;
    }
    if let Some(engine) = args.engine {
        config.engine = engine.into();
    }
    Ok(config)
}

/// Load the config file named by `--config`/`TENDERSCOUT_CONFIG`, or the default one.
fn resolve_app_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

fn summary_line(report: &CrawlReport) -> String {
    format!(
        "{} document(s) saved, manifest at {}",
        report.entries.len(),
        report.manifest_path.display()
    )
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn candidate_accepted(&self, title: &str, current: usize, max: usize) {
        self.spinner
            .set_message(format!("Candidate [{current}/{max}] {title}"));
    }

    fn document_saved(&self, path: &Path, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Saved [{current}/{total}] {}", path.display()));
    }

    fn done(&self, _report: &CrawlReport) {
        self.spinner.finish_and_clear();
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_app_config(path)?;
    println!("{}", render_config(&config)?);
    Ok(())
}
