//! CLI binary for clipmark.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ProcessConfig`, wires the filesystem vault and HTTP fetcher in, and
//! prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clipmark::{
    FsVault, HttpArticleFetcher, MergeMode, Notifier, ProcessConfig, Processor, RuleSet,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Terminal notifier ────────────────────────────────────────────────────

/// Routes library notifications to stderr, printing through the active
/// progress bar when one is running so messages don't tear the bar.
struct CliNotifier {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl CliNotifier {
    fn new(quiet: bool) -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
            quiet,
        })
    }

    fn attach_bar(&self, bar: ProgressBar) {
        *self.bar.lock().unwrap() = Some(bar);
    }

    fn detach_bar(&self) {
        if let Some(bar) = self.bar.lock().unwrap().take() {
            bar.finish_and_clear();
        }
    }
}

impl Notifier for CliNotifier {
    fn notify(&self, message: &str) {
        if self.quiet {
            return;
        }
        let line = format!("{} {}", cyan("◆"), message);
        match self.bar.lock().unwrap().as_ref() {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

fn spinner(prefix: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix(prefix.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

// ── CLI definition ───────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Append the linked article to one note
  clipmark --vault ~/notes note "Articles/rust async.md"

  # Clip every note under a folder, skipping already-processed ones
  clipmark --vault ~/notes folder Articles

  # Create sibling article notes instead of appending
  clipmark --vault ~/notes --mode create-note folder Articles

  # Use a rewrite rule file and a custom proxy probe timeout
  clipmark --vault ~/notes --rules rules.toml --proxy-timeout-ms 1500 folder Articles

  # Dispatch a list of URLs to the fetcher, one per line
  clipmark --vault ~/notes urls inbox/reading-list.md

RULE FILE FORMAT (TOML):
  [[rules]]
  id             = "nitter"
  name           = "Route twitter links through a nitter proxy"
  matchers       = ["twitter.com", "x.com"]
  transformation = "prefix"
  template       = "https://nitter.example/proxy?url={url}"
  priority       = 10

  [[rules]]
  id             = "youtube-short"
  name           = "Expand youtu.be short links"
  matchers       = ["youtu.be"]
  transformation = "path-extraction"
  template       = "https://www.youtube.com/watch?v={id}"
  priority       = 5

ENVIRONMENT VARIABLES:
  CLIPMARK_VAULT   Vault root directory (same as --vault)
  CLIPMARK_RULES   Rewrite rule file (same as --rules)
"#;

/// Clip linked web articles into a markdown note vault.
#[derive(Parser, Debug)]
#[command(
    name = "clipmark",
    version,
    about = "Clip linked web articles into a markdown note vault",
    long_about = "Extracts the URL referenced by each markdown note (frontmatter fields first, \
inline links second), rewrites it through configurable rules with a health-checked proxy \
layer, fetches a rendered article, and merges the result back into the vault. Batch runs \
are idempotent via an article_processed frontmatter marker.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Vault root directory.
    #[arg(long, env = "CLIPMARK_VAULT")]
    vault: PathBuf,

    /// TOML file with [[rules]] rewrite rules.
    #[arg(long, env = "CLIPMARK_RULES")]
    rules: Option<PathBuf>,

    /// Where rendered articles go: append to the source note or create a
    /// sibling note.
    #[arg(long, value_enum, default_value = "append")]
    mode: MergeModeArg,

    /// Proxy health cache TTL in minutes.
    #[arg(long, default_value_t = 10)]
    proxy_ttl_minutes: u64,

    /// Proxy health probe timeout in milliseconds.
    #[arg(long, default_value_t = 3000)]
    proxy_timeout_ms: u64,

    /// Article fetch timeout in seconds.
    #[arg(long, default_value_t = 30)]
    fetch_timeout: u64,

    /// Output structured JSON instead of human-readable text.
    #[arg(long)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a single note.
    Note {
        /// Vault-relative note path, e.g. "Articles/monday.md".
        path: String,

        /// Also stamp the note with the article_processed marker.
        #[arg(long)]
        track: bool,
    },

    /// Process every note under a folder prefix, skipping notes already
    /// marked as processed.
    Folder {
        /// Vault-relative folder prefix, e.g. "Articles".
        prefix: String,

        /// Do not read or write the article_processed marker.
        #[arg(long)]
        no_track: bool,
    },

    /// Dispatch a note of newline-separated URLs to the fetcher.
    Urls {
        /// Vault-relative path of the URL list note.
        path: String,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum MergeModeArg {
    Append,
    CreateNote,
}

impl From<MergeModeArg> for MergeMode {
    fn from(v: MergeModeArg) -> Self {
        match v {
            MergeModeArg::Append => MergeMode::Append,
            MergeModeArg::CreateNote => MergeMode::CreateNote,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    // ── Build config and processor ───────────────────────────────────────
    let rules = match cli.rules {
        Some(ref path) => load_rules(path)?,
        None => Vec::new(),
    };

    let config = ProcessConfig::builder()
        .rules(rules)
        .proxy_health_cache_ttl_minutes(cli.proxy_ttl_minutes)
        .proxy_health_timeout_ms(cli.proxy_timeout_ms)
        .build()
        .context("Invalid configuration")?;

    let vault = Arc::new(FsVault::new(&cli.vault));
    let fetcher = Arc::new(HttpArticleFetcher::new().with_timeout_secs(cli.fetch_timeout));
    let notifier = CliNotifier::new(cli.quiet || cli.json);

    let mut processor = Processor::new(vault, fetcher, config)
        .with_notifier(Arc::clone(&notifier) as Arc<dyn Notifier>);

    let mode: MergeMode = cli.mode.into();

    // ── Run the command ──────────────────────────────────────────────────
    match cli.command {
        Command::Note { path, track } => {
            let outcome = processor.process_note(&path, mode, track).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
            if outcome.is_failed() {
                std::process::exit(1);
            }
        }

        Command::Folder { prefix, no_track } => {
            if !cli.quiet && !cli.json {
                notifier.attach_bar(spinner("Clipping"));
            }
            let summary = processor
                .process_folder(&prefix, mode, !no_track)
                .await
                .with_context(|| format!("Failed to process folder '{prefix}'"))?;
            notifier.detach_bar();

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else if !cli.quiet {
                let tick = if summary.failed == 0 {
                    green("✔")
                } else {
                    red("✘")
                };
                eprintln!(
                    "{tick}  {} processed  {} skipped  {} failed  {}",
                    bold(&summary.processed.to_string()),
                    summary.skipped,
                    summary.failed,
                    dim(&format!("({} notes total)", summary.total())),
                );
            }
            if summary.failed > 0 && summary.processed == 0 && summary.total() > 0 {
                std::process::exit(1);
            }
        }

        Command::Urls { path } => {
            let dispatched = processor
                .process_url_batch(&path)
                .await
                .with_context(|| format!("Failed to read URL list '{path}'"))?;
            if cli.json {
                println!("{}", serde_json::json!({ "dispatched": dispatched }));
            }
        }
    }

    Ok(())
}

/// Load and validate a TOML rule file.
fn load_rules(path: &Path) -> Result<Vec<clipmark::TransformationRule>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rule file {}", path.display()))?;
    let set: RuleSet = toml::from_str(&text)
        .with_context(|| format!("Failed to parse rule file {}", path.display()))?;
    Ok(set.rules)
}
