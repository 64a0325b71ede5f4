//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use confdown_client::{ApiClient, ApiCredentials};
use confdown_core::{ExportConfig, ExportSummary, ProgressReporter};
use confdown_shared::{
    AppConfig, api_token, init_config, load_config, resolve_output_dir, validate_connection,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Top-level CLI arguments.
#[derive(Parser)]
#[command(
    name = "confdown",
    version,
    about = "Export Confluence spaces to a tree of Markdown files.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
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

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Export one or more spaces to Markdown.
    Export {
        /// Space keys to export (e.g. ENG OPS).
        #[arg(value_name = "SPACE_KEY", required = true)]
        spaces: Vec<String>,

        /// Output directory (defaults to the configured output_dir).
        #[arg(short, long)]
        out: Option<String>,

        /// Search archived spaces too.
        #[arg(long)]
        include_archived: bool,

        /// Leave comment sections out of the exported documents.
        #[arg(long)]
        skip_comments: bool,
    },

    /// List the spaces visible to the configured credential.
    Spaces,

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
        0 => "confdown=info",
        1 => "confdown=debug",
        _ => "confdown=trace",
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
        Command::Export {
            spaces,
            out,
            include_archived,
            skip_comments,
        } => cmd_export(&spaces, out.as_deref(), include_archived, skip_comments).await,
        Command::Spaces => cmd_spaces().await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_export(
    spaces: &[String],
    out: Option<&str>,
    include_archived: bool,
    skip_comments: bool,
) -> Result<()> {
    let config = load_config()?;
    let api = build_api(&config)?;

    let output_root = match out {
        Some(path) => PathBuf::from(path),
        None => resolve_output_dir(&config.defaults.output_dir)?,
    };

    let export_config = ExportConfig {
        space_keys: spaces.to_vec(),
        output_root,
        include_archived: include_archived || config.defaults.include_archived,
        include_comments: !skip_comments,
    };

    info!(spaces = ?export_config.space_keys, "exporting spaces");

    let reporter = CliProgress::new();
    let summary = confdown_core::export(&api, &export_config, &reporter).await?;

    println!();
    println!("  Export complete!");
    println!("  Pages:    {}", summary.pages_exported);
    if summary.pages_degraded > 0 {
        println!("  Degraded: {} (see error banners)", summary.pages_degraded);
    }
    println!("  Path:     {}", summary.output_root.display());
    println!("  Time:     {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_spaces() -> Result<()> {
    let config = load_config()?;
    let api = build_api(&config)?;

    let spaces = confdown_core::list_spaces(&api).await?;
    if spaces.is_empty() {
        println!("No spaces visible to this credential.");
        return Ok(());
    }

    println!("{:<12} {:<40} {:<10} {}", "KEY", "NAME", "TYPE", "STATUS");
    for space in &spaces {
        println!(
            "{:<12} {:<40} {:<10} {}",
            space.key, space.name, space.kind, space.status
        );
    }
    println!();
    println!("{} spaces", spaces.len());

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

/// Validate the connection settings and build an API client from them.
fn build_api(config: &AppConfig) -> Result<ApiClient> {
    validate_connection(config)?;
    let token = api_token(config)?;

    let api = ApiClient::new(ApiCredentials {
        base_url: config.connection.base_url.clone(),
        username: config.connection.username.clone(),
        api_token: token,
    })?;
    Ok(api)
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Export progress on an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn page_written(&self, title: &str, count: usize) {
        self.spinner.set_message(format!("[{count}] {title}"));
    }

    fn finished(&self, _summary: &ExportSummary) {
        self.spinner.finish_and_clear();
    }
}
