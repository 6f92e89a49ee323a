//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use gardenlink_core::{
    GraphTraversalAssembler, OpenRouterCompletion, ProgressSink, TextCompletion, ToolContext,
    ToolRegistry,
};
use gardenlink_remote::{ProxyFetcher, RemoteFetcher, SearchThrottle};
use gardenlink_shared::{AppConfig, GardenError, init_config, load_config};
use gardenlink_storage::{DocumentStore, GardenStore};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Value, json};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// gardenlink: explore and read your gardens the way the agent does.
#[derive(Parser)]
#[command(
    name = "gardenlink",
    version,
    about = "Run the garden agent tools: wikilink exploration, file access, web reading and search.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Act as if this garden were current (overrides `garden.current`).
    #[arg(short, long, global = true)]
    pub garden: Option<String>,

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
    /// Follow [[wikilinks]] from some content and filter what is found for a goal.
    Explore {
        /// What the gathered knowledge should help with.
        #[arg(long)]
        goal: String,

        /// Seed content containing wikilinks.
        #[arg(conflicts_with = "file", required_unless_present = "file")]
        content: Option<String>,

        /// Read the seed content from a file instead.
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print everything that was gathered and skip relevance filtering.
        #[arg(long)]
        raw: bool,
    },

    /// List files in the current garden, or in all gardens.
    List {
        /// List across all gardens.
        #[arg(long)]
        all: bool,
    },

    /// Read one or more files (`/path` or `Garden#/path`).
    Read {
        #[arg(required = true)]
        files: Vec<String>,
    },

    /// Read a web page through the content proxy.
    #[command(name = "read-url")]
    ReadUrl { url: String },

    /// Search the web through the content proxy.
    Search {
        /// Search query (words are joined with spaces).
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Invoke any tool by name with a JSON argument object.
    Tool {
        /// Tool name, e.g. `listFiles`. Use `tool --list` to see all.
        #[arg(required_unless_present = "list")]
        name: Option<String>,

        /// JSON arguments (defaults to `{}`).
        args: Option<String>,

        /// List the available tools.
        #[arg(long)]
        list: bool,
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

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries tool output.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = [
        "gardenlink",
        "gardenlink_core",
        "gardenlink_storage",
        "gardenlink_remote",
        "gardenlink_shared",
    ]
    .map(|target| format!("{target}={level}"))
    .join(",");

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let garden = cli.garden;
    match cli.command {
        Command::Explore {
            goal,
            content,
            file,
            raw,
        } => cmd_explore(garden, &goal, content, file, raw).await,
        Command::List { all } => {
            let scope = if all { "all" } else { "current" };
            cmd_tool(garden, "listFiles", json!({ "scope": scope })).await
        }
        Command::Read { files } => cmd_tool(garden, "readFile", json!({ "files": files })).await,
        Command::ReadUrl { url } => cmd_tool(garden, "readURL", json!({ "url": url })).await,
        Command::Search { query } => {
            cmd_tool(garden, "webSearch", json!({ "query": query.join(" ") })).await
        }
        Command::Tool { list: true, .. } => cmd_tool_list(garden),
        Command::Tool { name, args, .. } => {
            let name = name.ok_or_else(|| eyre!("a tool name is required"))?;
            let args: Value = match args {
                Some(raw) => serde_json::from_str(&raw)
                    .map_err(|e| eyre!("tool arguments must be a JSON object: {e}"))?,
                None => json!({}),
            };
            cmd_tool(garden, &name, args).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Session wiring
// ---------------------------------------------------------------------------

/// Everything a command needs, built from the loaded config.
struct Session {
    context: ToolContext,
    progress: Arc<CliProgress>,
}

impl Session {
    fn open(garden: Option<String>) -> Result<Self> {
        let config = load_config()?;
        Self::from_config(&config, garden)
    }

    fn from_config(config: &AppConfig, garden: Option<String>) -> Result<Self> {
        let current = garden.unwrap_or_else(|| config.garden.current.clone());
        let store = GardenStore::new(config.garden.root_path()?, current)
            .with_gardens(config.garden.gardens.clone());

        let fetcher = Arc::new(ProxyFetcher::new(config.proxy.effective_url())?);
        let search_fetcher = config
            .proxy
            .configured_url()
            .map(ProxyFetcher::new)
            .transpose()?
            .map(Arc::new);

        let throttle = Arc::new(SearchThrottle::new(Duration::from_millis(
            config.proxy.search_cooldown_ms,
        )));
        let progress = Arc::new(CliProgress::new());

        info!(
            root = %store.root().display(),
            garden = store.current_garden(),
            proxy = config.proxy.effective_url(),
            search_cooldown_ms = throttle.cooldown().as_millis() as u64,
            "session ready"
        );

        let context = ToolContext {
            store: Arc::new(store),
            completion: completion_for(config),
            fetcher: Some(fetcher),
            search_fetcher,
            throttle,
            progress: progress.clone(),
        };

        Ok(Self { context, progress })
    }
}

/// The configured completion client, or one that reports why it is unavailable.
///
/// A missing API key only matters to commands that filter for relevance.
fn completion_for(config: &AppConfig) -> Arc<dyn TextCompletion> {
    match OpenRouterCompletion::from_config(&config.openrouter) {
        Ok(client) => {
            info!(model = client.model(), "completion ready");
            Arc::new(client)
        }
        Err(e) => {
            warn!(error = %e, "completion unavailable");
            Arc::new(UnavailableCompletion {
                reason: e.to_string(),
            })
        }
    }
}

struct UnavailableCompletion {
    reason: String,
}

#[async_trait]
impl TextCompletion for UnavailableCompletion {
    async fn complete(&self, _prompt: &str) -> gardenlink_shared::Result<String> {
        Err(GardenError::Completion(self.reason.clone()))
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
    sources: Mutex<Vec<String>>,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self {
            spinner,
            sources: Mutex::new(Vec::new()),
        }
    }

    /// Clear the spinner and return the remote sources that were used.
    fn finish(&self) -> Vec<String> {
        self.spinner.finish_and_clear();
        self.sources
            .lock()
            .map(|mut sources| std::mem::take(&mut *sources))
            .unwrap_or_default()
    }
}

impl ProgressSink for CliProgress {
    fn notify(&self, message: &str) {
        self.spinner.set_message(message.to_string());
    }

    fn add_source(&self, url: &str) {
        if let Ok(mut sources) = self.sources.lock() {
            if !sources.iter().any(|s| s == url) {
                sources.push(url.to_string());
            }
        }
    }
}

fn print_output(output: &str, sources: &[String]) {
    println!("{output}");
    if !sources.is_empty() {
        println!();
        println!("Sources:");
        for source in sources {
            println!("  - {source}");
        }
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_explore(
    garden: Option<String>,
    goal: &str,
    content: Option<String>,
    file: Option<PathBuf>,
    raw: bool,
) -> Result<()> {
    let initial = match (content, file) {
        (Some(content), _) => content,
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| eyre!("cannot read '{}': {e}", path.display()))?,
        (None, None) => return Err(eyre!("seed content or --file is required")),
    };

    let session = Session::open(garden)?;
    let ctx = &session.context;

    let mut assembler = GraphTraversalAssembler::new(ctx.store.clone(), ctx.completion.clone())
        .with_progress(session.progress.clone());
    if let Some(fetcher) = &ctx.fetcher {
        assembler = assembler.with_fetcher(fetcher.clone() as Arc<dyn RemoteFetcher>);
    }

    info!(goal, raw, "exploring wikilinks");

    let result = if raw {
        Ok(assembler.collect(&initial).await.to_string())
    } else {
        assembler.assemble(goal, &initial).await
    };

    let sources = session.progress.finish();
    print_output(&result?, &sources);
    Ok(())
}

async fn cmd_tool(garden: Option<String>, name: &str, args: Value) -> Result<()> {
    let session = Session::open(garden)?;
    let registry = ToolRegistry::with_standard_tools(&session.context);

    let result = registry.call(name, args).await;
    let sources = session.progress.finish();
    print_output(&result?, &sources);
    Ok(())
}

fn cmd_tool_list(garden: Option<String>) -> Result<()> {
    let session = Session::open(garden)?;
    let registry = ToolRegistry::with_standard_tools(&session.context);
    session.progress.finish();

    for (name, description) in registry.describe() {
        println!("{name}");
        println!("    {description}");
    }
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
