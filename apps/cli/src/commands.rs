//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use confluence_bridge_core::{dispatch, tool_definitions};
use confluence_bridge_core::tools::{GET_PAGE_TOOL, SEARCH_TOOL, UPDATE_PAGE_TOOL};
use confluence_bridge_shared::{
    AppConfig, ConnectionConfig, init_config, load_config, load_config_from,
};
use serde_json::{Map, Value, json};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Search, read and update Confluence pages as JSON.
#[derive(Parser)]
#[command(
    name = "confluence-bridge",
    version,
    about = "Search, read and update Confluence pages as compact JSON.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.confluence-bridge/config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Confluence site root (overrides CONFLUENCE_URL and the config file).
    #[arg(long, global = true)]
    pub url: Option<String>,

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
    /// Search pages with a CQL query.
    Search {
        /// CQL query, e.g. `space = ENG and type = page`.
        cql: String,

        /// Number of results to return.
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Print a page with its tables extracted.
    Get {
        /// Page id.
        page_id: String,
    },

    /// Replace the storage-format body of a page.
    Update {
        /// Page id.
        page_id: String,

        #[command(flatten)]
        content: ContentSource,

        /// New page title (keeps the current title if omitted).
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Invoke any tool by name with a JSON argument object.
    Call {
        /// Tool name (see `tools`).
        tool: String,

        /// Arguments as a JSON object.
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// Print the tool catalog.
    Tools,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Where the new page body comes from.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub(crate) struct ContentSource {
    /// Storage-format markup.
    #[arg(long)]
    content: Option<String>,

    /// File holding storage-format markup.
    #[arg(long)]
    content_file: Option<PathBuf>,
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

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries
/// JSON results only.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "confluence_bridge=warn",
        1 => "confluence_bridge=debug",
        _ => "confluence_bridge=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

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
    let config_path = cli.config.as_deref();
    let url = cli.url.as_deref();

    match cli.command {
        Command::Search { cql, limit } => {
            let mut args = Map::new();
            args.insert("cql".into(), Value::String(cql));
            if let Some(limit) = limit {
                args.insert("limit".into(), json!(limit));
            }
            cmd_call(config_path, url, SEARCH_TOOL, args).await
        }
        Command::Get { page_id } => {
            let args = object(json!({ "pageId": page_id }))?;
            cmd_call(config_path, url, GET_PAGE_TOOL, args).await
        }
        Command::Update {
            page_id,
            content,
            title,
        } => {
            let markup = content.read()?;
            let mut args = object(json!({ "pageId": page_id, "content": markup }))?;
            if let Some(title) = title {
                args.insert("title".into(), Value::String(title));
            }
            cmd_call(config_path, url, UPDATE_PAGE_TOOL, args).await
        }
        Command::Call { tool, args } => {
            let parsed: Value = serde_json::from_str(&args)
                .wrap_err("--args must be valid JSON")?;
            cmd_call(config_path, url, &tool, object(parsed)?).await
        }
        Command::Tools => cmd_tools(),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path, url),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_call(
    config_path: Option<&std::path::Path>,
    url: Option<&str>,
    tool: &str,
    args: Map<String, Value>,
) -> Result<()> {
    let config = read_config(config_path)?;
    let conn = ConnectionConfig::from_env(&config, url)?;
    debug!(?conn, tool, "resolved connection");

    let value = dispatch(&conn, tool, &args).await?;
    print_json(&value)?;

    if is_error_payload(&value) {
        return Err(eyre!("{tool} failed; see the error payload above"));
    }
    Ok(())
}

fn cmd_tools() -> Result<()> {
    print_json(&serde_json::to_value(tool_definitions())?)
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    info!(path = %path.display(), "config initialized");
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&std::path::Path>, url: Option<&str>) -> Result<()> {
    let config = read_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");

    // Credentials are only reported as present or absent.
    match ConnectionConfig::from_env(&config, url) {
        Ok(conn) => {
            println!("# resolved url: {}", conn.base_url);
            println!(
                "# credentials: token={} mail={} key={}",
                conn.personal_token.is_some(),
                conn.api_mail.is_some(),
                conn.api_key.is_some(),
            );
        }
        Err(e) => println!("# {e}"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl ContentSource {
    fn read(self) -> Result<String> {
        match (self.content, self.content_file) {
            (Some(markup), _) => Ok(markup),
            (None, Some(path)) => std::fs::read_to_string(&path)
                .wrap_err_with(|| format!("failed to read {}", path.display())),
            (None, None) => Err(eyre!("one of --content or --content-file is required")),
        }
    }
}

fn read_config(path: Option<&std::path::Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

fn object(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(eyre!("tool arguments must be a JSON object, got {other}")),
    }
}

/// A failure result is exactly `{"error": ...}`.
fn is_error_payload(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.len() == 1 && map.contains_key("error"))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
