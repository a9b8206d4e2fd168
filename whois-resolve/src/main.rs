//! WHOIS Resolve CLI Application
//!
//! A command-line interface for querying WHOIS servers, following registry
//! referrals and reading the replies as structured properties.
//! This CLI application provides a user-friendly interface to the whois-resolve-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use whois_resolve_lib::{
    load_env_config, parse_timeout_string, ClientConfig, ConfigManager, FileConfig,
};
use whois_resolve_lib::{Answer, ClientSettings, ServerRegistry, WhoisClient, WhoisError};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for whois-resolve
#[derive(Parser, Debug)]
#[command(name = "whois-resolve")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Sai Dutt G.V <gvs46@protonmail.com>")]
#[command(about = "Query WHOIS servers and follow registry referrals")]
#[command(
    long_about = "Query the authoritative WHOIS server for a domain name.\n\nThin registries are followed to the registrar's server, and known reply formats can be printed as structured properties."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Domain names to look up
    #[arg(value_name = "QUERY", required = true, help_heading = "Query")]
    pub queries: Vec<String>,

    /// Overall timeout per query: "10", "10s", "2m" or "none"
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Connection")]
    pub timeout: Option<String>,

    /// Local address outgoing connections originate from
    #[arg(long = "bind-host", value_name = "ADDR", help_heading = "Connection")]
    pub bind_host: Option<String>,

    /// Local port outgoing connections originate from
    #[arg(long = "bind-port", value_name = "PORT", help_heading = "Connection")]
    pub bind_port: Option<u16>,

    /// TOML file with extra server definitions, consulted first
    #[arg(long = "servers", value_name = "FILE", help_heading = "Configuration")]
    pub servers: Option<String>,

    /// Use a specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Print the extracted properties instead of the raw reply
    #[arg(short = 'p', long = "properties", help_heading = "Output Format")]
    pub properties: bool,

    /// Output answers and their properties in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Log resolution, referrals and retries to stderr
    #[arg(short = 'v', long = "verbose", help_heading = "Output Format")]
    pub verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(args.verbose);

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        ui::print_error(&e);
        process::exit(1);
    }

    let client = match build_client(&args) {
        Ok(client) => client,
        Err(e) => {
            ui::print_error(&e.to_string());
            process::exit(1);
        }
    };

    if !run_queries(&client, &args).await {
        process::exit(1);
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "whois_resolve_lib=debug,whois_resolve=debug"
    } else {
        "warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if args.queries.iter().any(|q| q.trim().is_empty()) {
        return Err("Queries cannot be empty".to_string());
    }

    if let Some(timeout) = &args.timeout {
        parse_timeout_string(timeout).map_err(|e| e.to_string())?;
    }

    Ok(())
}

/// Run every query in order, printing each answer as it arrives.
///
/// Returns `false` if any query failed.
async fn run_queries(client: &WhoisClient, args: &Args) -> bool {
    let mut all_ok = true;
    let mut documents = Vec::new();

    for query in &args.queries {
        match client.query(query).await {
            Ok(answer) => {
                if args.json {
                    documents.push(ui::answer_json(query, &answer));
                } else {
                    display_answer(query, &answer, args);
                }
            }
            Err(e) => {
                all_ok = false;
                if args.json {
                    documents.push(ui::error_json(query, &e));
                } else {
                    ui::print_query_error(query, &e);
                }
            }
        }
    }

    if args.json {
        let output = match documents.len() {
            1 => documents.remove(0),
            _ => serde_json::Value::Array(documents),
        };
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                ui::print_error(&format!("Failed to encode JSON: {}", e));
                return false;
            }
        }
    }

    all_ok
}

fn display_answer(query: &str, answer: &Answer, args: &Args) {
    if args.properties {
        ui::print_properties(query, answer);
    } else {
        if args.queries.len() > 1 {
            ui::print_query_header(query, answer);
        }
        print!("{}", answer);
        if !answer.content().ends_with('\n') {
            println!();
        }
    }
}

/// Build the client from config files, environment and CLI arguments.
///
/// Precedence from lowest to highest: built-in defaults, config file,
/// `WHOIS_*` environment variables, command line flags.
fn build_client(args: &Args) -> Result<WhoisClient, WhoisError> {
    let file_config = load_file_config(args)?;

    let settings = build_settings(args, &file_config, &load_env_config())?;
    let registry = build_registry(args, &file_config)?;
    debug!(servers = registry.len(), ?settings, "Client configured");

    Ok(WhoisClient::with_settings(settings).with_registry(registry))
}

/// Load the explicit config file, or whatever discovery finds.
fn load_file_config(args: &Args) -> Result<FileConfig, WhoisError> {
    let config_manager = ConfigManager::new(args.verbose);

    match &args.config {
        Some(path) => {
            debug!(path = %path, "Using explicit config file");
            config_manager.load_file(path)
        }
        None => config_manager.discover_and_load(),
    }
}

/// Layer file, environment and CLI client values over the defaults.
fn build_settings(
    args: &Args,
    file_config: &FileConfig,
    env_config: &ClientConfig,
) -> Result<ClientSettings, WhoisError> {
    let mut settings = ClientSettings::default();

    if let Some(client) = &file_config.client {
        settings = client.apply(settings)?;
    }
    settings = env_config.apply(settings)?;
    settings = cli_client_config(args).apply(settings)?;

    Ok(settings)
}

/// The client values given on the command line.
fn cli_client_config(args: &Args) -> ClientConfig {
    ClientConfig {
        timeout: args.timeout.clone(),
        bind_host: args.bind_host.clone(),
        bind_port: args.bind_port,
    }
}

/// Built-in table, overridden by config file servers, overridden by `--servers`.
fn build_registry(args: &Args, file_config: &FileConfig) -> Result<ServerRegistry, WhoisError> {
    let mut registry = ServerRegistry::builtin().clone();

    if !file_config.servers.is_empty() {
        registry = registry.with_overrides(file_config.server_overrides());
    }

    if let Some(path) = &args.servers {
        debug!(path = %path, "Loading extra server definitions");
        registry = registry.with_overrides(ServerRegistry::load_file(path)?);
    }

    Ok(registry)
}
