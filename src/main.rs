//! monitor-bridge - run one keyword against an emulator monitor
//!
//! Loads the bridge configuration, connects to the monitor console, runs a
//! single keyword and prints the remote-keyword result as JSON.

use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use monitor_bridge::config::loader::CONFIG_ENV_VAR;
use monitor_bridge::{Config, ConfigLoader, KeywordGateway, TcpConnector};

/// Command line arguments
#[derive(Debug, Default)]
struct AppArgs {
    /// Configuration file path
    config_path: Option<PathBuf>,
    /// Enable debug logging
    debug: bool,
    /// Monitor host override
    host: Option<String>,
    /// Monitor port override
    port: Option<u16>,
    /// Response timeout override in milliseconds
    timeout_ms: Option<u64>,
    /// Print discovery answers instead of running a keyword
    list: bool,
    /// Keyword to run
    keyword: Option<String>,
    /// Keyword arguments, passed as strings
    args: Vec<String>,
}

impl AppArgs {
    /// Parse command line arguments
    fn parse() -> anyhow::Result<Self> {
        let args: Vec<String> = env::args().collect();
        let mut app_args = AppArgs::default();

        let mut i = 1;
        while i < args.len() {
            // Everything after the keyword belongs to the keyword
            if app_args.keyword.is_some() {
                app_args.args.push(args[i].clone());
                i += 1;
                continue;
            }

            match args[i].as_str() {
                "--config" | "-c" => {
                    app_args.config_path = Some(PathBuf::from(option_value(&args, i)?));
                    i += 1;
                }
                "--host" => {
                    app_args.host = Some(option_value(&args, i)?.to_string());
                    i += 1;
                }
                "--port" => {
                    let value = option_value(&args, i)?;
                    app_args.port = Some(
                        value
                            .parse()
                            .with_context(|| format!("Invalid port: {}", value))?,
                    );
                    i += 1;
                }
                "--timeout" => {
                    let value = option_value(&args, i)?;
                    app_args.timeout_ms = Some(
                        value
                            .parse()
                            .with_context(|| format!("Invalid timeout: {}", value))?,
                    );
                    i += 1;
                }
                "--debug" | "-d" => {
                    app_args.debug = true;
                }
                "--list" => {
                    app_args.list = true;
                }
                "--help" | "-h" => {
                    print_help();
                    process::exit(0);
                }
                "--version" | "-V" => {
                    println!("monitor-bridge v{}", monitor_bridge::VERSION);
                    process::exit(0);
                }
                "--" => {
                    if let Some(keyword) = args.get(i + 1) {
                        app_args.keyword = Some(keyword.clone());
                        i += 1;
                    }
                }
                arg if arg.starts_with('-') => {
                    bail!("Unknown option: {}", arg);
                }
                keyword => {
                    app_args.keyword = Some(keyword.to_string());
                }
            }
            i += 1;
        }

        if app_args.keyword.is_none() && !app_args.list {
            bail!("Missing keyword");
        }

        Ok(app_args)
    }
}

fn option_value(args: &[String], i: usize) -> anyhow::Result<&str> {
    match args.get(i + 1) {
        Some(value) => Ok(value),
        None => bail!("Missing value for {}", args[i]),
    }
}

/// Print help information
fn print_help() {
    println!("monitor-bridge - run remote keywords against an emulator monitor console");
    println!();
    println!("USAGE:");
    println!("    monitor-bridge [OPTIONS] <KEYWORD> [ARGS...]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <PATH>    Path to configuration file");
    println!("        --host <HOST>      Monitor host");
    println!("        --port <PORT>      Monitor port");
    println!("        --timeout <MS>     Response timeout in milliseconds");
    println!("    -d, --debug            Enable debug logging");
    println!("        --list             Print keyword discovery information");
    println!("    -h, --help             Print this help message");
    println!("    -V, --version          Print version information");
    println!();
    println!("CONFIGURATION:");
    println!("    Configuration files are searched in the following order:");
    println!("    1. Path specified with --config");
    println!("    2. ${}", CONFIG_ENV_VAR);
    println!("    3. <config dir>/monitor-bridge/config.toml (or .json)");
    println!("    4. ~/.monitor-bridge/config.toml (or .json)");
    println!("    5. ./monitor-bridge.toml (or .json)");
    println!("    6. Built-in defaults");
    println!();
    println!("ENVIRONMENT:");
    println!("    RUST_LOG               Set logging level (error, warn, info, debug, trace)");
}

/// Load configuration from file or search paths, then apply overrides
fn load_configuration(args: &AppArgs) -> anyhow::Result<Config> {
    let mut config = match &args.config_path {
        Some(path) => {
            debug!("Loading config from: {}", path.display());
            Config::load_from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?
        }
        None => match ConfigLoader::load() {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load configuration: {}. Using defaults", e);
                Config::default()
            }
        },
    };

    if let Some(host) = &args.host {
        config.monitor.host = host.clone();
    }
    if let Some(port) = args.port {
        config.monitor.port = port;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.monitor.response_timeout_ms = timeout_ms;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Logging goes to stderr so stdout carries only the JSON result
fn init_logging(args: &AppArgs, config: &Config) {
    let level = if args.debug {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };

    let env_filter = env::var("RUST_LOG").unwrap_or(level);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_writer(std::io::stderr)
        .with_ansi(config.logging.ansi)
        .with_target(false)
        .compact()
        .init();
}

fn print_discovery(gateway: &KeywordGateway) -> anyhow::Result<()> {
    let discovery = serde_json::json!({
        "keywords": gateway.list_available(),
        "arguments": gateway.keyword_arguments(""),
        "documentation": gateway.keyword_documentation("__intro__"),
    });
    println!("{}", serde_json::to_string_pretty(&discovery)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = AppArgs::parse().unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        print_help();
        process::exit(2);
    });

    // Config is needed before logging is up; loading warnings before that are dropped
    let config = load_configuration(&args)?;
    init_logging(&args, &config);
    debug!("Arguments: {:?}", args);

    let gateway = KeywordGateway::from_config(&config, TcpConnector)?;

    if args.list {
        return print_discovery(&gateway);
    }

    let Some(keyword) = args.keyword.as_deref() else {
        bail!("Missing keyword");
    };
    let keyword_args: Vec<Value> = args.args.iter().cloned().map(Value::String).collect();

    info!("Running '{}' on {}", keyword, config.monitor.endpoint());
    let result = gateway.run_keyword(keyword, &keyword_args).await;
    gateway.shutdown().await;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.is_pass() {
        if let Some(message) = &result.error {
            error!("Keyword '{}' failed: {}", keyword, message);
        }
        process::exit(1);
    }

    Ok(())
}
