//! cellwire CLI Client
//!
//! Calls a function on a function server from the command line.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cellwire::{ClientConfig, Diagnostics, ErrorCode, ProtocolClient, Value};
use clap::Parser;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, EnvFilter};

/// cellwire CLI
#[derive(Parser, Debug)]
#[command(name = "cellwire-cli")]
#[command(about = "Call a spreadsheet function on a remote function server")]
#[command(version)]
struct Args {
    /// TOML settings file (host, port, timeout_secs, log_level, max_args,
    /// log_file, log_overwrite)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host, overrides the settings file
    #[arg(long)]
    host: Option<String>,

    /// Server port, overrides the settings file
    #[arg(short, long)]
    port: Option<u16>,

    /// Receive timeout in seconds, overrides the settings file
    #[arg(short, long)]
    timeout_secs: Option<u64>,

    /// Log file, overrides the settings file (appends unless
    /// `log_overwrite` is set there)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Function name
    name: String,

    /// Arguments: numbers, true/false, error literals like #N/A,
    /// "" for a missing argument, anything else is text
    args: Vec<String>,
}

fn main() {
    let args = Args::parse();

    let mut config = match args.config {
        Some(ref path) => match ClientConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(2);
            }
        },
        None => ClientConfig::default(),
    };
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(path) = args.log_file {
        config.log_file = Some(path);
    }
    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        std::process::exit(2);
    }

    // Initialize tracing/logging once the destination is known
    let writer = match config.open_log_file() {
        Ok(Some(file)) => BoxMakeWriter::new(Arc::new(file)),
        Ok(None) => BoxMakeWriter::new(std::io::stderr),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,cellwire=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(config.log_file.is_none())
        .with_writer(writer)
        .init();

    tracing::debug!("cellwire-cli v{} -> {}", cellwire::VERSION, config.endpoint());

    let values: Vec<Value> = args.args.iter().map(|a| parse_arg(a)).collect();

    let mut client = ProtocolClient::new(config);
    match client.call(&args.name, &values) {
        Ok(value) => {
            if let Some(peer) = client.transport().peer_addr() {
                tracing::debug!("{} answered by {}", args.name, peer);
            }
            println!("{}", value)
        }
        Err(e) => {
            let detail = client
                .diagnostics()
                .last_error()
                .unwrap_or_else(|| e.to_string());
            eprintln!("{}", detail);
            std::process::exit(1);
        }
    }
}

/// Translate a command-line word into a cell value
///
/// Only words containing a digit are numbers, so `inf` or `nan` stay text.
fn parse_arg(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Missing;
    }
    if raw.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(n) = raw.parse::<f64>() {
            return Value::Number(n);
        }
    }
    match raw.to_ascii_lowercase().as_str() {
        "true" => return Value::Boolean(true),
        "false" => return Value::Boolean(false),
        _ => {}
    }
    if raw.starts_with('#') {
        if let Ok(code) = raw.parse::<ErrorCode>() {
            return Value::Error(code);
        }
    }
    Value::text(raw)
}
