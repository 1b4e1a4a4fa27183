//! manual-mcp: MCP server exposing a markdown article corpus.
//!
//! Serves the corpus over stdio (newline-delimited JSON-RPC) by default,
//! or over session-multiplexed streamable HTTP with `--http`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use manual_mcp::config;
use manual_mcp::corpus::{DocumentStore, MarkdownSource};
use manual_mcp::mcp::http::{self, HttpState};
use manual_mcp::mcp::transport::StdioServer;

/// MCP server exposing a markdown article corpus.
///
/// Lists, fetches, and searches articles parsed from a content directory of
/// markdown files with YAML front-matter.
#[derive(Parser, Debug)]
#[command(name = "manual-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Serve over streamable HTTP instead of stdio
    #[arg(long)]
    http: bool,

    /// Override the HTTP listen port
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Determines the log level from CLI arguments.
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "error" => Level::ERROR,
            _ => Level::WARN,
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
///
/// Logs go to stderr: on the stdio transport, stdout carries protocol
/// messages only.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point for the manual-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    let config_path = args.config.as_deref();
    let mut cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(port) = args.port {
        cfg.http.port = port;
    }

    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    let content_base = cfg.content_base();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        content = %content_base.display(),
        "Starting manual-mcp server"
    );

    let source = MarkdownSource::new(content_base);
    let store = Arc::new(DocumentStore::new(Box::new(source)));

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    // Eager initial load. Failure is logged, not fatal: the corpus retries
    // lazily on the first request.
    match store.load() {
        Ok(count) => info!(count, "Initial corpus load complete"),
        Err(e) => warn!(error = %e, "Initial corpus load failed, server stays up"),
    }

    let result = if args.http {
        let addr = format!("{}:{}", cfg.http.bind, cfg.http.port);
        let state = HttpState::new(store);
        runtime.block_on(http::serve(state, &addr))
    } else {
        let mut server = StdioServer::new(store);
        info!("MCP server ready, waiting for client connection...");
        runtime.block_on(server.run())
    };

    match result {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn log_level_from_flags() {
        assert_eq!(get_log_level(0, true, "debug"), Level::ERROR);
        assert_eq!(get_log_level(0, false, "debug"), Level::DEBUG);
        assert_eq!(get_log_level(0, false, "bogus"), Level::WARN);
        assert_eq!(get_log_level(1, false, "warn"), Level::INFO);
        assert_eq!(get_log_level(3, false, "warn"), Level::TRACE);
    }
}
