use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;

use anyhow::{Context, Result};
use opfs_explorer_bridge::Dispatcher;
use opfs_explorer_host::config::Config;
use opfs_explorer_host::server;
use opfs_explorer_vfs::LocalStore;
use tokio::signal;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn check_port_available(bind: &str, port: u16) -> bool {
    StdTcpListener::bind(format!("{bind}:{port}")).is_ok()
}

/// Find an available port starting from the configured one.
fn find_available_port(bind: &str, start: u16) -> Option<u16> {
    (start..start.saturating_add(10)).find(|&port| check_port_available(bind, port))
}

fn print_usage() {
    println!("opfs-explorer-host - WebSocket host for the opfs-explorer bridge");
    println!();
    println!("USAGE:");
    println!("    opfs-explorer-host [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -v, --version    Print version");
    println!("    -h, --help       Print this help");
    println!();
    println!("CONFIG:");
    println!(
        "    {}",
        Config::default_config_path().display()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--version" | "-v" => {
                println!("opfs-explorer-host {VERSION}");
                return Ok(());
            }
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => {
                eprintln!("unknown option: {other}");
                print_usage();
                std::process::exit(2);
            }
        }
    }

    let config = Config::load();
    let sandbox = config.sandbox_dir();
    tracing::info!(sandbox = %sandbox.display(), "serving sandbox directory");

    let store = LocalStore::new(&sandbox);
    let dispatcher = Dispatcher::new(Arc::new(store));

    let bind = &config.server.bind;
    let port = find_available_port(bind, config.server.port)
        .context("no available port in configured range")?;
    if port != config.server.port {
        tracing::warn!(
            configured = config.server.port,
            actual = port,
            "configured port busy, using fallback"
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("failed to bind {bind}:{port}"))?;
    tracing::info!(%bind, port, "bridge host listening (ws://{bind}:{port})");

    tokio::select! {
        result = server::run(listener, dispatcher) => result,
        _ = signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    }
}
