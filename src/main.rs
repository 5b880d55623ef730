//! Prometheus Gateway
//!
//! ```text
//! ┌────────┐   ┌──────────┐   ┌─────────────┐   ┌──────────┐
//! │ Caller │──▶│ Identity │──▶│ Entitlement │──▶│ Upstream │
//! └────────┘   └──────────┘   └─────────────┘   └──────────┘
//! ```
//!
//! Usage: `prometheus_gateway [--env dev] [--port 8080]`

use anyhow::Context;

use prometheus_gateway::config::AppConfig;
use prometheus_gateway::gateway::{build_gateway, run_server};
use prometheus_gateway::logging::init_logging;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut config = AppConfig::load(&env).with_context(|| format!("loading {} config", env))?;
    if let Some(port) = get_port_override() {
        config.gateway.port = port;
    }

    let _log_guard = init_logging(&config);
    tracing::info!("Starting Prometheus Gateway in {} mode", env);

    // Misconfiguration is fatal: refuse to bind rather than serve partially
    let gateway = match build_gateway(&config) {
        Ok(gateway) => gateway,
        Err(e) => {
            tracing::error!("FATAL: {}", e);
            return Err(e).context("gateway refused to start");
        }
    };

    run_server(&config, gateway)
        .await
        .with_context(|| format!("serving on {}", config.bind_addr()))?;

    tracing::info!("Gateway stopped");
    Ok(())
}
