//! `simbridge serve` – run the relay until Ctrl-C.

use std::net::{SocketAddr, ToSocketAddrs};

use colored::Colorize;
use simbridge_control::ControlServer;
use simbridge_middleware::{Relay, SimulatorServer};
use tracing::info;

/// Resolve `host:port`, accepting names such as `localhost`.
pub(crate) fn resolve(host: &str, port: u16) -> Result<SocketAddr, String> {
    (host, port)
        .to_socket_addrs()
        .map_err(|e| format!("cannot resolve {host}:{port}: {e}"))?
        .next()
        .ok_or_else(|| format!("{host}:{port} resolved to no address"))
}

pub fn run(host: &str, http_port: u16, simulator_port: u16) -> Result<(), String> {
    let http_addr = resolve(host, http_port)?;
    let sim_addr = resolve(host, simulator_port)?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| format!("failed to start async runtime: {e}"))?;
    rt.block_on(serve(http_addr, sim_addr))
}

async fn serve(http_addr: SocketAddr, sim_addr: SocketAddr) -> Result<(), String> {
    let relay = Relay::new();
    let simulators = SimulatorServer::bind(sim_addr, relay.clone())
        .await
        .map_err(|e| e.to_string())?;
    let control = ControlServer::bind(http_addr, &relay)
        .await
        .map_err(|e| e.to_string())?;

    println!(
        "  {} control API on {}",
        "▶".green().bold(),
        format!("http://{}", control.local_addr().map_err(|e| e.to_string())?).bold()
    );
    println!(
        "  {} simulators connect to {}",
        "▶".green().bold(),
        format!("ws://{}", simulators.local_addr().map_err(|e| e.to_string())?).bold()
    );
    println!("  Press {} to stop.\n", "Ctrl-C".bold());

    tokio::select! {
        res = simulators.run() => res.map_err(|e| e.to_string()),
        res = control.run() => res.map_err(|e| e.to_string()),
        _ = tokio::signal::ctrl_c() => {
            info!(connected = relay.registry().len(), "shutdown requested");
            println!("\n{}", "  Ctrl-C received – stopping bridge.".yellow().bold());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_ip_and_localhost() {
        assert_eq!(resolve("127.0.0.1", 5000).unwrap(), SocketAddr::from(([127, 0, 0, 1], 5000)));
        assert!(resolve("localhost", 8080).unwrap().ip().is_loopback());
    }

    #[test]
    fn unresolvable_host_is_an_error() {
        assert!(resolve("nonexistent.invalid", 1).is_err());
    }
}
