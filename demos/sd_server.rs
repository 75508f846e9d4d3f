//! Announce one service instance until Ctrl-C.
//!
//! Usage: `sd_server [config.json]` (default `demos/sd_server.json`).

use someip_sd_server::logging::{self, LogFacade, LogLevel, SdLogger};
use someip_sd_server::runtime::{self, config::ServerConfig};
use someip_sd_server::transport::UdpTransport;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::process::ExitCode;
use tokio::sync::mpsc;

const DEFAULT_CONFIG: &str = "demos/sd_server.json";

fn main() -> ExitCode {
    logging::init();
    let logger = LogFacade::new();

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = match ServerConfig::load(&path) {
        Ok(config) => config,
        Err(e) => {
            logger.log(LogLevel::Error, "Main", &format!("Failed to load {}: {}", path, e));
            return ExitCode::FAILURE;
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            logger.log(LogLevel::Error, "Main", &format!("Failed to build runtime: {}", e));
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(config, logger.clone())) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger.log(LogLevel::Error, "Main", &format!("{}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServerConfig, logger: Arc<LogFacade>) -> someip_sd_server::Result<()> {
    logger.log(LogLevel::Info, "Main", "=== SOME/IP-SD Server Demo ===");

    let bind = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, config.sd.port));
    let transport = UdpTransport::new_multicast(bind)?;
    if let Some(interface) = config.sd.interface {
        transport.set_multicast_if_v4(&interface)?;
    }
    transport.set_multicast_loop_v4(true)?;

    // Without a handler the STOP-OFFER could never go out, so refuse to announce
    let (stop_tx, mut stop_rx) = mpsc::unbounded_channel();
    install_shutdown_handler(logger.clone(), stop_tx)?;

    let server = runtime::spawn(&config, transport, logger.clone())?;
    server.start().await?;
    logger.log(LogLevel::Info, "Main", "Announcing. Press Ctrl-C to stop.");

    stop_rx.recv().await;
    server.shutdown().await
}

fn install_shutdown_handler(logger: Arc<LogFacade>, stop: mpsc::UnboundedSender<()>) -> io::Result<()> {
    ctrlc::set_handler(move || {
        logger.log(LogLevel::Info, "Main", "Shutting down...");
        let _ = stop.send(());
    })
    .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("cannot install Ctrl-C handler: {}", e)))
}
