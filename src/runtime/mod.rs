//! # SD Server Runtime
//!
//! Runs an [`SdServer`] on a tokio task, with real timers and a real transport.
//!
//! ## Key Types
//!
//! - [`spawn`] - start the server task
//! - [`SdServerHandle`] - cloneable async control surface
//! - [`TokioTimer`] - timer facility backed by tokio tasks
//! - [`config::ServerConfig`] - JSON configuration
//!
//! ## Serialization
//!
//! The task exclusively owns the state machine. Commands from handles and timer
//! expirations arrive over channels and run one at a time, each to completion; the
//! message buffer is flushed to the transport after every event, oldest first.
//!
//! ```text
//! SdServerHandle ──Command──▶ ┌─────────────┐ ──datagrams──▶ SomeIpTransport
//! TokioTimer ────TimerHandle─▶│ server task │
//!                             └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use someip_sd_server::runtime::{self, config::ServerConfig};
//! use someip_sd_server::logging::LogFacade;
//! use someip_sd_server::transport::UdpTransport;
//!
//! # async fn run() -> someip_sd_server::Result<()> {
//! let config = ServerConfig::load("sd_server.json")?;
//! let transport = UdpTransport::new("0.0.0.0:0".parse().unwrap())?;
//! let server = runtime::spawn(&config, transport, LogFacade::new())?;
//! server.start().await?;
//! // ...
//! server.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod timer;

pub use timer::TokioTimer;

use crate::error::{Error, Result, TimerError};
use crate::logging::{LogLevel, SdLogger};
use crate::sd::{SdSender, SdServer, SdServerState, TimerHandle};
use crate::transport::SomeIpTransport;
use config::ServerConfig;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

const COMPONENT: &str = "Runtime";
const COMMAND_CAPACITY: usize = 32;

enum Command {
    Start { response: oneshot::Sender<Result<()>> },
    Stop { response: oneshot::Sender<()> },
    SetServiceAvailability { available: bool, response: oneshot::Sender<Result<()>> },
    SetLinkAvailability { available: bool, response: oneshot::Sender<Result<()>> },
    State { response: oneshot::Sender<SdServerState> },
    Shutdown { response: oneshot::Sender<()> },
}

/// Async control surface of a spawned server. Cheap to clone.
///
/// Dropping the last handle stops the server like [`shutdown`](Self::shutdown).
#[derive(Clone)]
pub struct SdServerHandle {
    commands: mpsc::Sender<Command>,
}

impl SdServerHandle {
    pub async fn start(&self) -> Result<()> {
        self.request(|response| Command::Start { response }).await?
    }

    pub async fn stop(&self) -> Result<()> {
        self.request(|response| Command::Stop { response }).await
    }

    pub async fn set_service_availability(&self, available: bool) -> Result<()> {
        self.request(|response| Command::SetServiceAvailability { available, response }).await?
    }

    pub async fn set_link_availability(&self, available: bool) -> Result<()> {
        self.request(|response| Command::SetLinkAvailability { available, response }).await?
    }

    pub async fn state(&self) -> Result<SdServerState> {
        self.request(|response| Command::State { response }).await
    }

    /// Stop the server, send the trailing STOP-OFFER if one is owed, and end the task.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|response| Command::Shutdown { response }).await
    }

    async fn request<R>(&self, command: impl FnOnce(oneshot::Sender<R>) -> Command) -> Result<R> {
        let (response, reply) = oneshot::channel();
        self.commands
            .send(command(response))
            .await
            .map_err(|_| Error::RuntimeShutdown)?;
        reply.await.map_err(|_| Error::RuntimeShutdown)
    }
}

/// Spawn the server task on the current tokio runtime.
///
/// The server starts in `NotReady`; call [`SdServerHandle::start`] to begin announcing.
pub fn spawn<T>(config: &ServerConfig, transport: T, logger: Arc<dyn SdLogger>) -> Result<SdServerHandle>
where
    T: SomeIpTransport + 'static,
{
    let runtime = Handle::try_current().map_err(|_| TimerError::NoRuntime)?;

    let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();
    let server = config
        .build_server(TokioTimer::new(expiry_tx))?
        .with_logger(logger.clone());
    let sender = SdSender::for_descriptor(transport, server.descriptor(), config.ttl()?);

    logger.log(
        LogLevel::Info,
        COMPONENT,
        &format!("SD server for {} sending to {}", server.descriptor(), sender.destination()),
    );

    let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
    runtime.spawn(server_task(server, sender, command_rx, expiry_rx, logger));
    Ok(SdServerHandle { commands: command_tx })
}

async fn server_task<T: SomeIpTransport>(
    mut server: SdServer<TokioTimer>,
    mut sender: SdSender<T>,
    mut commands: mpsc::Receiver<Command>,
    mut expiries: mpsc::UnboundedReceiver<TimerHandle>,
    logger: Arc<dyn SdLogger>,
) {
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Shutdown { response }) => {
                    server.stop();
                    flush(&mut server, &mut sender, logger.as_ref());
                    let _ = response.send(());
                    break;
                }
                Some(command) => handle_command(&mut server, command),
                None => {
                    server.stop();
                    flush(&mut server, &mut sender, logger.as_ref());
                    break;
                }
            },
            Some(handle) = expiries.recv() => {
                if let Err(e) = server.on_timer_expired(handle) {
                    logger.log(LogLevel::Error, COMPONENT, &format!("announcement halted: {}", e));
                }
            }
        }
        flush(&mut server, &mut sender, logger.as_ref());
    }
    logger.log(LogLevel::Info, COMPONENT, &format!("SD server for {} shut down", server.descriptor()));
}

fn handle_command(server: &mut SdServer<TokioTimer>, command: Command) {
    match command {
        Command::Start { response } => {
            let _ = response.send(server.start());
        }
        Command::Stop { response } => {
            server.stop();
            let _ = response.send(());
        }
        Command::SetServiceAvailability { available, response } => {
            let _ = response.send(server.set_service_availability(available));
        }
        Command::SetLinkAvailability { available, response } => {
            let _ = response.send(server.set_link_availability(available));
        }
        Command::State { response } => {
            let _ = response.send(server.state());
        }
        // Handled by the task loop
        Command::Shutdown { response } => {
            let _ = response.send(());
        }
    }
}

/// Hand queued messages to the transport, oldest first.
///
/// SD is best effort: a message the transport rejects is dropped, never retried.
fn flush<T: SomeIpTransport>(server: &mut SdServer<TokioTimer>, sender: &mut SdSender<T>, logger: &dyn SdLogger) {
    let buffer = server.messages_mut();
    while !buffer.is_empty() {
        if let Err(e) = sender.flush(buffer) {
            if let Some(message) = buffer.pop() {
                logger.log(
                    LogLevel::Warn,
                    COMPONENT,
                    &format!("dropping {:?} for 0x{:04x}: {}", message.kind, message.service_id, e),
                );
            }
        }
    }
}
