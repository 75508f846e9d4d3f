//! # someip-sd-server
//!
//! SOME/IP Service Discovery server: announces one service instance on an
//! in-vehicle Ethernet network and governs the OFFER / STOP-OFFER lifecycle
//! (initial wait, repetition burst, cyclic main phase) in reaction to start/stop
//! requests and service or link availability changes.
//!
//! - [`sd`] - the state machine and its collaborators (timer seam, message buffer, sender)
//! - [`runtime`] - tokio task driving a server with real timers
//! - [`transport`] - UDP transport
//! - [`codec`] - SOME/IP header and SD session encoding

pub mod codec;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod sd;
pub mod transport;

pub use error::{ConfigError, Error, Result, TimerError};
pub use transport::{SomeIpTransport, UdpTransport};
pub use codec::{SomeIpHeader, SomeIpSerialize, SomeIpDeserialize};

pub use sd::server::{SdServer, SdServerState, StartPolicy};
pub use sd::descriptor::{ServiceInstanceDescriptor, DEFAULT_SD_PORT};
pub use sd::timing::TimingConfig;
pub use sd::message::{SdMessage, SdMessageKind};
pub use sd::timer::{TimerFacility, TimerHandle, VirtualTimer};
pub use runtime::{SdServerHandle, TokioTimer};
