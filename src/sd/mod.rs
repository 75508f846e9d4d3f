//! # Service Discovery Module
//!
//! Server-side SOME/IP-SD announcement lifecycle for one service instance.
//!
//! ## Key Types
//!
//! - [`SdServer`] - the announcement state machine
//! - [`TimerFacility`] / [`VirtualTimer`] - timer seam and a deterministic clock
//! - [`MessageBuffer`] / [`SdMessage`] - outgoing OFFER / STOP-OFFER queue
//! - [`SdSender`] - drains the queue onto a [`SomeIpTransport`](crate::transport::SomeIpTransport)
//!
//! ## Example
//!
//! ```
//! use someip_sd_server::sd::{SdServer, ServiceInstanceDescriptor, TimingConfig, VirtualTimer};
//! use std::net::Ipv4Addr;
//! use std::time::Duration;
//!
//! let descriptor = ServiceInstanceDescriptor::new(0x1234, 1, 1, 0, Ipv4Addr::new(224, 224, 224, 245));
//! let timing = TimingConfig::from_millis(100, 100, 50, 1000, 2).unwrap();
//! let mut server = SdServer::new(descriptor, timing, VirtualTimer::new()).unwrap();
//!
//! server.start().unwrap();
//! let fired = server.timer_mut().fire_next(Duration::from_millis(100)).unwrap();
//! server.on_timer_expired(fired).unwrap();
//! assert_eq!(server.take_messages().len(), 1);
//! ```

pub mod entries;
pub mod packet;
pub mod descriptor;
pub mod timing;
pub mod message;
pub mod buffer;
pub mod timer;
pub mod server;
pub mod sender;

pub use entries::*;
pub use packet::*;
pub use descriptor::*;
pub use timing::*;
pub use message::*;
pub use buffer::*;
pub use timer::*;
pub use server::*;
pub use sender::*;

mod tests;
