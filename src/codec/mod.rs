//! # SOME/IP Codec Module
//!
//! Encoding helpers for the SD messages this crate sends.
//!
//! ## Key Types
//!
//! - [`SomeIpHeader`] - 16-byte SOME/IP header with message metadata
//! - [`SomeIpSerialize`] / [`SomeIpDeserialize`] - Traits for payload encoding
//! - [`SdSessionCounter`] - SD session ID and reboot flag bookkeeping
//!
//! ## Example
//!
//! ```
//! use someip_sd_server::codec::SomeIpHeader;
//!
//! let header = SomeIpHeader::sd(1, 28);
//! let bytes = header.serialize();
//! assert_eq!(bytes[0..2], [0xFF, 0xFF]);
//! ```

pub mod header;
pub mod traits;
pub mod session;

pub use header::*;
pub use traits::{SomeIpSerialize, SomeIpDeserialize};
pub use session::SdSessionCounter;
