//! # Error Types
//!
//! | Variant | Cause | Recoverable? |
//! |---------|-------|--------------|
//! | [`Error::Io`] | Socket or file I/O failure | Maybe (retry) |
//! | [`Error::Config`] | Invalid timing or malformed configuration | No (fix config) |
//! | [`Error::Timer`] | The timer facility could not arm a timer | Yes (`start()` again) |
//! | [`Error::RuntimeShutdown`] | The server task has finished | No |
//!
//! Stale timer expirations are not errors; the server drops them silently.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Result type alias using the crate's [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for all crate operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("timer error: {0}")]
    Timer(#[from] TimerError),

    /// The task driving the server is gone, so the command could not be delivered.
    #[error("SD server task has shut down")]
    RuntimeShutdown,
}

/// Rejected construction parameters.
///
/// Invalid timing is refused outright; nothing is clamped.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("initial delay range is inverted: min {min:?} > max {max:?}")]
    InitialDelayRange { min: Duration, max: Duration },

    #[error("cycle offer delay must be non-zero")]
    ZeroCycleOfferDelay,

    #[error("repetition base delay must be non-zero when repetition_max is {0}")]
    ZeroRepetitionBaseDelay(u32),

    #[error("repetition delay overflows within {0} repetitions")]
    RepetitionDelayOverflow(u32),

    #[error("delay {delay:?} exceeds the maximum of {max:?}")]
    DelayTooLong { delay: Duration, max: Duration },

    /// Zero would turn every OFFER into a STOP-OFFER; the wire field is 24 bits.
    #[error("offer TTL {0} is outside 1..=0xFFFFFF")]
    InvalidTtl(u32),

    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure to arm a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("no timer runtime is available on this thread")]
    NoRuntime,

    #[error("timer facility refused to arm a timer")]
    Unavailable,

    #[error("periodic timer requires a non-zero period")]
    ZeroPeriod,

    #[error("timer deadline is beyond the clock's range")]
    DeadlineOverflow,
}
