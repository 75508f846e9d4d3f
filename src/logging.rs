use std::io::Write;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

/// Sink for diagnostic output of the server and its runtime.
///
/// Injected as `Arc<dyn SdLogger>` so tests and embedders can capture output.
pub trait SdLogger: Send + Sync {
    fn log(&self, level: LogLevel, component: &str, msg: &str);
}

/// Forwards to the `log` facade, using the component as the log target.
pub struct LogFacade;

impl LogFacade {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl SdLogger for LogFacade {
    fn log(&self, level: LogLevel, component: &str, msg: &str) {
        let level: log::Level = level.into();
        log::log!(target: component, level, "{}", msg);
    }
}

/// Install an `env_logger` backend honouring `RUST_LOG` (default `info`).
///
/// Lines look like `[INFO ] [SdServer] message`. Calling this twice is harmless.
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(buf, "[{:<5}] [{}] {}", record.level(), record.target(), record.args())
        })
        .try_init();
}
