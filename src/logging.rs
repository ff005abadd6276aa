use log::{info, log_enabled, Level};

/// Initializes the logger with the `env_logger` crate.
///
/// Verbosity follows `RUST_LOG`; raw frame dumps are emitted on the
/// `modbus::frame` target at debug level.
pub fn init_logger() {
    env_logger::init();
}

/// Like [`init_logger`], but falls back to `default_filter` when `RUST_LOG`
/// is unset. Safe to call more than once.
pub fn init_logger_with_default(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Logs an informational message.
pub fn log_info(message: &str) {
    if log_enabled!(Level::Info) {
        info!("{message}");
    }
}
