//! Logging initialization and utilities

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`.
/// Override with RUST_LOG environment variable.
///
/// # Example
/// ```
/// stablescan::core::logging::init();
/// log::info!("Session started");
/// ```
pub fn init() {
    // try_init: tests and embedding applications may already own a logger
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).try_init();
}
