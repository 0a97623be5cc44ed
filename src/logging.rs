//! Tracing setup helpers.

use std::path::Path;

use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
}

/// Route tracing output through the test harness so it is captured per test.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_test_writer()
        .try_init();
}

/// Log to stderr, or append to `log_file` without ANSI colors.
pub fn init_cli_logging(log_file: Option<&Path>) -> std::io::Result<()> {
    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(file)
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
