use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// Honours `RUST_LOG` and defaults to `zapshift=info`. Logs go to stderr so
/// that stdout only carries command output.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "zapshift=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
