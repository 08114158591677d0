use tracing_subscriber::EnvFilter;

/// Install a stderr `fmt` subscriber, keeping stdout for command output.
///
/// `level` is any `EnvFilter` directive string; config loading has already
/// let `RUST_LOG` override it.
pub fn init(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
