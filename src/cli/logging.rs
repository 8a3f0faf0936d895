//! Logging initialization

/// Initialize logging based on debug flag
///
/// Logs go to stderr so command output on stdout stays machine readable.
/// `RUST_LOG` wins when set; otherwise `--debug` selects `debug` and the
/// default is `warn`.
pub fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };

    let result = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_ansi(false)
        .with_target(true)
        .with_file(debug)
        .with_line_number(true)
        .try_init();

    if result.is_err() {
        // A subscriber is already installed (tests, embedding); keep it
        tracing::debug!("Global tracing subscriber already set");
    }
}
