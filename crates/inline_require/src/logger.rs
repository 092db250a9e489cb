use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Logs go to stderr, stdout carries transformed code.
pub fn init_logger(verbose: bool) {
    let default_filter = if verbose {
        "inline_require=debug"
    } else {
        "inline_require=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_span_events(FmtSpan::NONE)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
