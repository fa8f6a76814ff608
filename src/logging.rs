use tracing_subscriber::{fmt, EnvFilter};

pub const SERVER_DIRECTIVES: &str = "notecmd=info,tower_http=info";
pub const CLI_DIRECTIVES: &str = "notecmd=warn";

/// Install the global subscriber, writing to stderr. `RUST_LOG` wins over
/// `default_directives`. Calling this twice is harmless.
pub fn init(default_directives: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
