use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const QUIET_DIRECTIVES: &str = "warn";
const VERBOSE_DIRECTIVES: &str = "warn,coinbani=debug";

/// Filter directives used when `RUST_LOG` is unset. Verbose mode only opens
/// up this crate; dependencies stay at `warn`.
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_DIRECTIVES
    } else {
        QUIET_DIRECTIVES
    }
}

fn build_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directives(verbose)))
}

/// Installs the global subscriber, writing to stderr so stdout carries only
/// price output. A valid `RUST_LOG` wins over `verbose`.
pub fn init_logging(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(rust_log.as_deref(), verbose);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(verbose)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
