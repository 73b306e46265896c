//! Log setup. Library events go to stderr so stdout stays readable.

use crate::config::Verbosity;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Default filter for a verbosity level when `RUST_LOG` is unset
#[must_use]
pub const fn default_filter(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "warn,handset=info,handset_cli=info",
        Verbosity::Debug => "debug,reqwest=info,hyper_util=info",
    }
}

/// Install the global subscriber
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

    // A second init (tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(stderr)
        .with_target(true)
        .compact()
        .try_init();
}
