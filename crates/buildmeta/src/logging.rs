use std::sync::Once;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: Once = Once::new();

/// Install a global `tracing` subscriber once per process.
///
/// With an explicit `filter` the subscriber is always installed. Without one
/// it is only installed when `RUST_LOG` is set, so library users who bring
/// their own subscriber are left alone.
pub fn init_tracing(filter: Option<&str>) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*};

        let Some(filter) = env_filter(filter) else {
            return;
        };

        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true))
            .with(filter)
            .try_init();
    });
}

/// An invalid directive string falls back to `warn`.
fn env_filter(filter: Option<&str>) -> Option<EnvFilter> {
    match filter {
        Some(directives) => Some(EnvFilter::try_new(directives).unwrap_or_else(|err| {
            eprintln!("buildmeta: invalid log filter '{}': {}", directives, err);
            EnvFilter::new("warn")
        })),
        None if std::env::var("RUST_LOG").is_ok() => Some(EnvFilter::from_default_env()),
        None => None,
    }
}
