/// Installs an `EnvFilter`-backed subscriber, defaulting to `info` for this
/// workspace's own crates when `RUST_LOG` is unset. Mirrors the
/// registry/fmt-layer setup used by the HTTP-serving examples in the pack,
/// minus any axum/http layer — this workspace has no server of its own to
/// instrument.
pub fn init(default_directive: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
