//! Tracing setup for processes embedding `series-parity`.
//!
//! Parity failures, fallbacks and stage progress are emitted through
//! `tracing`. Hosts either call `init_default_tracing` or install their own
//! subscriber and filters.

/// Initializes a default `tracing` subscriber when the `telemetry` feature is enabled.
///
/// Returns `true` when initialization succeeds.
/// Returns `false` when no initialization is performed (feature disabled) or if a
/// global subscriber was already set by the host application.
#[must_use]
pub fn init_default_tracing() -> bool {
    init_tracing_with_default_filter("info")
}

/// Same as [`init_default_tracing`], using `directive` when `RUST_LOG` is unset.
#[must_use]
pub fn init_tracing_with_default_filter(directive: &str) -> bool {
    #[cfg(feature = "telemetry")]
    {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directive)),
            )
            .with_target(false)
            .compact();

        return builder.try_init().is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        let _ = directive;
        false
    }
}
