#![forbid(unsafe_code)]

//! Logging and tracing support.
//!
//! With the `tracing` feature the `tracing` macros used by the list engine are
//! re-exported here and at the crate root, so list code writes
//! `daylog_core::debug!(...)` whether or not a subscriber exists. Without the
//! feature the same macros swallow their arguments and spans become
//! [`NoopSpan`], so nothing inside a log call is ever evaluated.
//!
//! `tracing-json` additionally provides [`init_json_logging`] for hosts that
//! want line-delimited JSON on stderr, filtered by `DAYLOG_LOG`.

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, info, trace, trace_span, warn};

/// Environment variable holding the `EnvFilter` directive for JSON logging.
#[cfg(feature = "tracing-json")]
pub const ENV_LOG_FILTER: &str = "DAYLOG_LOG";

/// Install a global JSON subscriber filtered by [`ENV_LOG_FILTER`].
///
/// Returns `false` if a global subscriber was already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json_logging() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(ENV_LOG_FILTER)
        .unwrap_or_else(|_| EnvFilter::new("daylog_list=info,daylog_core=info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

#[cfg(not(feature = "tracing"))]
mod disabled {
    /// Discards its arguments (`tracing` feature off).
    #[macro_export]
    macro_rules! trace {
        ($($ignored:tt)*) => {};
    }

    /// Discards its arguments (`tracing` feature off).
    #[macro_export]
    macro_rules! debug {
        ($($ignored:tt)*) => {};
    }

    /// Discards its arguments (`tracing` feature off).
    #[macro_export]
    macro_rules! info {
        ($($ignored:tt)*) => {};
    }

    /// Discards its arguments (`tracing` feature off).
    #[macro_export]
    macro_rules! warn {
        ($($ignored:tt)*) => {};
    }

    /// Evaluates to a [`NoopSpan`](crate::logging::NoopSpan).
    #[macro_export]
    macro_rules! trace_span {
        ($($ignored:tt)*) => {
            $crate::logging::NoopSpan
        };
    }

    /// Evaluates to a [`NoopSpan`](crate::logging::NoopSpan).
    #[macro_export]
    macro_rules! debug_span {
        ($($ignored:tt)*) => {
            $crate::logging::NoopSpan
        };
    }
}

/// What `debug_span!` and `trace_span!` produce without the `tracing` feature.
#[cfg(not(feature = "tracing"))]
#[derive(Debug, Clone, Copy)]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    pub fn enter(&self) -> NoopGuard {
        NoopGuard
    }

    /// Counterpart of `tracing::Span::entered`.
    pub fn entered(self) -> NoopGuard {
        NoopGuard
    }
}

#[cfg(not(feature = "tracing"))]
#[derive(Debug)]
pub struct NoopGuard;

#[cfg(all(test, not(feature = "tracing")))]
mod tests {
    #[test]
    fn disabled_macros_accept_tracing_syntax() {
        crate::debug!(rows = 30, batch = 50, "batch init");
        crate::warn!("dropped record {}", "r-1");
        crate::info!(target: "daylog", "loaded");
        let _guard = crate::debug_span!("toggle", day = %"2024-05-01").entered();
        let span = crate::trace_span!("resolve");
        let _entered = span.enter();
    }
}
