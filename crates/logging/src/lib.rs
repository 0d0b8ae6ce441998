use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[doc(hidden)]
pub use tracing as __tracing;

/// Installs the global subscriber. `RUST_LOG` overrides the `info` default.
/// Calling it again after a subscriber is installed is a no-op.
pub fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_thread_names(true)
                .with_line_number(false)
                .with_file(false),
        )
        .with(filter)
        .try_init();

    if installed.is_err() {
        tracing::debug!("global subscriber already installed");
    }
}

/// Evaluates an expression and logs how long it took at `info`.
///
/// ```ignore
/// let schema = logging::timeit!("introspect schema", backend.introspect_schema().await)?;
/// ```
#[macro_export]
macro_rules! timeit {
    ($label:expr, $body:expr) => {{
        let __started = ::std::time::Instant::now();
        let __result = $body;
        $crate::__tracing::info!(
            elapsed_ms = __started.elapsed().as_millis() as u64,
            "{} finished",
            $label
        );
        __result
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn timeit_returns_the_body_value() {
        let value = crate::timeit!("addition", 2 + 2);
        assert_eq!(value, 4);
    }

    #[test]
    fn init_logger_is_idempotent() {
        super::init_logger();
        super::init_logger();
    }
}
