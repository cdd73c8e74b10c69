use tracing_subscriber::EnvFilter;

/// Installs a per-test tracing subscriber honoring `RUST_LOG`.
///
/// Keep the returned guard alive for the duration of the test; dropping it
/// restores the previous default subscriber.
pub struct TestTracing {
    _guard: tracing::subscriber::DefaultGuard,
}

impl TestTracing {
    pub fn init() -> Self {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        Self { _guard: guard }
    }
}
