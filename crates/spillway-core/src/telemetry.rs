use tracing_subscriber::EnvFilter;

/// Route the offload, rehydration and cleanup events of the extended client
/// to stdout. Debug builds print human-readable lines, release builds one JSON
/// object per event. `RUST_LOG` picks the level (`info` when unset), e.g.
/// `RUST_LOG=spillway_sdk=debug` to see every offloaded pointer.
///
/// Returns `false` if a global subscriber is already installed, so test
/// harnesses and demos may each call it.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = if cfg!(debug_assertions) {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init()
    };
    installed.is_ok()
}
