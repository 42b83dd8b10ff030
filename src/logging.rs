use tracing::Level;

/// Install the default `fmt` subscriber at `INFO`.
///
/// Returns `false` when a global subscriber was already set, so hosts and
/// tests can call it unconditionally.
pub fn init() -> bool {
    init_with_level(Level::INFO)
}

pub fn init_with_level(level: Level) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .is_ok()
}
