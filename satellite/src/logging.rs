//! Tracing subscriber wiring for binaries/test harnesses that embed this
//! crate. Library code never installs a global subscriber on its own; this
//! is an opt-in helper for the process entry point.

use tracing_subscriber::{fmt, EnvFilter};

/// Install a `fmt` subscriber honoring `RUST_LOG`, defaulting to `info`.
///
/// Safe to call more than once: a subscriber already installed by the
/// caller is left in place rather than replaced or panicking.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
