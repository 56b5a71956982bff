//! Logging setup. Library code logs through the `log` macros; binaries and
//! embedding applications call `init_logging` once at startup.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Install the global logger at `level`; `RUST_LOG` takes precedence.
///
/// Calling this more than once keeps the first logger.
pub fn init_logging(level: LevelFilter) {
    let env = Env::default().default_filter_or(level.as_str());
    let _ = Builder::from_env(env)
        .format_timestamp_millis()
        .format_target(false)
        .try_init();
}
