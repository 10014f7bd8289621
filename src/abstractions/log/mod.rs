/*!

Logging with a numeric verbosity threshold layered over the `tracing` crate.

Every log entry is emitted "at" a threshold, a small number describing its verbosity. Entries are
only printed while their threshold is at most the global logging threshold, so raising the global
threshold makes the engine chattier. A message logged with no explicit threshold defaults to
threshold 0 and is always printed.

```
use ws1slib::log::{info, debug, set_global_logging_threshold};

set_global_logging_threshold(2);
info!(1, "fixpoint closed after {} members", 17); // printed
debug!(4, "worklist: {:?}", [1, 2, 3]);           // suppressed
```

The macros (`critical!`, `error!`, `warning!`, `info!`, `debug!`, `trace!`) initialize the
subscriber implicitly on first use; no setup call is required. The global threshold is an atomic,
so it can be adjusted at any time, including before the first log entry.

*/
mod filter;
mod formatter;
mod macros;

use std::sync::atomic::{AtomicU8, Ordering};

use once_cell::sync::Lazy;
use tracing_subscriber::{
  fmt,
  layer::SubscriberExt,
  Registry
};

use filter::ThresholdFilter;
use formatter::EventFieldFormatter;
pub use macros::*;

/// Default global threshold: moderately verbose.
const DEFAULT_THRESHOLD: u8 = 3;

static GLOBAL_LOGGING_THRESHOLD: AtomicU8 = AtomicU8::new(DEFAULT_THRESHOLD);

/// Used for implicit one-time initialization of the subscriber.
static INIT_LOGGER: Lazy<()> = Lazy::new(|| {
  let subscriber = Registry::default()
      .with(ThresholdFilter)
      .with(
        fmt::layer()
            .fmt_fields(EventFieldFormatter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stdout),
      );

  tracing::subscriber::set_global_default(subscriber).expect("failed to set tracing subscriber");
});

/// Initializes the logging system. The logging macros call this implicitly; it does not need to
/// be called directly.
pub fn init_logger() {
  Lazy::force(&INIT_LOGGER);
}

/// Sets the global logging threshold. Messages logged at a greater threshold are suppressed.
pub fn set_global_logging_threshold(new_threshold: u8) {
  GLOBAL_LOGGING_THRESHOLD.store(new_threshold, Ordering::SeqCst);
}

/// Retrieves the global logging threshold.
pub fn get_global_logging_threshold() -> u8 {
  GLOBAL_LOGGING_THRESHOLD.load(Ordering::SeqCst)
}
