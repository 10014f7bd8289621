//! A `tracing` layer that drops events whose recorded threshold exceeds the global logging
//! threshold. Extracting a field value from an event requires the visitor machinery below; this
//! is how the `tracing` crate does things.

use std::fmt::Debug;

use tracing::{
  field::{Field, Visit},
  Event,
  Subscriber
};
use tracing_subscriber::{
  layer::Context,
  registry::LookupSpan,
  Layer
};

use super::get_global_logging_threshold;

pub(crate) struct ThresholdFilter;

impl<S> Layer<S> for ThresholdFilter
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
  fn event_enabled(&self, event: &Event<'_>, _ctx: Context<'_, S>) -> bool {
    let mut visitor = ThresholdVisitor { threshold: None };
    event.record(&mut visitor);

    match visitor.threshold {
      // An event with no threshold field is treated as threshold 0 and always passes.
      None => true,
      Some(threshold) => threshold <= get_global_logging_threshold(),
    }
  }
}

/// Extracts the `threshold` field from an event's recorded values.
struct ThresholdVisitor {
  threshold: Option<u8>,
}

impl ThresholdVisitor {
  fn set(&mut self, value: i128) {
    if value < 0 || value > u8::MAX as i128 {
      panic!("invalid threshold value supplied to the logger: {}", value);
    }
    self.threshold = Some(value as u8);
  }
}

impl Visit for ThresholdVisitor {
  fn record_i64(&mut self, field: &Field, value: i64) {
    if field.name() == "threshold" {
      self.set(value as i128);
    }
  }

  fn record_u64(&mut self, field: &Field, value: u64) {
    if field.name() == "threshold" {
      self.set(value as i128);
    }
  }

  fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
    if field.name() == "threshold" {
      panic!("invalid threshold value supplied to the logger: {:?}", value);
    }
  }
}
