//! Field formatting for log lines. The `threshold` field is bookkeeping for the filtering layer
//! and is hidden from the output; the `critical` flag renders as a `[CRITICAL]` prefix.

use tracing::field::{Field, Visit};
use tracing_subscriber::{
  field::RecordFields,
  fmt::{
    format::Writer,
    FormatFields
  }
};

pub(crate) struct EventFieldFormatter;

impl<'writer> FormatFields<'writer> for EventFieldFormatter {
  fn format_fields<R: RecordFields>(
    &self,
    writer: Writer<'writer>,
    fields: R,
  ) -> std::fmt::Result {
    let mut visitor = FieldWriter { writer };
    fields.record(&mut visitor);
    Ok(())
  }
}

struct FieldWriter<'writer> {
  writer: Writer<'writer>,
}

impl<'writer> Visit for FieldWriter<'writer> {
  fn record_i64(&mut self, field: &Field, value: i64) {
    if field.name() != "threshold" {
      let _ = write!(self.writer, "{}={} ", field.name(), value);
    }
  }

  fn record_u64(&mut self, field: &Field, value: u64) {
    if field.name() != "threshold" {
      let _ = write!(self.writer, "{}={} ", field.name(), value);
    }
  }

  fn record_bool(&mut self, field: &Field, value: bool) {
    if field.name() == "critical" {
      if value {
        let _ = write!(self.writer, "[CRITICAL] ");
      }
    } else {
      let _ = write!(self.writer, "{}={} ", field.name(), value);
    }
  }

  fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
    match field.name() {
      "message" => {
        let _ = write!(self.writer, "{:?}", value);
      }

      "critical" => {
        let _ = write!(self.writer, "[CRITICAL] ");
      }

      "threshold" => {
        // Not printed.
      }

      name => {
        let _ = write!(self.writer, "{}={:?} ", name, value);
      }
    }
  }
}
