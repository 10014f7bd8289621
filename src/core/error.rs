/*!

Fatal error conditions of the decision run. Everything here aborts the run: partial results are
never returned, and the workshops are left valid but frozen until teardown. Recoverable
"unknown" answers in subsumption are not errors; they are the third value of
`SubsumptionResult` and are handled by postponement.

Violated internal invariants (subsumption dispatched on mismatched term types, null handles) are
bugs, not runtime conditions, and panic with a diagnostic instead of surfacing here.

*/

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

pub enum EngineError {
  /// A corner of the engine that is deliberately not implemented was reached.
  NotImplemented {
    what: &'static str,
  },

  /// The automaton layer reported a non-deterministic transition; surfaced unchanged.
  NondeterministicTransition {
    detail: String,
  },

  /// Any other failure reported by the symbolic-automaton tree.
  Automaton {
    message: String,
  },
}

impl Display for EngineError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {

      EngineError::NotImplemented { what } => {
        write!(f, "functionality not implemented: {}", what)
      } // end `EngineError::NotImplemented` branch

      EngineError::NondeterministicTransition { detail } => {
        write!(f, "non-deterministic transition reported by the automaton layer: {}", detail)
      }

      EngineError::Automaton { message } => {
        write!(f, "automaton failure: {}", message)
      }

    } // end match on `EngineError`
  }
}

impl Debug for EngineError {
  fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
    Display::fmt(self, f)
  }
}

impl Error for EngineError {}
