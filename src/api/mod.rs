/*!

The public API of the library: the term model, symbols, the symbolic-automaton callback the
engine consumes, and the types exchanged across that boundary.

*/

pub mod automaton;
pub mod symbol;
pub mod term;

use std::fmt::{Display, Formatter};

use crate::api::term::TermPtr;

/// Identifier of a base automaton state.
pub type BaseState = usize;

/// The value produced by one `intersect_non_empty` step: the image term together with the
/// epsilon-check result for the step.
pub type ResultType = (TermPtr, bool);

/// Outcome of the decision procedure.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Decision {
  Satisfiable,
  Unsatisfiable,
  Valid,
  Invalid,
}

impl Display for Decision {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Decision::Satisfiable   => write!(f, "satisfiable"),
      Decision::Unsatisfiable => write!(f, "unsatisfiable"),
      Decision::Valid         => write!(f, "valid"),
      Decision::Invalid       => write!(f, "invalid"),
    }
  }
}
