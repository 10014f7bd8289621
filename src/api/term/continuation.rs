/*!

A continuation term is a thunk: "the result of `aut.intersect_non_empty(symbol, term,
under_complement)` when eventually forced". Projection automata create continuations to defer
work that may never be needed; the subsumption engine forces them on demand, because subsumption
must not be approximated across a deferred computation.

Forcing is idempotent: the result is stored in a single-assignment slot, so a second force
returns the pointer-identical term without consulting the automaton again.

*/

use crate::{
  api::{
    automaton::AutomatonPtr,
    symbol::SymbolPtr,
    term::{Term, TermKind, TermPtr},
  },
  core::{engine::Engine, error::EngineError},
};

/// Which part of the engine forced a continuation. Only used for the unfolding counters.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum UnfoldSite {
  Subsumption,
  Intersection,
}

pub struct ContinuationTerm {
  /// The automaton that will answer the deferred query.
  pub aut: AutomatonPtr,
  /// The term the query will be evaluated on.
  pub term: TermPtr,
  /// The symbol being subtracted from the term.
  pub symbol: SymbolPtr,
  /// Whether the deferred query tests membership or non-membership.
  pub under_complement: bool,

  /// Single-assignment slot for the forced result. Monotone: once set, never cleared.
  pub(crate) unfolded: Option<TermPtr>,
}

impl ContinuationTerm {
  pub fn unfolded_term(&self) -> Option<TermPtr> {
    self.unfolded
  }
}

impl Term {
  /// Forces a continuation, consulting its unfolded slot first and calling the automaton only on
  /// the first force. Panics if the term is not a continuation.
  pub fn unfold_continuation(
    &mut self,
    site: UnfoldSite,
    engine: &mut Engine,
  ) -> Result<TermPtr, EngineError> {
    match &mut self.kind {
      TermKind::Continuation(continuation) => {
        if let Some(unfolded) = continuation.unfolded {
          return Ok(unfolded);
        }

        engine.statistics.unfolding.record_total();
        match site {
          UnfoldSite::Subsumption  => engine.statistics.unfolding.record_in_subsumption(),
          UnfoldSite::Intersection => engine.statistics.unfolding.record_in_intersection(),
        }

        let (result, _value) = engine.intersect_non_empty(
          continuation.aut,
          continuation.symbol,
          continuation.term,
          continuation.under_complement,
        )?;
        continuation.unfolded = Some(result);
        Ok(result)
      }

      _ => panic!("unfold_continuation called on a non-continuation term"),
    }
  }
}
