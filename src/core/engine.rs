/*!

The `Engine` bundles everything one decision run mutates: the term and symbol workshops, the
result cache, the measurement counters, and the run's options. Nothing engine-scoped is global,
so concurrent runs in one process stay independent.

The engine is boxed at construction (`BxEngine`) and never moved afterwards, because the terms
it owns hold its address: fixpoints and continuations reach back into the engine for the result
cache, the statistics, and the automaton dispatch. Execution is single-threaded cooperative
throughout: iterators are the only suspension points, and there are no locks or atomics on any
engine path.

*/

use crate::{
  api::{
    automaton::{automaton_id, AutomatonPtr},
    symbol::SymbolPtr,
    term::{term_id, TermPtr},
    Decision,
    ResultType,
  },
  core::{
    cache::BinaryCache,
    error::EngineError,
    statistics::EngineStatistics,
    workshops::{SymbolWorkshop, TermWorkshop},
  },
  debug,
  info,
};

/// A pointer to the engine. No ownership is assumed; the boxed engine outlives every term that
/// carries its address.
pub type EnginePtr = *mut Engine;
pub type BxEngine  = Box<Engine>;

/// Key of the result cache: `(automaton, term, symbol)` identity plus the query polarity.
pub type ResultKey = (usize, usize, usize, bool);

/// Per-run tunables. Defaults come from the crate-level configuration constants.
#[derive(Copy, Clone, Debug)]
pub struct EngineOptions {
  /// Let base-set candidates invalidate fixpoint members they subsume during membership tests.
  pub prune_fixpoint: bool,
  /// Run `remove_subsumed` whenever an iterator over a fixpoint is exhausted.
  pub reduce_fixpoint_everytime: bool,
  /// Search order for fixpoints created without an explicit policy.
  pub worklist_search: crate::api::term::fixpoint::SearchPolicy,
}

impl Default for EngineOptions {
  fn default() -> EngineOptions {
    EngineOptions {
      prune_fixpoint:            crate::OPT_PRUNE_FIXPOINT,
      reduce_fixpoint_everytime: crate::OPT_REDUCE_FIXPOINT_EVERYTIME,
      worklist_search:           crate::DEFAULT_WORKLIST_SEARCH,
    }
  }
}

pub struct Engine {
  pub terms:      TermWorkshop,
  pub symbols:    SymbolWorkshop,
  /// Memoized `intersect_non_empty` dispatches.
  pub results:    BinaryCache<ResultKey, ResultType>,
  pub statistics: EngineStatistics,
  pub options:    EngineOptions,
}

impl Engine {
  pub fn new(track_count: usize) -> BxEngine {
    Engine::with_options(track_count, EngineOptions::default())
  }

  pub fn with_options(track_count: usize, options: EngineOptions) -> BxEngine {
    let mut engine = Box::new(Engine {
      terms:      TermWorkshop::new(),
      symbols:    SymbolWorkshop::new(track_count),
      results:    BinaryCache::new(),
      statistics: EngineStatistics::default(),
      options,
    });
    // The box gives the engine its stable address; only now can the workshop learn it.
    let engine_ptr: EnginePtr = engine.as_mut();
    engine.terms.attach(engine_ptr);
    engine
  }

  pub fn ptr(&mut self) -> EnginePtr {
    self
  }

  /// Memoized dispatch to an automaton node. The fixpoint machinery funnels every automaton
  /// query through here, so re-running a postponed work item or re-forcing a continuation after
  /// teardown of intermediate state costs a table lookup.
  pub fn intersect_non_empty(
    &mut self,
    aut: AutomatonPtr,
    symbol: SymbolPtr,
    term: TermPtr,
    under_complement: bool,
  ) -> Result<ResultType, EngineError> {
    let key = (automaton_id(aut), term_id(term), symbol as usize, under_complement);
    if let Some(&cached) = self.results.get(&key) {
      return Ok(cached);
    }

    let result = unsafe { &mut *aut }.intersect_non_empty(symbol, term, under_complement)?;
    self.results.insert(key, result);
    Ok(result)
  }

  /// The driver: decides the formula represented by `aut` starting from `initial_term`.
  /// A satisfying example is searched with a membership query and a counter-example with a
  /// non-membership query; the pair classifies the formula.
  pub fn decide(
    &mut self,
    aut: AutomatonPtr,
    initial_term: TermPtr,
  ) -> Result<Decision, EngineError> {
    let zero = self.symbols.zero_symbol();

    let (_, has_example) = self.intersect_non_empty(aut, zero, initial_term, false)?;
    debug!(2, "satisfying example search finished: {}", has_example);
    let (_, has_counterexample) = self.intersect_non_empty(aut, zero, initial_term, true)?;
    debug!(2, "counter-example search finished: {}", has_counterexample);

    let decision = match (has_example, has_counterexample) {
      (true, false)  => Decision::Valid,
      (true, true)   => Decision::Satisfiable,
      (false, true)  => Decision::Unsatisfiable,
      // Degenerate: no example and no counter-example. Reported rather than asserted so a
      // misbehaving automaton tree surfaces as a visible verdict.
      (false, false) => Decision::Invalid,
    };
    info!(1, "decision: {}", decision);
    Ok(decision)
  }

  /// Invokes `hook` with `(group, measure, value)` for every engine counter, including the
  /// result cache traffic. The hook formats; the engine does not.
  pub fn for_each_measure(&self, hook: &mut dyn FnMut(&'static str, &'static str, usize)) {
    self.statistics.for_each_measure(hook);
    hook("results", "hits", self.results.hits);
    hook("results", "misses", self.results.misses);
  }

  /// Convenience dump through the logging layer.
  pub fn dump_statistics(&self) {
    self.for_each_measure(&mut |group, name, value| {
      debug!(2, "{}.{}: {}", group, name, value);
    });
  }
}
