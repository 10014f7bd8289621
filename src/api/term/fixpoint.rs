/*!

A fixpoint term *is* a fixpoint computation. It owns a worklist of `(term, symbol)` items, the
growing list of members discovered so far, and a queue of postponed items, and it exposes the
member set to consumers through iterators while the computation is still running. A consumer
that reaches the end of the current member list drives the computation one step further instead
of giving up; the parent automaton's own fixpoint is thereby pulled through a fixpoint that is
still under construction.

Two semantics share the storage and differ only in how they advance:

 - **Fixpoint.** Seeded with a starting term and the symbol alphabet; computes the least set
   closed under the automaton's transition by each symbol, modulo subsumption by existing
   members.
 - **Pre.** Seeded with an already-computed source fixpoint and an iterator into it; each outer
   step pulls one more member from the source and applies all symbols, without re-injecting
   symbols for its own results.

The member list always begins with a sentinel entry, the stable starting anchor for iterators.
Members are only ever appended; maintenance passes mark entries invalid rather than removing
them, and iterators skip invalidated entries on every `next`.

The fixpoint also aggregates the per-step epsilon-check results into a single `b_value`: an OR
across members when evaluating positively, an AND under complement. Aggregation is monotone, so
pruning members never changes `b_value`.

*/

use std::collections::VecDeque;

use crate::{
  abstractions::{rc_cell, RcCell},
  api::{
    automaton::AutomatonPtr,
    symbol::SymbolPtr,
    term::{subsumption::SubsumptionResult, Term, TermKind, TermPtr},
  },
  core::{engine::EnginePtr, error::EngineError},
  debug,
};

/// One unit of pending work: apply `symbol` to `term`.
pub type WorklistItem = (TermPtr, SymbolPtr);

/// Worklist search order. Breadth-first appends new work, depth-first prepends it; items are
/// always popped from the front.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SearchPolicy {
  BreadthFirst,
  DepthFirst,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FixpointSemantics {
  Fixpoint,
  Pre,
}

/// The one-bit aggregator for epsilon-check results: OR when evaluating positively, AND under
/// complement (a fixpoint's truth value is the OR of member truths, a co-fixpoint's the AND).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum AggregateMode {
  Or,
  And,
}

impl AggregateMode {
  pub fn for_complement(under_complement: bool) -> AggregateMode {
    if under_complement {
      AggregateMode::And
    } else {
      AggregateMode::Or
    }
  }

  #[inline(always)]
  pub fn combine(&self, accumulated: bool, value: bool) -> bool {
    match self {
      AggregateMode::Or  => accumulated || value,
      AggregateMode::And => accumulated && value,
    }
  }
}

/// An entry of a fixpoint's member list. `term == None` marks the sentinel anchor; `valid`
/// is cleared by pruning passes instead of removing the entry.
#[derive(Copy, Clone)]
pub struct FixpointMember {
  pub term:  Option<TermPtr>,
  pub valid: bool,
}

impl FixpointMember {
  pub(crate) fn sentinel() -> FixpointMember {
    FixpointMember { term: None, valid: true }
  }

  pub(crate) fn new(term: TermPtr) -> FixpointMember {
    FixpointMember { term: Some(term), valid: true }
  }
}

pub struct FixpointTerm {
  /// The automaton whose transitions close the fixpoint.
  pub(crate) aut: AutomatonPtr,
  pub(crate) engine: EnginePtr,

  /// Pre semantics only: the source fixpoint and a shared iterator into it.
  pub(crate) source_term: Option<TermPtr>,
  pub(crate) source_iter: Option<RcCell<FixpointIterator>>,
  pub(crate) source_exhausted: bool,

  pub(crate) members:   Vec<FixpointMember>,
  pub(crate) worklist:  VecDeque<WorklistItem>,
  pub(crate) postponed: VecDeque<WorklistItem>,

  /// The symbol alphabet, iterated in stored order. The order is stable and part of the
  /// contract.
  pub(crate) symbols: Vec<SymbolPtr>,

  pub(crate) aggregate: AggregateMode,
  pub(crate) search:    SearchPolicy,
  pub(crate) under_complement: bool,

  pub(crate) b_value: bool,
  /// Set whenever a member is admitted; consumed by delayed uniquing.
  pub(crate) updated: bool,
  /// How many live iterators point into `members`.
  pub(crate) iterator_count: usize,

  /// First member whose epsilon value was true resp. false, kept for witness reconstruction.
  pub(crate) sat_term:   Option<TermPtr>,
  pub(crate) unsat_term: Option<TermPtr>,
}

impl FixpointTerm {
  pub(crate) fn new_fixpoint(
    engine: EnginePtr,
    aut: AutomatonPtr,
    start: TermPtr,
    symbols: Vec<SymbolPtr>,
    under_complement: bool,
    initial_value: bool,
    search: SearchPolicy,
  ) -> FixpointTerm {
    let mut fixpoint = FixpointTerm {
      aut,
      engine,
      source_term: None,
      source_iter: None,
      source_exhausted: false,
      members:   vec![FixpointMember::sentinel(), FixpointMember::new(start)],
      worklist:  VecDeque::new(),
      postponed: VecDeque::new(),
      symbols,
      aggregate: AggregateMode::for_complement(under_complement),
      search,
      under_complement,
      b_value: initial_value,
      updated: false,
      iterator_count: 0,
      sat_term:   None,
      unsat_term: None,
    };
    let seeds: Vec<WorklistItem> =
      fixpoint.symbols.iter().map(|&symbol| (start, symbol)).collect();
    for item in seeds {
      fixpoint.push_work(item);
    }
    fixpoint
  }

  pub(crate) fn new_pre(
    engine: EnginePtr,
    aut: AutomatonPtr,
    source: TermPtr,
    symbols: Vec<SymbolPtr>,
    under_complement: bool,
    search: SearchPolicy,
  ) -> FixpointTerm {
    FixpointTerm {
      aut,
      engine,
      source_term: Some(source),
      source_iter: Some(FixpointIterator::new(source)),
      source_exhausted: false,
      members:   vec![FixpointMember::sentinel()],
      worklist:  VecDeque::new(),
      postponed: VecDeque::new(),
      symbols,
      aggregate: AggregateMode::for_complement(under_complement),
      search,
      under_complement,
      // Under AND-aggregation the neutral starting value is true.
      b_value: under_complement,
      updated: false,
      iterator_count: 0,
      sat_term:   None,
      unsat_term: None,
    }
  }

  // region Accessors

  pub fn semantics(&self) -> FixpointSemantics {
    if self.source_term.is_none() {
      FixpointSemantics::Fixpoint
    } else {
      FixpointSemantics::Pre
    }
  }

  /// The aggregated truth value of the fixpoint computation so far.
  #[inline(always)]
  pub fn result(&self) -> bool {
    self.b_value
  }

  pub fn members(&self) -> &[FixpointMember] {
    &self.members
  }

  /// Pointers of the valid, non-sentinel members, in append order.
  pub fn valid_members(&self) -> Vec<TermPtr> {
    self
      .members
      .iter()
      .filter(|member| member.valid)
      .filter_map(|member| member.term)
      .collect()
  }

  pub fn has_empty_worklist(&self) -> bool {
    self.worklist.is_empty()
  }

  /// No work left anywhere: the member list can no longer change.
  pub fn is_fully_computed(&self) -> bool {
    let source_done = match self.semantics() {
      FixpointSemantics::Fixpoint => true,
      FixpointSemantics::Pre      => self.source_exhausted,
    };
    source_done && self.worklist.is_empty() && self.postponed.is_empty()
  }

  pub fn iterator_count(&self) -> usize {
    self.iterator_count
  }

  /// The first members whose epsilon value was true resp. false, by-product data for witness
  /// reconstruction.
  pub fn fixpoint_examples(&self) -> (Option<TermPtr>, Option<TermPtr>) {
    (self.sat_term, self.unsat_term)
  }

  /// Reads and clears the updated flag. Delayed uniquing re-checks a fixpoint's identity only
  /// when this reports a change.
  pub fn test_and_set_update(&mut self) -> bool {
    let updated = self.updated;
    self.updated = false;
    updated
  }

  // endregion Accessors

  fn push_work(&mut self, item: WorklistItem) {
    match self.search {
      SearchPolicy::BreadthFirst => self.worklist.push_back(item),
      SearchPolicy::DepthFirst   => self.worklist.push_front(item),
    }
  }

  /// One advance step under Fixpoint semantics: pop a work item, compute its image, and either
  /// discard it (subsumed), postpone it (undecidable yet), or admit it and re-inject the symbol
  /// alphabet for the new member.
  pub(crate) fn compute_next_fixpoint(&mut self) -> Result<(), EngineError> {
    let (term, symbol) = self
      .worklist
      .pop_front()
      .expect("fixpoint advance with an empty worklist");
    let engine = unsafe { &mut *self.engine };

    let (result, value) =
      engine.intersect_non_empty(self.aut, symbol, term, self.under_complement)?;

    match unsafe { &mut *result }.is_subsumed_by_members(&mut self.members, engine)? {
      SubsumptionResult::Yes => Ok(()),

      SubsumptionResult::Unknown => {
        self.postponed.push_back((term, symbol));
        engine.statistics.postponed.record_admitted();
        Ok(())
      }

      SubsumptionResult::No => {
        self.admit(result, value, term, symbol);
        let symbols = self.symbols.clone();
        for next_symbol in symbols {
          self.push_work((result, next_symbol));
        }
        Ok(())
      }
    }
  }

  /// One advance step under Pre semantics. Identical to the fixpoint step except that results
  /// do not close under the symbol alphabet: Pre only applies the symbols to what the source
  /// iterator delivers.
  pub(crate) fn compute_next_pre(&mut self) -> Result<(), EngineError> {
    let (term, symbol) = self
      .worklist
      .pop_front()
      .expect("pre-fixpoint advance with an empty worklist");
    let engine = unsafe { &mut *self.engine };

    let (result, value) =
      engine.intersect_non_empty(self.aut, symbol, term, self.under_complement)?;

    match unsafe { &mut *result }.is_subsumed_by_members(&mut self.members, engine)? {
      SubsumptionResult::Yes => Ok(()),

      SubsumptionResult::Unknown => {
        self.postponed.push_back((term, symbol));
        engine.statistics.postponed.record_admitted();
        Ok(())
      }

      SubsumptionResult::No => {
        self.admit(result, value, term, symbol);
        Ok(())
      }
    }
  }

  /// Retries postponed work items against the grown member list. Returns whether any item was
  /// resolved (integrated or discarded); items that are still undecidable go back to the queue,
  /// and callers use the progress report to avoid spinning.
  pub(crate) fn process_one_postponed(&mut self) -> Result<bool, EngineError> {
    let engine = unsafe { &mut *self.engine };

    let rounds = self.postponed.len();
    for _ in 0..rounds {
      let (term, symbol) = self.postponed.pop_front().expect("postponed queue changed size");
      let (result, value) =
        engine.intersect_non_empty(self.aut, symbol, term, self.under_complement)?;

      match unsafe { &mut *result }.is_subsumed_by_members(&mut self.members, engine)? {
        SubsumptionResult::Unknown => {
          self.postponed.push_back((term, symbol));
        }

        SubsumptionResult::Yes => {
          engine.statistics.postponed.record_processed();
          return Ok(true);
        }

        SubsumptionResult::No => {
          self.admit(result, value, term, symbol);
          if self.semantics() == FixpointSemantics::Fixpoint {
            let symbols = self.symbols.clone();
            for next_symbol in symbols {
              self.push_work((result, next_symbol));
            }
          }
          engine.statistics.postponed.record_processed();
          return Ok(true);
        }
      }
    }
    Ok(false)
  }

  fn admit(&mut self, result: TermPtr, value: bool, source: TermPtr, symbol: SymbolPtr) {
    {
      let result_ref = unsafe { &mut *result };
      if result_ref.link.successor.is_none() {
        result_ref.set_successor(source, symbol);
      }
    }

    self.members.push(FixpointMember::new(result));
    self.b_value = self.aggregate.combine(self.b_value, value);
    if value {
      if self.sat_term.is_none() {
        self.sat_term = Some(result);
      }
    } else if self.unsat_term.is_none() {
      self.unsat_term = Some(result);
    }
    self.updated = true;

    debug!(4, "fixpoint admitted {}, value now {}", unsafe { &*result }, self.b_value);
  }

  /// Maintenance pass: flags every member that is subsumed by another valid member as invalid.
  /// `b_value` is untouched (the aggregator is monotone) and entries are never removed, so live
  /// iterators stay consistent and merely skip the invalidated members.
  pub fn remove_subsumed(&mut self) -> Result<(), EngineError> {
    let engine = unsafe { &mut *self.engine };

    let count = self.members.len();
    for i in 0..count {
      if !self.members[i].valid {
        continue;
      }
      let term = match self.members[i].term {
        Some(term) => term,
        None => continue,
      };

      for j in 0..count {
        if i == j || !self.members[j].valid {
          continue;
        }
        let other = match self.members[j].term {
          Some(other) => other,
          None => continue,
        };
        if std::ptr::eq(term, other) {
          continue;
        }
        if unsafe { &mut *term }.is_subsumed(other, engine)? == SubsumptionResult::Yes {
          self.members[i].valid = false;
          break;
        }
      }
    }
    Ok(())
  }
}

impl Term {
  pub fn as_fixpoint(&self) -> Option<&FixpointTerm> {
    match &self.kind {
      TermKind::Fixpoint(fixpoint) => Some(fixpoint),
      _ => None,
    }
  }

  pub fn as_fixpoint_mut(&mut self) -> Option<&mut FixpointTerm> {
    match &mut self.kind {
      TermKind::Fixpoint(fixpoint) => Some(fixpoint),
      _ => None,
    }
  }
}

/// An iterator into a fixpoint's member list. Holds a stable position (members are append-only
/// while any iterator is live) and drives the fixpoint computation when it runs out of already
/// discovered members. Iterators are shared, reference-counted objects: a Pre-mode fixpoint
/// holds one into its source, and consumers may hold the same iterator.
pub struct FixpointIterator {
  fixpoint:  TermPtr,
  position:  usize,
  exhausted: bool,
}

impl FixpointIterator {
  pub fn new(fixpoint: TermPtr) -> RcCell<FixpointIterator> {
    let fixpoint_ref = FixpointIterator::fixpoint_mut(fixpoint);
    fixpoint_ref.iterator_count += 1;
    rc_cell(FixpointIterator {
      fixpoint,
      position: 0,
      exhausted: false,
    })
  }

  fn fixpoint_mut(term: TermPtr) -> &'static mut FixpointTerm {
    assert!(!term.is_null(), "fixpoint iterator over a null term");
    match unsafe { &mut (*term).kind } {
      TermKind::Fixpoint(fixpoint) => fixpoint,
      _ => panic!("fixpoint iterator over a non-fixpoint term"),
    }
  }

  pub fn is_exhausted(&self) -> bool {
    self.exhausted
  }

  /// Delivers the next valid member, driving the fixpoint computation as needed. Returns
  /// `Ok(None)` once all members are delivered and no work remains; after that the iterator
  /// stays exhausted.
  pub fn next(&mut self) -> Result<Option<TermPtr>, EngineError> {
    if self.exhausted {
      return Ok(None);
    }
    let fixpoint = FixpointIterator::fixpoint_mut(self.fixpoint);

    loop {
      // Deliver members we have not visited yet, skipping invalidated entries and the sentinel.
      if self.position + 1 < fixpoint.members.len() {
        self.position += 1;
        let member = &fixpoint.members[self.position];
        if member.valid {
          if let Some(term) = member.term {
            return Ok(Some(term));
          }
        }
        continue;
      }

      // At the end of the member list: refine the fixpoint or finish.
      match fixpoint.semantics() {
        FixpointSemantics::Fixpoint => {
          if !fixpoint.worklist.is_empty() {
            fixpoint.compute_next_fixpoint()?;
            continue;
          }
          if !fixpoint.postponed.is_empty() && fixpoint.process_one_postponed()? {
            continue;
          }
          return self.finish(fixpoint);
        }

        FixpointSemantics::Pre => {
          if !fixpoint.worklist.is_empty() {
            fixpoint.compute_next_pre()?;
            continue;
          }
          if !fixpoint.source_exhausted {
            let source_iter = fixpoint
              .source_iter
              .clone()
              .expect("pre-mode fixpoint without a source iterator");
            let pulled = source_iter.borrow_mut().next()?;
            match pulled {
              Some(term) => {
                let symbols = fixpoint.symbols.clone();
                for symbol in symbols {
                  fixpoint.push_work((term, symbol));
                }
              }
              None => {
                fixpoint.source_exhausted = true;
              }
            }
            continue;
          }
          if !fixpoint.postponed.is_empty() && fixpoint.process_one_postponed()? {
            continue;
          }
          return self.finish(fixpoint);
        }
      }
    }
  }

  fn finish(&mut self, fixpoint: &mut FixpointTerm) -> Result<Option<TermPtr>, EngineError> {
    self.exhausted = true;
    fixpoint.iterator_count = fixpoint.iterator_count.saturating_sub(1);

    let engine = unsafe { &mut *fixpoint.engine };
    if engine.options.reduce_fixpoint_everytime {
      fixpoint.remove_subsumed()?;
    }
    Ok(None)
  }
}

#[cfg(test)]
mod tests {
  use super::{FixpointIterator, FixpointSemantics, SearchPolicy};
  use crate::{
    abstractions::HashMap,
    api::{
      automaton::{AutomatonPtr, SymbolicAutomaton},
      symbol::SymbolPtr,
      term::{term_id, TermKind, TermPtr},
      BaseState,
      ResultType,
    },
    core::{
      engine::{Engine, EngineOptions, EnginePtr},
      error::EngineError,
    },
  };

  /// Successor automaton over base sets: the image of `{s₁,…,sₙ}` adds `max+1` up to a cap.
  /// The epsilon check reports whether the image contains the final state.
  struct ChainAutomaton {
    engine: EnginePtr,
    cap:    BaseState,
    final_state: BaseState,
  }

  impl SymbolicAutomaton for ChainAutomaton {
    fn intersect_non_empty(
      &mut self,
      _symbol: SymbolPtr,
      term: TermPtr,
      _under_complement: bool,
    ) -> Result<ResultType, EngineError> {
      let engine = unsafe { &mut *self.engine };
      let mut states: Vec<BaseState> = match unsafe { &(*term).kind } {
        TermKind::BaseSet(base) => base.states.clone(),
        _ => panic!("chain automaton expects base-set terms"),
      };
      let max = *states.last().expect("chain automaton expects nonempty base sets");
      if max < self.cap {
        states.push(max + 1);
      }
      let result = engine.terms.create_base_set(&states);
      let value = states.contains(&self.final_state);
      Ok((result, value))
    }
  }

  /// Predecessor automaton: drops the largest state (keeping sets nonempty).
  struct DropMaxAutomaton {
    engine: EnginePtr,
  }

  impl SymbolicAutomaton for DropMaxAutomaton {
    fn intersect_non_empty(
      &mut self,
      _symbol: SymbolPtr,
      term: TermPtr,
      _under_complement: bool,
    ) -> Result<ResultType, EngineError> {
      let engine = unsafe { &mut *self.engine };
      let mut states: Vec<BaseState> = match unsafe { &(*term).kind } {
        TermKind::BaseSet(base) => base.states.clone(),
        _ => panic!("drop-max automaton expects base-set terms"),
      };
      if states.len() > 1 {
        states.pop();
      }
      let result = engine.terms.create_base_set(&states);
      let value = states.contains(&1);
      Ok((result, value))
    }
  }

  /// Replays a fixed mapping from input term to result.
  struct ScriptedAutomaton {
    script: HashMap<usize, ResultType>,
  }

  impl SymbolicAutomaton for ScriptedAutomaton {
    fn intersect_non_empty(
      &mut self,
      _symbol: SymbolPtr,
      term: TermPtr,
      _under_complement: bool,
    ) -> Result<ResultType, EngineError> {
      Ok(*self.script.get(&term_id(term)).expect("unscripted term"))
    }
  }

  /// Reduces everything to the empty term with a false epsilon check.
  struct VoidAutomaton {
    engine: EnginePtr,
  }

  impl SymbolicAutomaton for VoidAutomaton {
    fn intersect_non_empty(
      &mut self,
      _symbol: SymbolPtr,
      _term: TermPtr,
      _under_complement: bool,
    ) -> Result<ResultType, EngineError> {
      let engine = unsafe { &mut *self.engine };
      Ok((engine.terms.empty_term(), false))
    }
  }

  fn drive_to_end(iterator: &crate::abstractions::RcCell<FixpointIterator>) -> Vec<TermPtr> {
    let mut delivered = Vec::new();
    loop {
      match iterator.borrow_mut().next().unwrap() {
        Some(term) => delivered.push(term),
        None => return delivered,
      }
    }
  }

  #[test]
  fn fixpoint_grows_to_closure_and_aggregates() {
    let mut engine = Engine::new(1);
    let mut automaton = ChainAutomaton { engine: engine.ptr(), cap: 3, final_state: 3 };
    let automaton_ptr: AutomatonPtr = &mut automaton;

    let seed = engine.terms.create_base_set(&[1]);
    let zero = engine.symbols.zero_symbol();
    let fixpoint = engine.terms.create_fixpoint(
      automaton_ptr,
      seed,
      vec![zero],
      false,
      false,
      SearchPolicy::DepthFirst,
    );

    let iterator = FixpointIterator::new(fixpoint);
    let delivered = drive_to_end(&iterator);
    assert!(iterator.borrow().is_exhausted());

    let expected: Vec<TermPtr> = vec![
      seed,
      engine.terms.create_base_set(&[1, 2]),
      engine.terms.create_base_set(&[1, 2, 3]),
    ];
    assert_eq!(delivered, expected);

    // Each admitted member links back to the term and symbol it was computed from.
    let link = unsafe { &*expected[1] }.link;
    assert_eq!(link.successor, Some(seed));
    assert_eq!(link.symbol, Some(zero));
    assert_eq!(link.length, 1);

    let fixpoint_ref = unsafe { &*fixpoint }.as_fixpoint().unwrap();
    assert_eq!(fixpoint_ref.semantics(), FixpointSemantics::Fixpoint);
    assert!(fixpoint_ref.is_fully_computed());
    assert!(fixpoint_ref.result()); // {1,2,3} contains the final state
    assert_eq!(fixpoint_ref.iterator_count(), 0);

    // The sat example is the first member with a true epsilon value.
    let (sat, unsat) = fixpoint_ref.fixpoint_examples();
    assert_eq!(sat, Some(expected[2]));
    assert_eq!(unsat, Some(expected[1]));
  }

  #[test]
  fn closed_fixpoint_is_a_no_op_for_later_iterators() {
    let mut engine = Engine::new(1);
    let mut automaton = ChainAutomaton { engine: engine.ptr(), cap: 3, final_state: 3 };
    let automaton_ptr: AutomatonPtr = &mut automaton;

    let seed = engine.terms.create_base_set(&[1]);
    let zero = engine.symbols.zero_symbol();
    let fixpoint = engine.terms.create_fixpoint(
      automaton_ptr,
      seed,
      vec![zero],
      false,
      false,
      SearchPolicy::BreadthFirst,
    );

    let first = drive_to_end(&FixpointIterator::new(fixpoint));
    let members_after = unsafe { &*fixpoint }.as_fixpoint().unwrap().members().len();
    let value_after = unsafe { &*fixpoint }.as_fixpoint().unwrap().result();

    // A second pass delivers the same sequence without admitting anything new.
    let second = drive_to_end(&FixpointIterator::new(fixpoint));
    assert_eq!(first, second);
    let fixpoint_ref = unsafe { &*fixpoint }.as_fixpoint().unwrap();
    assert_eq!(fixpoint_ref.members().len(), members_after);
    assert_eq!(fixpoint_ref.result(), value_after);
  }

  // Seed {1}, one symbol, successor {1,2}: after one advance the members are {1} and {1,2};
  // remove_subsumed leaves only {1,2} and the aggregated value is unchanged.
  #[test]
  fn remove_subsumed_flags_covered_members() {
    let mut engine = Engine::new(1);
    let mut automaton = ChainAutomaton { engine: engine.ptr(), cap: 2, final_state: 9 };
    let automaton_ptr: AutomatonPtr = &mut automaton;

    let seed = engine.terms.create_base_set(&[1]);
    let grown = engine.terms.create_base_set(&[1, 2]);
    let zero = engine.symbols.zero_symbol();
    let fixpoint = engine.terms.create_fixpoint(
      automaton_ptr,
      seed,
      vec![zero],
      false,
      false,
      SearchPolicy::DepthFirst,
    );

    let fixpoint_ref = unsafe { &mut *fixpoint }.as_fixpoint_mut().unwrap();
    fixpoint_ref.compute_next_fixpoint().unwrap();
    assert_eq!(fixpoint_ref.valid_members(), vec![seed, grown]);

    let value_before = fixpoint_ref.result();
    fixpoint_ref.remove_subsumed().unwrap();
    assert_eq!(fixpoint_ref.valid_members(), vec![grown]);
    assert_eq!(fixpoint_ref.result(), value_before);
    // Entries are flagged, never removed.
    assert_eq!(fixpoint_ref.members().len(), 3);
  }

  #[test]
  fn prune_option_shrinks_the_fixpoint_during_advance() {
    let options = EngineOptions {
      prune_fixpoint: true,
      ..EngineOptions::default()
    };
    let mut engine = Engine::with_options(1, options);
    let mut automaton = ChainAutomaton { engine: engine.ptr(), cap: 2, final_state: 9 };
    let automaton_ptr: AutomatonPtr = &mut automaton;

    let seed = engine.terms.create_base_set(&[1]);
    let grown = engine.terms.create_base_set(&[1, 2]);
    let zero = engine.symbols.zero_symbol();
    let fixpoint = engine.terms.create_fixpoint(
      automaton_ptr,
      seed,
      vec![zero],
      false,
      false,
      SearchPolicy::DepthFirst,
    );

    let fixpoint_ref = unsafe { &mut *fixpoint }.as_fixpoint_mut().unwrap();
    fixpoint_ref.compute_next_fixpoint().unwrap();

    // The admitted {1,2} subsumes the seed {1}, which is invalidated on the spot.
    assert_eq!(fixpoint_ref.valid_members(), vec![grown]);
    assert!(engine.statistics.subsumption.pruned_members >= 1);
  }

  #[test]
  fn draining_fixpoint_admits_no_empty_members() {
    let mut engine = Engine::new(1);
    let mut automaton = VoidAutomaton { engine: engine.ptr() };
    let automaton_ptr: AutomatonPtr = &mut automaton;

    let empty = engine.terms.empty_term();
    let zero = engine.symbols.zero_symbol();
    let fixpoint = engine.terms.create_fixpoint(
      automaton_ptr,
      empty,
      vec![zero],
      false,
      false,
      SearchPolicy::DepthFirst,
    );

    let delivered = drive_to_end(&FixpointIterator::new(fixpoint));
    assert_eq!(delivered, vec![empty]);

    let fixpoint_ref = unsafe { &*fixpoint }.as_fixpoint().unwrap();
    assert!(!fixpoint_ref.result());
    assert!(fixpoint_ref.is_fully_computed());
    // Only the seeded member; every computed image was subsumed.
    assert_eq!(fixpoint_ref.valid_members(), vec![empty]);
  }

  #[test]
  fn pre_semantics_pull_from_the_source_fixpoint() {
    let mut engine = Engine::new(1);
    let mut chain = ChainAutomaton { engine: engine.ptr(), cap: 3, final_state: 3 };
    let chain_ptr: AutomatonPtr = &mut chain;
    let mut drop_max = DropMaxAutomaton { engine: engine.ptr() };
    let drop_max_ptr: AutomatonPtr = &mut drop_max;

    let seed = engine.terms.create_base_set(&[1]);
    let zero = engine.symbols.zero_symbol();
    let source = engine.terms.create_fixpoint(
      chain_ptr,
      seed,
      vec![zero],
      false,
      false,
      SearchPolicy::DepthFirst,
    );
    // Close the source first; Pre also works against a source still being computed, but the
    // expected member list is easier to state against a closed one.
    drive_to_end(&FixpointIterator::new(source));

    let pre = engine.terms.create_fixpoint_pre(drop_max_ptr, source, vec![zero], false);
    assert_eq!(unsafe { &*pre }.as_fixpoint().unwrap().semantics(), FixpointSemantics::Pre);

    let delivered = drive_to_end(&FixpointIterator::new(pre));
    // Pre-images of {1}, {1,2}, {1,2,3} are {1}, {1}, {1,2}; the second is subsumed.
    let expected = vec![seed, engine.terms.create_base_set(&[1, 2])];
    assert_eq!(delivered, expected);

    let pre_ref = unsafe { &*pre }.as_fixpoint().unwrap();
    assert!(pre_ref.is_fully_computed());
    assert!(pre_ref.result()); // every pre-image contains state 1
  }

  // A result whose subsumption status cannot be decided yet (it compares against a fixpoint
  // member that is still being computed) is postponed, and resolves once the member closes.
  #[test]
  fn undecidable_results_are_postponed_and_resolved() {
    let mut engine = Engine::new(1);
    let mut chain = ChainAutomaton { engine: engine.ptr(), cap: 3, final_state: 3 };
    let chain_ptr: AutomatonPtr = &mut chain;

    let zero = engine.symbols.zero_symbol();

    // `partial` is an unfinished fixpoint: worklist still loaded.
    let partial_seed = engine.terms.create_base_set(&[1, 2]);
    let partial = engine.terms.create_fixpoint(
      chain_ptr,
      partial_seed,
      vec![zero],
      false,
      false,
      SearchPolicy::DepthFirst,
    );

    // `closed` is a finished fixpoint whose single member is {1,2,3}.
    let closed_seed = engine.terms.create_base_set(&[1, 2, 3]);
    let closed = engine.terms.create_fixpoint(
      chain_ptr,
      closed_seed,
      vec![zero],
      false,
      false,
      SearchPolicy::DepthFirst,
    );
    drive_to_end(&FixpointIterator::new(closed));

    // The outer fixpoint maps `partial` to `closed`.
    let mut scripted = ScriptedAutomaton { script: HashMap::default() };
    scripted.script.insert(term_id(partial), (closed, false));
    let scripted_ptr: AutomatonPtr = &mut scripted;

    let outer = engine.terms.create_fixpoint(
      scripted_ptr,
      partial,
      vec![zero],
      false,
      false,
      SearchPolicy::DepthFirst,
    );

    let outer_ref = unsafe { &mut *outer }.as_fixpoint_mut().unwrap();
    outer_ref.compute_next_fixpoint().unwrap();

    // `closed ⊑ partial` is Unknown while `partial` can still grow.
    assert_eq!(outer_ref.valid_members(), vec![partial]);
    assert_eq!(engine.statistics.postponed.admitted, 1);
    assert!(!outer_ref.is_fully_computed());

    // Close `partial`: its members become {1,2} and {1,2,3}.
    drive_to_end(&FixpointIterator::new(partial));

    // Now the postponed item resolves: `closed ⊑ partial` holds, the result is discarded.
    assert!(outer_ref.process_one_postponed().unwrap());
    assert_eq!(outer_ref.valid_members(), vec![partial]);
    assert_eq!(engine.statistics.postponed.processed, 1);
    assert!(outer_ref.is_fully_computed());
  }

  // Under complement the aggregator is AND: one failing epsilon check pins the value at false,
  // the way a counter-example search exhausts with the value stuck.
  #[test]
  fn and_aggregation_under_complement() {
    let mut engine = Engine::new(1);
    let mut automaton = ChainAutomaton { engine: engine.ptr(), cap: 3, final_state: 1 };
    let automaton_ptr: AutomatonPtr = &mut automaton;

    let seed = engine.terms.create_base_set(&[2]);
    let zero = engine.symbols.zero_symbol();
    let fixpoint = engine.terms.create_fixpoint(
      automaton_ptr,
      seed,
      vec![zero],
      true,
      true,
      SearchPolicy::DepthFirst,
    );

    assert!(unsafe { &*fixpoint }.as_fixpoint().unwrap().result());
    drive_to_end(&FixpointIterator::new(fixpoint));

    // No successor of {2} ever contains the final state 1, so the AND collapses to false and
    // stays there.
    let fixpoint_ref = unsafe { &*fixpoint }.as_fixpoint().unwrap();
    assert!(!fixpoint_ref.result());
    assert!(fixpoint_ref.is_fully_computed());
    let (sat, unsat) = fixpoint_ref.fixpoint_examples();
    assert!(sat.is_none());
    assert!(unsat.is_some());
  }

  #[test]
  fn members_only_grow_and_b_value_is_monotone() {
    let mut engine = Engine::new(1);
    let mut automaton = ChainAutomaton { engine: engine.ptr(), cap: 4, final_state: 3 };
    let automaton_ptr: AutomatonPtr = &mut automaton;

    let seed = engine.terms.create_base_set(&[1]);
    let zero = engine.symbols.zero_symbol();
    let fixpoint = engine.terms.create_fixpoint(
      automaton_ptr,
      seed,
      vec![zero],
      false,
      false,
      SearchPolicy::DepthFirst,
    );

    let iterator = FixpointIterator::new(fixpoint);
    let mut last_len = 0;
    let mut was_true = false;
    loop {
      let done = iterator.borrow_mut().next().unwrap().is_none();
      let fixpoint_ref = unsafe { &*fixpoint }.as_fixpoint().unwrap();
      assert!(fixpoint_ref.members().len() >= last_len);
      last_len = fixpoint_ref.members().len();
      // Under OR-aggregation the value never falls back to false.
      if was_true {
        assert!(fixpoint_ref.result());
      }
      was_true = fixpoint_ref.result();
      if done {
        break;
      }
    }
    assert!(was_true);
  }
}
