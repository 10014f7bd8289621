/*!

Workshops are hash-consing factories: they encapsulate the creation of terms and symbols, and
they guarantee that structurally equal objects share one canonical instance. Canonicality is
what makes the rest of the engine cheap: pointer comparison doubles as semantic equality, and
every cache in the engine can key by address.

The `TermWorkshop` keeps one keyed cache per mintable variant:

| Variant      | Key                                     |
|:-------------|:----------------------------------------|
| BaseSet      | sorted state vector                     |
| Product      | `(left, right, kind)`                   |
| List         | head term                               |
| Continuation | `(automaton, term, symbol)`             |
| Fixpoint     | delayed, by (member set, worklist set)  |

Fixpoints cannot be uniqued at creation because their identity depends on content that is
computed incrementally; they are registered through `get_unique_fixpoint` after their first
iteration stabilizes, and merged with a structurally equal fixpoint if one exists.

Both workshops own every object they ever minted and reclaim them at drop, so all handles they
give out stay valid for the lifetime of the decision run.

*/

use std::{
  collections::hash_map::DefaultHasher,
  hash::{Hash, Hasher}
};

use crate::{
  abstractions::{HashMap, NatSet},
  api::{
    automaton::{automaton_id, AutomatonPtr},
    symbol::{Symbol, SymbolPtr, TrackValue},
    term::{
      continuation::ContinuationTerm,
      fixpoint::{FixpointTerm, SearchPolicy},
      term_id,
      BaseSetTerm,
      ListTerm,
      ProductKind,
      ProductTerm,
      Term,
      TermAttribute,
      TermKind,
      TermPtr,
    },
    BaseState,
  },
  core::{engine::EnginePtr, statistics::EngineStatistics},
  heap_construct,
  heap_destroy,
};

pub struct TermWorkshop {
  engine: EnginePtr,

  /// The unique empty term of this engine instance.
  empty: TermPtr,

  base_cache:         HashMap<Vec<BaseState>, TermPtr>,
  product_cache:      HashMap<(usize, usize, ProductKind), TermPtr>,
  list_cache:         HashMap<usize, TermPtr>,
  continuation_cache: HashMap<(usize, usize, usize), TermPtr>,
  /// Buckets of stabilized fixpoints by content signature; collisions resolved structurally.
  fixpoint_cache:     HashMap<u64, Vec<TermPtr>>,

  /// Owner of record for every minted term.
  all_terms: Vec<TermPtr>,
}

impl TermWorkshop {
  pub(crate) fn new() -> TermWorkshop {
    TermWorkshop {
      engine:             std::ptr::null_mut(),
      empty:              std::ptr::null_mut(),
      base_cache:         HashMap::default(),
      product_cache:      HashMap::default(),
      list_cache:         HashMap::default(),
      continuation_cache: HashMap::default(),
      fixpoint_cache:     HashMap::default(),
      all_terms:          Vec::new(),
    }
  }

  /// Late initialization: ties the workshop to its engine and mints the unique empty term.
  /// Separate from `new` because the engine owns the workshop and its address is only stable
  /// once it is boxed.
  pub(crate) fn attach(&mut self, engine: EnginePtr) {
    assert!(self.engine.is_null(), "term workshop attached twice");
    assert!(!engine.is_null(), "term workshop attached to a null engine");
    self.engine = engine;
    self.empty = self.mint(Term::new(TermKind::Empty, 0, 0));
    self.statistics().instances.record_empty();
  }

  fn statistics(&mut self) -> &mut EngineStatistics {
    debug_assert!(!self.engine.is_null(), "term workshop used before attachment");
    unsafe { &mut (*self.engine).statistics }
  }

  fn mint(&mut self, term: Term) -> TermPtr {
    let ptr = heap_construct!(term);
    self.all_terms.push(ptr);
    ptr
  }

  /// The unique empty term (the universe when complemented).
  pub fn empty_term(&self) -> TermPtr {
    assert!(!self.empty.is_null(), "term workshop used before attachment");
    self.empty
  }

  pub fn create_base_set(&mut self, states: &[BaseState]) -> TermPtr {
    let mut key: Vec<BaseState> = states.to_vec();
    key.sort_unstable();
    key.dedup();

    if let Some(&existing) = self.base_cache.get(&key) {
      return existing;
    }

    let mask: NatSet = key.iter().copied().collect();
    let size = key.len() as u32;
    let ptr = self.mint(Term::new(
      TermKind::BaseSet(BaseSetTerm { states: key.clone(), mask }),
      size,
      size,
    ));
    self.base_cache.insert(key, ptr);
    self.statistics().instances.record_base_set();
    ptr
  }

  pub fn create_product(&mut self, left: TermPtr, right: TermPtr, kind: ProductKind) -> TermPtr {
    let key = (term_id(left), term_id(right), kind);
    if let Some(&existing) = self.product_cache.get(&key) {
      return existing;
    }

    let left_ref  = unsafe { &*left };
    let right_ref = unsafe { &*right };
    // The exact measure is only known when both children know theirs.
    let state_space = if left_ref.state_space != 0 && right_ref.state_space != 0 {
      left_ref.state_space + right_ref.state_space + 1
    } else {
      0
    };
    let approx = left_ref.state_space_approx + right_ref.state_space_approx + 1;

    let ptr = self.mint(Term::new(
      TermKind::Product(ProductTerm { left, right, kind }),
      state_space,
      approx,
    ));
    self.product_cache.insert(key, ptr);
    self.statistics().instances.record_product();
    ptr
  }

  /// Lists extend by prepending canonicalized heads, so the head term keys the cache.
  pub fn create_list(&mut self, head: TermPtr, under_complement: bool) -> TermPtr {
    let key = term_id(head);
    if let Some(&existing) = self.list_cache.get(&key) {
      return existing;
    }

    let head_ref = unsafe { &*head };
    let state_space = if head_ref.state_space != 0 { head_ref.state_space + 1 } else { 0 };

    let mut term = Term::new(
      TermKind::List(ListTerm { items: vec![head] }),
      state_space,
      head_ref.state_space_approx,
    );
    if under_complement {
      term.attributes.insert(TermAttribute::NonMembershipTesting);
    }

    let ptr = self.mint(term);
    self.list_cache.insert(key, ptr);
    self.statistics().instances.record_list();
    ptr
  }

  pub fn create_continuation(
    &mut self,
    aut: AutomatonPtr,
    term: TermPtr,
    symbol: SymbolPtr,
    under_complement: bool,
  ) -> TermPtr {
    let key = (automaton_id(aut), term_id(term), symbol as usize);
    if let Some(&existing) = self.continuation_cache.get(&key) {
      return existing;
    }

    let mut continuation = Term::new(
      TermKind::Continuation(ContinuationTerm {
        aut,
        term,
        symbol,
        under_complement,
        unfolded: None,
      }),
      1,
      1,
    );
    if under_complement {
      continuation.attributes.insert(TermAttribute::NonMembershipTesting);
    }

    let ptr = self.mint(continuation);
    self.continuation_cache.insert(key, ptr);
    self.statistics().instances.record_continuation();
    ptr
  }

  /// Creates a fixpoint seeded with `start`, closing under `symbols`. Not uniqued at creation;
  /// see `get_unique_fixpoint`.
  pub fn create_fixpoint(
    &mut self,
    aut: AutomatonPtr,
    start: TermPtr,
    symbols: Vec<SymbolPtr>,
    under_complement: bool,
    initial_value: bool,
    search: SearchPolicy,
  ) -> TermPtr {
    let approx = unsafe { &*start }.state_space_approx;
    let fixpoint = FixpointTerm::new_fixpoint(
      self.engine,
      aut,
      start,
      symbols,
      under_complement,
      initial_value,
      search,
    );

    let mut term = Term::new(TermKind::Fixpoint(fixpoint), 0, approx);
    if under_complement {
      term.attributes.insert(TermAttribute::NonMembershipTesting);
    }

    let ptr = self.mint(term);
    self.statistics().instances.record_fixpoint();
    ptr
  }

  /// Creates a Pre-semantics fixpoint computing the pre-image of `source`, an existing fixpoint
  /// term, pulled lazily through a shared iterator.
  pub fn create_fixpoint_pre(
    &mut self,
    aut: AutomatonPtr,
    source: TermPtr,
    symbols: Vec<SymbolPtr>,
    under_complement: bool,
  ) -> TermPtr {
    assert!(
      unsafe { &*source }.as_fixpoint().is_some(),
      "pre-semantics fixpoint requires a fixpoint source term"
    );
    let approx = unsafe { &*source }.state_space_approx;
    let search = unsafe { &*self.engine }.options.worklist_search;
    let fixpoint =
      FixpointTerm::new_pre(self.engine, aut, source, symbols, under_complement, search);

    let mut term = Term::new(TermKind::Fixpoint(fixpoint), 0, approx);
    if under_complement {
      term.attributes.insert(TermAttribute::NonMembershipTesting);
    }

    let ptr = self.mint(term);
    self.statistics().instances.record_fixpoint_pre();
    ptr
  }

  /// Delayed uniquing for fixpoints: once a fixpoint's first iteration has stabilized, merges it
  /// with a registered fixpoint of equal content if one exists, registering it otherwise. Keyed
  /// by a signature over the member and worklist sets, with structural equality as the collision
  /// check.
  pub fn get_unique_fixpoint(&mut self, candidate: TermPtr) -> TermPtr {
    let signature = {
      let fixpoint = unsafe { &*candidate }
        .as_fixpoint()
        .expect("uniquing a non-fixpoint term");
      fixpoint_signature(fixpoint)
    };

    let measures = unsafe { &mut (*self.engine).statistics.comparisons };
    let bucket = self.fixpoint_cache.entry(signature).or_default();
    for &existing in bucket.iter() {
      if unsafe { &*existing }.equals(candidate, measures) {
        return existing;
      }
    }
    bucket.push(candidate);
    candidate
  }
}

impl Drop for TermWorkshop {
  fn drop(&mut self) {
    for &term in self.all_terms.iter() {
      heap_destroy!(term);
    }
  }
}

/// Order-independent signature of a fixpoint's current member and worklist sets.
fn fixpoint_signature(fixpoint: &FixpointTerm) -> u64 {
  let mut hasher = DefaultHasher::new();

  let mut member_ids: Vec<usize> =
    fixpoint.valid_members().iter().map(|&member| term_id(member)).collect();
  member_ids.sort_unstable();
  member_ids.hash(&mut hasher);

  let mut work_ids: Vec<(usize, usize)> = fixpoint
    .worklist
    .iter()
    .map(|&(term, symbol)| (term_id(term), symbol as usize))
    .collect();
  work_ids.sort_unstable();
  work_ids.hash(&mut hasher);

  hasher.finish()
}

pub struct SymbolWorkshop {
  track_count: usize,

  /// The distinguished all-don't-care symbol, globally shared within the run.
  zero: SymbolPtr,

  symbol_cache:     HashMap<Vec<TrackValue>, SymbolPtr>,
  /// Projection/assignment results keyed by `(symbol, track, value)` identity.
  projection_cache: HashMap<(usize, usize, TrackValue), SymbolPtr>,

  all_symbols: Vec<SymbolPtr>,
}

impl SymbolWorkshop {
  pub(crate) fn new(track_count: usize) -> SymbolWorkshop {
    let mut workshop = SymbolWorkshop {
      track_count,
      zero:             std::ptr::null_mut(),
      symbol_cache:     HashMap::default(),
      projection_cache: HashMap::default(),
      all_symbols:      Vec::new(),
    };
    workshop.zero = workshop.create_symbol(&vec![TrackValue::DontCare; track_count]);
    workshop
  }

  #[inline(always)]
  pub fn track_count(&self) -> usize {
    self.track_count
  }

  pub fn zero_symbol(&self) -> SymbolPtr {
    self.zero
  }

  pub fn create_symbol(&mut self, tracks: &[TrackValue]) -> SymbolPtr {
    assert_eq!(tracks.len(), self.track_count, "symbol with a wrong track count");
    if let Some(&existing) = self.symbol_cache.get(tracks) {
      return existing;
    }

    let key = tracks.to_vec();
    let ptr = heap_construct!(Symbol::new(key.clone()));
    self.symbol_cache.insert(key, ptr);
    self.all_symbols.push(ptr);
    ptr
  }

  /// The symbol equal to `symbol` with `track` assigned to `value`.
  pub fn create_with_value(
    &mut self,
    symbol: SymbolPtr,
    track: usize,
    value: TrackValue,
  ) -> SymbolPtr {
    assert!(track < self.track_count, "track index out of range");
    let key = (symbol as usize, track, value);
    if let Some(&existing) = self.projection_cache.get(&key) {
      return existing;
    }

    let mut tracks = unsafe { &*symbol }.tracks().to_vec();
    tracks[track] = value;
    let result = self.create_symbol(&tracks);
    self.projection_cache.insert(key, result);
    result
  }

  /// Projects `track` out of `symbol`, replacing it with don't-care.
  pub fn create_projected(&mut self, symbol: SymbolPtr, track: usize) -> SymbolPtr {
    self.create_with_value(symbol, track, TrackValue::DontCare)
  }

  /// Restricts `symbol` to the listed tracks, blanking all others to don't-care.
  pub fn create_restricted(&mut self, symbol: SymbolPtr, vars: &[usize]) -> SymbolPtr {
    let source = unsafe { &*symbol };
    let mut tracks = vec![TrackValue::DontCare; self.track_count];
    for &var in vars {
      tracks[var] = source.track(var);
    }
    self.create_symbol(&tracks)
  }
}

impl Drop for SymbolWorkshop {
  fn drop(&mut self) {
    for &symbol in self.all_symbols.iter() {
      heap_destroy!(symbol);
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::{
    api::{
      automaton::{AutomatonPtr, SymbolicAutomaton},
      symbol::{SymbolPtr, TrackValue},
      term::{fixpoint::FixpointIterator, ProductKind, TermKind, TermPtr},
      BaseState,
      ResultType,
    },
    core::{
      engine::{Engine, EnginePtr},
      error::EngineError,
    },
  };

  #[test]
  fn base_sets_are_canonical() {
    let mut engine = Engine::new(1);
    let first  = engine.terms.create_base_set(&[3, 1, 2]);
    let second = engine.terms.create_base_set(&[1, 2, 3]);
    let third  = engine.terms.create_base_set(&[2, 1, 3, 2]);

    assert!(std::ptr::eq(first, second));
    assert!(std::ptr::eq(first, third));
    match unsafe { &(*first).kind } {
      TermKind::BaseSet(base) => assert_eq!(base.states, vec![1, 2, 3]),
      _ => unreachable!(),
    }
    assert_eq!(engine.statistics.instances.base_set, 1);
  }

  #[test]
  fn products_and_lists_are_canonical() {
    let mut engine = Engine::new(1);
    let left  = engine.terms.create_base_set(&[1]);
    let right = engine.terms.create_base_set(&[2]);

    let product = engine.terms.create_product(left, right, ProductKind::Intersection);
    assert!(std::ptr::eq(
      product,
      engine.terms.create_product(left, right, ProductKind::Intersection)
    ));
    // A different kind is a different term.
    assert!(!std::ptr::eq(
      product,
      engine.terms.create_product(left, right, ProductKind::Union)
    ));

    let list = engine.terms.create_list(left, false);
    assert!(std::ptr::eq(list, engine.terms.create_list(left, false)));
    assert!(!std::ptr::eq(list, engine.terms.create_list(right, false)));
  }

  #[test]
  fn continuations_are_canonical_per_automaton_term_and_symbol() {
    let mut engine = Engine::new(1);
    let mut automaton = NoopAutomaton;
    let automaton_ptr: AutomatonPtr = &mut automaton;

    let term = engine.terms.create_base_set(&[1]);
    let zero = engine.symbols.zero_symbol();
    let one  = engine.symbols.create_with_value(zero, 0, TrackValue::One);

    let continuation = engine.terms.create_continuation(automaton_ptr, term, zero, false);
    assert!(std::ptr::eq(
      continuation,
      engine.terms.create_continuation(automaton_ptr, term, zero, false)
    ));
    assert!(!std::ptr::eq(
      continuation,
      engine.terms.create_continuation(automaton_ptr, term, one, false)
    ));
  }

  #[test]
  fn symbols_intern_and_share_the_zero_symbol() {
    let mut engine = Engine::new(3);
    let zero = engine.symbols.zero_symbol();
    assert!(unsafe { &*zero }.is_zero());

    let dont_care = vec![TrackValue::DontCare; 3];
    assert!(std::ptr::eq(zero, engine.symbols.create_symbol(&dont_care)));

    let projected = engine.symbols.create_with_value(zero, 1, TrackValue::One);
    assert_eq!(unsafe { &*projected }.to_string(), "X1X");
    assert!(std::ptr::eq(
      projected,
      engine.symbols.create_with_value(zero, 1, TrackValue::One)
    ));

    // Projecting the assigned track out gives the zero symbol back.
    assert!(std::ptr::eq(zero, engine.symbols.create_projected(projected, 1)));

    // Restriction keeps the listed tracks only.
    let assigned = engine.symbols.create_symbol(&[TrackValue::One, TrackValue::Zero, TrackValue::One]);
    let restricted = engine.symbols.create_restricted(assigned, &[0, 2]);
    assert_eq!(unsafe { &*restricted }.to_string(), "1X1");
  }

  #[test]
  fn stabilized_fixpoints_merge_through_delayed_uniquing() {
    let mut engine = Engine::new(1);
    let mut automaton = SuccessorAutomaton { engine: engine.ptr(), cap: 2 };
    let automaton_ptr: AutomatonPtr = &mut automaton;

    let seed = engine.terms.create_base_set(&[1]);
    let zero = engine.symbols.zero_symbol();

    let first = engine.terms.create_fixpoint(
      automaton_ptr,
      seed,
      vec![zero],
      false,
      false,
      crate::DEFAULT_WORKLIST_SEARCH,
    );
    let second = engine.terms.create_fixpoint(
      automaton_ptr,
      seed,
      vec![zero],
      false,
      false,
      crate::DEFAULT_WORKLIST_SEARCH,
    );
    assert!(!std::ptr::eq(first, second));

    // Drive both to closure; they stabilize on the same member set.
    for fixpoint in [first, second] {
      let iterator = FixpointIterator::new(fixpoint);
      while iterator.borrow_mut().next().unwrap().is_some() {}
    }

    // Admissions set the update flag; uniquing consumers read and clear it.
    let first_fixpoint = unsafe { &mut *first }.as_fixpoint_mut().unwrap();
    assert!(first_fixpoint.test_and_set_update());
    assert!(!first_fixpoint.test_and_set_update());

    assert!(std::ptr::eq(first, engine.terms.get_unique_fixpoint(first)));
    assert!(std::ptr::eq(first, engine.terms.get_unique_fixpoint(second)));
  }

  struct NoopAutomaton;

  impl SymbolicAutomaton for NoopAutomaton {
    fn intersect_non_empty(
      &mut self,
      _symbol: SymbolPtr,
      term: TermPtr,
      _under_complement: bool,
    ) -> Result<ResultType, EngineError> {
      Ok((term, false))
    }
  }

  struct SuccessorAutomaton {
    engine: EnginePtr,
    cap:    BaseState,
  }

  impl SymbolicAutomaton for SuccessorAutomaton {
    fn intersect_non_empty(
      &mut self,
      _symbol: SymbolPtr,
      term: TermPtr,
      _under_complement: bool,
    ) -> Result<ResultType, EngineError> {
      let engine = unsafe { &mut *self.engine };
      let mut states: Vec<BaseState> = match unsafe { &(*term).kind } {
        TermKind::BaseSet(base) => base.states.clone(),
        _ => panic!("successor automaton expects base-set terms"),
      };
      let max = *states.last().expect("nonempty base set expected");
      if max < self.cap {
        states.push(max + 1);
      }
      Ok((engine.terms.create_base_set(&states), false))
    }
  }
}
