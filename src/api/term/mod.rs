/*!

Terms are the engine's representation of macro-states: a term denotes a (possibly complemented)
set of states of the subset-construction automaton, possibly nested under repeated projection.
The decision procedure never materializes those sets; it computes with the terms themselves,
comparing them by structural subsumption and unfolding the lazy variants on demand.

There are six variants, carried as an enum payload behind a shared header:

 - `Empty`: the empty macro-state (the universe when complemented); unique per engine.
 - `Product`: intersection or union of two terms, mirroring a binary automaton node.
 - `BaseSet`: an explicit sorted set of leaf automaton states plus a redundant bit mask.
 - `List`: an ordered sequence of member terms, produced by projection nodes.
 - `Continuation`: a deferred `intersect_non_empty` call, forced on demand and memoized.
 - `Fixpoint`: a worklist fixpoint computation that *is* its own result set; see
   [`fixpoint`](crate::api::term::fixpoint).

Terms are minted exclusively by the `TermWorkshop`, which hash-conses them: structurally equal
terms (up to complement) share identity, so pointer equality implies semantic equality for every
variant except `Continuation`. All `TermPtr` handles are non-owning; the workshop owns every term
it ever minted and reclaims them at teardown.

Complement is a surface property. `complement()` only toggles a flag on the shared instance and
is O(1); the subsumption engine interprets the flag explicitly instead of pushing negation into
the structure.

*/

pub mod continuation;
pub mod fixpoint;
pub mod subsumption;

use std::fmt::{Display, Formatter};

use enumflags2::{bitflags, BitFlags};

use crate::{
  abstractions::{join_string, HashMap, NatSet},
  api::{
    automaton::automaton_id,
    symbol::SymbolPtr,
    BaseState
  },
  core::statistics::ComparisonMeasures,
};

use continuation::ContinuationTerm;
use fixpoint::FixpointTerm;
use subsumption::SubsumptionResult;

/// A pointer to a term. No ownership is assumed; the `TermWorkshop` owns the referent for the
/// lifetime of the decision run.
pub type TermPtr = *mut Term;

/// Address identity of a term, used to key caches and memos.
#[inline(always)]
pub(crate) fn term_id(term: TermPtr) -> usize {
  term as usize
}

/// Discriminant of the term variants, used for cheap dispatch and for the short-circuits in
/// equality testing.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TermType {
  Empty,
  Product,
  BaseSet,
  List,
  Fixpoint,
  Continuation,
}

#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum TermAttribute {
  /// This occurrence of the term denotes the complement of the represented set.
  InComplement,

  /// The term was produced while answering a non-membership query, i.e. under the complement of
  /// the enclosing formula. Recorded at construction for continuation, list, and fixpoint terms.
  NonMembershipTesting,
}

pub type TermAttributes = BitFlags<TermAttribute, u8>;

/// Successor link written as a by-product of fixpoint computation, enough for an external walk
/// to reconstruct a witness word. The engine records it and never reads it.
#[derive(Copy, Clone, Default)]
pub struct ExampleLink {
  pub successor: Option<TermPtr>,
  pub symbol:    Option<SymbolPtr>,
  pub length:    usize,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ProductKind {
  Intersection,
  Union,
}

impl Display for ProductKind {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      ProductKind::Intersection => write!(f, "⊓"),
      ProductKind::Union        => write!(f, "⊔"),
    }
  }
}

/// Structural product of two terms, mirroring a binary (intersection or union) automaton node.
pub struct ProductTerm {
  pub left:  TermPtr,
  pub right: TermPtr,
  pub kind:  ProductKind,
}

/// An explicit set of leaf automaton states. `states` is sorted and deduplicated; `mask` is a
/// redundant copy as a bit set for word-parallel intersection and inclusion tests.
pub struct BaseSetTerm {
  pub states: Vec<BaseState>,
  pub mask:   NatSet,
}

impl BaseSetTerm {
  /// Word-parallel intersection test through the bit masks.
  pub fn intersects(&self, other: &BaseSetTerm) -> bool {
    !self.mask.is_disjoint(&other.mask)
  }
}

/// An ordered sequence of member terms, produced by projection nodes.
pub struct ListTerm {
  pub items: Vec<TermPtr>,
}

pub enum TermKind {
  Empty,
  Product(ProductTerm),
  BaseSet(BaseSetTerm),
  List(ListTerm),
  Continuation(ContinuationTerm),
  Fixpoint(FixpointTerm),
}

pub struct Term {
  pub(crate) kind: TermKind,

  /// Exact size of the state space, 0 if unknown.
  pub state_space: u32,
  /// Cheap overestimate of the state space, fixed at construction. Used for heuristics such as
  /// the smaller-child-first ordering in product comparisons.
  pub state_space_approx: u32,

  pub(crate) attributes: TermAttributes,

  /// Memoized results of subsumption tests against other terms, keyed by the other term's
  /// address. Only definite results are stored; see the subsumption module.
  pub(crate) subsumed_by: HashMap<usize, SubsumptionResult>,

  /// Successor link recorded for witness reconstruction.
  pub link: ExampleLink,
}

impl Term {
  pub(crate) fn new(kind: TermKind, state_space: u32, state_space_approx: u32) -> Term {
    Term {
      kind,
      state_space,
      state_space_approx,
      attributes:  TermAttributes::default(),
      subsumed_by: HashMap::default(),
      link:        ExampleLink::default(),
    }
  }

  // region Accessors

  #[inline(always)]
  pub fn term_type(&self) -> TermType {
    match &self.kind {
      TermKind::Empty           => TermType::Empty,
      TermKind::Product(_)      => TermType::Product,
      TermKind::BaseSet(_)      => TermType::BaseSet,
      TermKind::List(_)         => TermType::List,
      TermKind::Continuation(_) => TermType::Continuation,
      TermKind::Fixpoint(_)     => TermType::Fixpoint,
    }
  }

  #[inline(always)]
  pub fn kind(&self) -> &TermKind {
    &self.kind
  }

  #[inline(always)]
  pub fn in_complement(&self) -> bool {
    self.attributes.contains(TermAttribute::InComplement)
  }

  #[inline(always)]
  pub fn non_membership_testing(&self) -> bool {
    self.attributes.contains(TermAttribute::NonMembershipTesting)
  }

  /// Toggles the complement flag. No structural work; the subsumption engine interprets the flag.
  #[inline(always)]
  pub fn complement(&mut self) {
    self.attributes.toggle(TermAttribute::InComplement);
  }

  /// True exactly for a continuation that has not been forced yet.
  pub fn is_not_computed(&self) -> bool {
    match &self.kind {
      TermKind::Continuation(continuation) => continuation.unfolded.is_none(),
      _ => false,
    }
  }

  // endregion Accessors

  /// Semantic emptiness of the represented set. Continuations are treated pessimistically as
  /// nonempty until forced; a fixpoint is empty when it has no work left and every member is
  /// empty.
  pub fn is_empty(&self) -> bool {
    match &self.kind {
      TermKind::Empty => true,

      TermKind::Product(product) => {
        unsafe { &*product.left }.is_empty() && unsafe { &*product.right }.is_empty()
      }

      TermKind::BaseSet(base) => base.states.is_empty(),

      TermKind::List(list) => list.items.iter().all(|&item| unsafe { &*item }.is_empty()),

      TermKind::Continuation(_) => false,

      TermKind::Fixpoint(fixpoint) => {
        fixpoint.worklist.is_empty()
          && fixpoint.members.iter().all(|member| match member.term {
               None => true,
               Some(term) => !member.valid || unsafe { &*term }.is_empty(),
             })
      }
    }
  }

  /// Exact state-space measure. Memoized for the variants whose content is fixed at
  /// construction; fixpoints are measured on current content since their member list grows.
  pub fn measure_state_space(&mut self) -> u32 {
    if self.state_space != 0 {
      return self.state_space;
    }

    let measured = match &self.kind {
      TermKind::Empty => 0,

      TermKind::Product(product) => {
        unsafe { &mut *product.left }.measure_state_space()
          + unsafe { &mut *product.right }.measure_state_space()
          + 1
      }

      TermKind::BaseSet(base) => base.states.len() as u32,

      TermKind::Continuation(_) => 1,

      TermKind::List(list) => {
        let mut count = 1;
        for &item in &list.items {
          count += unsafe { &mut *item }.measure_state_space();
        }
        count
      }

      TermKind::Fixpoint(fixpoint) => {
        let mut count = 1;
        for member in &fixpoint.members {
          if let Some(term) = member.term {
            if member.valid {
              count += unsafe { &mut *term }.measure_state_space();
            }
          }
        }
        count
      }
    };

    // Fixpoints keep growing, so their measure cannot be frozen.
    if !matches!(self.kind, TermKind::Fixpoint(_) | TermKind::Empty) {
      self.state_space = measured;
    }
    measured
  }

  /// Records `succ` as the term this one was computed from, reading `symbol`. By-product data
  /// for witness reconstruction.
  pub fn set_successor(&mut self, succ: TermPtr, symbol: SymbolPtr) {
    let length = unsafe { &*succ }.link.length + 1;
    self.link = ExampleLink {
      successor: Some(succ),
      symbol:    Some(symbol),
      length,
    };
  }

  // region Equality

  /// Structural equality. Pointer identity short-circuits to `true`, a type-tag mismatch to
  /// `false`; otherwise the comparison is variant specific. Product comparisons test the child
  /// with the smaller state-space estimate first so that unequal products fail fast.
  pub fn equals(&self, other: TermPtr, measures: &mut ComparisonMeasures) -> bool {
    assert!(!other.is_null(), "term compared against a null pointer");

    if std::ptr::eq(self as *const Term, other as *const Term) {
      measures.record_by_same_pointer();
      return true;
    }

    let other_ref = unsafe { &*other };
    if self.term_type() != other_ref.term_type() {
      measures.record_by_different_type();
      return false;
    }

    let result = self.eq_core(other_ref, measures);
    if result {
      measures.record_by_structure_true();
    } else {
      measures.record_by_structure_false();
    }
    result
  }

  fn eq_core(&self, other: &Term, measures: &mut ComparisonMeasures) -> bool {
    match (&self.kind, &other.kind) {
      (TermKind::Empty, TermKind::Empty) => true,

      (TermKind::Product(product), TermKind::Product(other_product)) => {
        if product.kind != other_product.kind {
          return false;
        }
        let left  = unsafe { &*product.left };
        let right = unsafe { &*product.right };
        if left.state_space_approx < right.state_space_approx {
          left.equals(other_product.left, measures) && right.equals(other_product.right, measures)
        } else {
          right.equals(other_product.right, measures) && left.equals(other_product.left, measures)
        }
      }

      (TermKind::BaseSet(base), TermKind::BaseSet(other_base)) => {
        // Both are sorted, so elementwise comparison decides.
        base.states == other_base.states
      }

      (TermKind::List(list), TermKind::List(other_list)) => {
        // Lists compare as unordered collections of structurally equal members.
        if list.items.len() != other_list.items.len() {
          return false;
        }
        for &item in &list.items {
          let mut found = false;
          for &other_item in &other_list.items {
            if unsafe { &*item }.equals(other_item, measures) {
              found = true;
              break;
            }
          }
          if !found {
            return false;
          }
        }
        for &other_item in &other_list.items {
          let mut found = false;
          for &item in &list.items {
            if unsafe { &*other_item }.equals(item, measures) {
              found = true;
              break;
            }
          }
          if !found {
            return false;
          }
        }
        true
      }

      (TermKind::Continuation(continuation), TermKind::Continuation(other_continuation)) => {
        automaton_id(continuation.aut) == automaton_id(other_continuation.aut)
          && std::ptr::eq(continuation.term, other_continuation.term)
          && std::ptr::eq(continuation.symbol, other_continuation.symbol)
          && continuation.under_complement == other_continuation.under_complement
      }

      (TermKind::Fixpoint(fixpoint), TermKind::Fixpoint(other_fixpoint)) => {
        let members       = fixpoint.valid_members();
        let other_members = other_fixpoint.valid_members();
        if members.len() != other_members.len() {
          return false;
        }
        for &member in &members {
          let mut found = false;
          for &other_member in &other_members {
            if unsafe { &*member }.equals(other_member, measures) {
              found = true;
              break;
            }
          }
          if !found {
            return false;
          }
        }
        true
      }

      _ => panic!("testing structural equality of different term types"),
    }
  }

  // endregion Equality
}

impl Display for Term {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    if self.in_complement() {
      write!(f, "~")?;
    }
    match &self.kind {
      TermKind::Empty => write!(f, "∅"),

      TermKind::Product(product) => {
        write!(
          f,
          "{{{} {} {}}}",
          unsafe { &*product.left },
          product.kind,
          unsafe { &*product.right }
        )
      }

      TermKind::BaseSet(base) => {
        write!(f, "{{{}}}", join_string(base.states.iter(), ","))
      }

      TermKind::List(list) => {
        write!(
          f,
          "[{}]",
          join_string(list.items.iter().map(|&item| unsafe { &*item }), ",")
        )
      }

      TermKind::Continuation(continuation) => {
        write!(
          f,
          "?{}?'{}'",
          unsafe { &*continuation.term },
          unsafe { &*continuation.symbol }
        )
      }

      TermKind::Fixpoint(fixpoint) => {
        write!(
          f,
          "{{{}}}",
          join_string(
            fixpoint.valid_members().into_iter().map(|member| unsafe { &*member }),
            ","
          )
        )
      }
    }
  }
}
