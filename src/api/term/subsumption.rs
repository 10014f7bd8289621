/*!

The structural subsumption relation `t₁ ⊑ t₂`: set inclusion lifted to the term representation.
Fixpoint computations use it to prune work, since a candidate member already covered by an
existing member contributes nothing new.

The relation is three valued. `Yes` and `No` are definite and memoized per term; `Unknown` arises
when a fixpoint that is still being computed cannot answer on current content, and is never
cached. Callers translate `Unknown` into postponement, not into an error.

Rules, applied in order:

 1. A continuation on either side is forced first; subsumption is never approximated across a
    deferred computation.
 2. If the left side is complemented, the query flips: `s ⊑ t` on the complemented lattice is
    `t ⊑ s` structurally. A complemented `Empty` (the universe) is only subsumed by itself.
 3. A non-complemented `Empty` on the right subsumes exactly the empty terms.
 4. Otherwise both sides must carry the same type tag and the comparison is variant specific.

*/

use crate::{
  api::term::{
    continuation::UnfoldSite,
    fixpoint::FixpointMember,
    term_id,
    Term,
    TermKind,
    TermPtr,
    TermType,
  },
  core::{engine::Engine, error::EngineError},
};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SubsumptionResult {
  Yes,
  No,
  Unknown,
}

impl SubsumptionResult {
  #[inline(always)]
  pub fn is_definite(&self) -> bool {
    *self != SubsumptionResult::Unknown
  }
}

/// Three-valued conjunction: `No` dominates, `Unknown` taints.
fn both(first: SubsumptionResult, second: SubsumptionResult) -> SubsumptionResult {
  use SubsumptionResult::*;
  match (first, second) {
    (No, _) | (_, No)   => No,
    (Yes, Yes)          => Yes,
    _                   => Unknown,
  }
}

impl Term {
  /// Decides whether `self ⊑ other`, memoizing definite answers in the per-term subsumed-by
  /// memo. See the module documentation for the rule order.
  pub fn is_subsumed(
    &mut self,
    other: TermPtr,
    engine: &mut Engine,
  ) -> Result<SubsumptionResult, EngineError> {
    assert!(!other.is_null(), "subsumption tested against a null pointer");

    if std::ptr::eq(self as *const Term, other as *const Term) {
      engine.statistics.comparisons.record_by_same_pointer();
      return Ok(SubsumptionResult::Yes);
    }

    // Force continuations before any structural reasoning.
    if unsafe { &*other }.term_type() == TermType::Continuation {
      if let (TermKind::Continuation(this), TermKind::Continuation(that)) =
        (&self.kind, unsafe { &(*other).kind })
      {
        debug_assert_eq!(
          this.under_complement, that.under_complement,
          "continuations under different complement polarity compared"
        );
      }
      let unfolded = unsafe { &mut *other }.unfold_continuation(UnfoldSite::Subsumption, engine)?;
      return self.is_subsumed(unfolded, engine);
    }
    if self.term_type() == TermType::Continuation {
      let unfolded = self.unfold_continuation(UnfoldSite::Subsumption, engine)?;
      return unsafe { &mut *unfolded }.is_subsumed(other, engine);
    }

    let other_ref = unsafe { &mut *other };

    // Complement normalisation.
    if self.in_complement() {
      if self.term_type() == TermType::Empty {
        return Ok(if other_ref.term_type() == TermType::Empty {
          SubsumptionResult::Yes
        } else {
          SubsumptionResult::No
        });
      }
      return other_ref.is_subsumed_core(self, engine);
    }

    // Empty short-circuit.
    if other_ref.term_type() == TermType::Empty && !other_ref.in_complement() {
      return Ok(if self.is_empty() {
        SubsumptionResult::Yes
      } else {
        SubsumptionResult::No
      });
    }

    if let Some(&cached) = self.subsumed_by.get(&term_id(other)) {
      engine.statistics.subsumption.record_cache_hits();
      return Ok(cached);
    }

    assert_eq!(
      self.term_type(),
      other_ref.term_type(),
      "testing subsumption of different term types"
    );

    let result = self.is_subsumed_core(other_ref, engine)?;
    match result {
      SubsumptionResult::Yes => engine.statistics.comparisons.record_by_structure_true(),
      SubsumptionResult::No  => engine.statistics.comparisons.record_by_structure_false(),
      SubsumptionResult::Unknown => {}
    }
    // Unknown is a statement about current knowledge, not about the terms; it is not cached.
    if result.is_definite() {
      self.subsumed_by.insert(term_id(other), result);
    }
    Ok(result)
  }

  /// Variant-specific structural dispatch. Both sides carry the same type tag here.
  fn is_subsumed_core(
    &self,
    other: &Term,
    engine: &mut Engine,
  ) -> Result<SubsumptionResult, EngineError> {
    use SubsumptionResult::*;

    match (&self.kind, &other.kind) {
      // The empty term is subsumed by everything.
      (TermKind::Empty, _) => Ok(Yes),

      (TermKind::Product(product), TermKind::Product(other_product)) => {
        let (left, right)             = (product.left, product.right);
        let (other_left, other_right) = (other_product.left, other_product.right);

        // A shared child reduces the test to the remaining pair.
        if std::ptr::eq(left, other_left) {
          return unsafe { &mut *right }.is_subsumed(other_right, engine);
        }
        if std::ptr::eq(right, other_right) {
          return unsafe { &mut *left }.is_subsumed(other_left, engine);
        }

        // Otherwise test both pairs, smaller estimated side first to fail fast.
        let left_smaller =
          unsafe { &*left }.state_space_approx < unsafe { &*right }.state_space_approx;
        let (first_pair, second_pair) = if left_smaller {
          ((left, other_left), (right, other_right))
        } else {
          ((right, other_right), (left, other_left))
        };

        let first = unsafe { &mut *first_pair.0 }.is_subsumed(first_pair.1, engine)?;
        if first == No {
          return Ok(No);
        }
        let second = unsafe { &mut *second_pair.0 }.is_subsumed(second_pair.1, engine)?;
        Ok(both(first, second))
      }

      (TermKind::BaseSet(base), TermKind::BaseSet(other_base)) => {
        let states       = &base.states;
        let other_states = &other_base.states;
        if states.len() > other_states.len() {
          return Ok(No);
        }

        // Both vectors are sorted; a single merge walk decides inclusion.
        let (mut i, mut j) = (0, 0);
        while i < states.len() && j < other_states.len() {
          if states[i] == other_states[j] {
            i += 1;
            j += 1;
          } else if states[i] > other_states[j] {
            j += 1;
          } else {
            return Ok(No);
          }
        }
        Ok(if i == states.len() { Yes } else { No })
      }

      (TermKind::List(list), TermKind::List(other_list)) => {
        let mut overall = Yes;
        for &item in &list.items {
          let mut found       = false;
          let mut saw_unknown = false;
          for &other_item in &other_list.items {
            match unsafe { &mut *item }.is_subsumed(other_item, engine)? {
              Yes => {
                found = true;
                break;
              }
              Unknown => saw_unknown = true,
              No => {}
            }
          }
          if !found {
            if saw_unknown {
              overall = Unknown;
            } else {
              return Ok(No);
            }
          }
        }
        Ok(overall)
      }

      (TermKind::Fixpoint(fixpoint), TermKind::Fixpoint(other_fixpoint)) => {
        // The relation is defined on current content. A missing cover is only definite when the
        // right side cannot grow any more.
        let members        = fixpoint.valid_members();
        let other_members  = other_fixpoint.valid_members();
        let other_complete = other_fixpoint.is_fully_computed();

        let mut overall = Yes;
        for &member in &members {
          let mut found       = false;
          let mut saw_unknown = false;
          for &other_member in &other_members {
            match unsafe { &mut *member }.is_subsumed(other_member, engine)? {
              Yes => {
                found = true;
                break;
              }
              Unknown => saw_unknown = true,
              No => {}
            }
          }
          if !found {
            if other_complete && !saw_unknown {
              return Ok(No);
            }
            overall = Unknown;
          }
        }
        Ok(overall)
      }

      _ => panic!("testing subsumption of different term types"),
    }
  }

  /// Decides whether `self` is subsumed by some member of a fixpoint's member list. `Unknown`
  /// propagates to the caller, which postpones the work item. With fixpoint pruning enabled,
  /// a base-set candidate also invalidates every base-set member it subsumes.
  pub(crate) fn is_subsumed_by_members(
    &mut self,
    members: &mut Vec<FixpointMember>,
    engine: &mut Engine,
  ) -> Result<SubsumptionResult, EngineError> {
    // A continuation cannot be compared against the member list as it stands: force it and
    // delegate to the unfolded term.
    if self.term_type() == TermType::Continuation {
      let unfolded = self.unfold_continuation(UnfoldSite::Subsumption, engine)?;
      return unsafe { &mut *unfolded }.is_subsumed_by_members(members, engine);
    }

    if self.is_empty() {
      return Ok(SubsumptionResult::Yes);
    }

    let self_ptr   = self as *mut Term;
    let candidate_is_base = self.term_type() == TermType::BaseSet;
    let mut saw_unknown = false;

    let count = members.len();
    for index in 0..count {
      if !members[index].valid {
        continue;
      }
      let member = match members[index].term {
        Some(member) => member,
        None => continue, // sentinel
      };

      match self.is_subsumed(member, engine)? {
        SubsumptionResult::Yes => {
          engine.statistics.subsumption.record_subsumed_by_hits();
          return Ok(SubsumptionResult::Yes);
        }
        SubsumptionResult::Unknown => {
          saw_unknown = true;
        }
        SubsumptionResult::No => {
          if engine.options.prune_fixpoint
            && candidate_is_base
            && unsafe { &*member }.term_type() == TermType::BaseSet
            && unsafe { &mut *member }.is_subsumed(self_ptr, engine)? == SubsumptionResult::Yes
          {
            members[index].valid = false;
            engine.statistics.subsumption.record_pruned_members();
          }
        }
      }
    }

    Ok(if saw_unknown {
      SubsumptionResult::Unknown
    } else {
      SubsumptionResult::No
    })
  }
}
