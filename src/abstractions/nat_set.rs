/*!

A `NatSet` is a set of (small) natural numbers backed by a bit vector. The engine uses it for the
redundant bit masks carried by base-set terms: inclusion and intersection tests on masks are
word-parallel, which matters because they sit on the hot path of the subsumption check.

*/

use std::fmt::{Display, Formatter};

use bit_set::BitSet;

use crate::abstractions::join_string;

#[derive(Clone, Default, PartialEq, Eq)]
pub struct NatSet(BitSet);

impl NatSet {
  pub fn new() -> NatSet {
    NatSet(BitSet::new())
  }

  pub fn with_capacity(bits: usize) -> NatSet {
    NatSet(BitSet::with_capacity(bits))
  }

  /// Returns `true` if `value` was not already present.
  #[inline(always)]
  pub fn insert(&mut self, value: usize) -> bool {
    self.0.insert(value)
  }

  #[inline(always)]
  pub fn contains(&self, value: usize) -> bool {
    self.0.contains(value)
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.0.len()
  }

  #[inline(always)]
  pub fn is_subset(&self, other: &NatSet) -> bool {
    self.0.is_subset(&other.0)
  }

  #[inline(always)]
  pub fn is_disjoint(&self, other: &NatSet) -> bool {
    self.0.is_disjoint(&other.0)
  }

  #[inline(always)]
  pub fn union_in_place(&mut self, other: &NatSet) {
    self.0.union_with(&other.0);
  }

  pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
    self.0.iter()
  }
}

impl FromIterator<usize> for NatSet {
  fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> NatSet {
    let mut set = NatSet::new();
    for value in iter {
      set.insert(value);
    }
    set
  }
}

impl Display for NatSet {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{{{}}}", join_string(self.iter(), ", "))
  }
}
