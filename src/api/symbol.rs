/*!

Definitions related to symbols. A symbol is one letter of the alphabet the symbolic automata
read: an immutable assignment of every track (one track per variable of the formula) to `0`, `1`,
or "don't care". Projection replaces a single track by don't-care; restriction keeps the tracks of
a listed set of variables and blanks the rest.

Symbols are interned through the `SymbolWorkshop`: equal symbols share identity, so a `SymbolPtr`
comparison is a semantic equality test and symbols can key caches by address. The distinguished
*zero symbol* assigns don't-care to every track.

*/

use std::fmt::{Display, Formatter};

use crate::abstractions::{HashMap, IString, join_string};

/// A pointer to an interned symbol. No ownership is assumed; the `SymbolWorkshop` owns the
/// referent for the lifetime of the decision run.
pub type SymbolPtr = *mut Symbol;

/// The value a symbol assigns to one track.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TrackValue {
  Zero,
  One,
  DontCare,
}

impl TrackValue {
  pub fn as_char(&self) -> char {
    match self {
      TrackValue::Zero     => '0',
      TrackValue::One      => '1',
      TrackValue::DontCare => 'X',
    }
  }
}

impl Display for TrackValue {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_char())
  }
}

#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Symbol {
  pub(crate) tracks: Vec<TrackValue>,
}

impl Symbol {
  pub(crate) fn new(tracks: Vec<TrackValue>) -> Symbol {
    Symbol { tracks }
  }

  #[inline(always)]
  pub fn tracks(&self) -> &[TrackValue] {
    &self.tracks
  }

  #[inline(always)]
  pub fn track(&self, index: usize) -> TrackValue {
    self.tracks[index]
  }

  #[inline(always)]
  pub fn track_count(&self) -> usize {
    self.tracks.len()
  }

  /// Is every track don't-care?
  pub fn is_zero(&self) -> bool {
    self.tracks.iter().all(|value| *value == TrackValue::DontCare)
  }

  /// Structural equality. Interning makes pointer comparison sufficient for interned symbols;
  /// this is the underlying relation the workshop dedupes by.
  pub fn equals(&self, other: &Symbol) -> bool {
    self.tracks == other.tracks
  }
}

impl Display for Symbol {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", join_string(self.tracks.iter(), ""))
  }
}

/// Translates variable names to track indices. The engine itself works purely with track indices;
/// drivers and tests use a `VarMap` to build symbols and restriction lists from the names
/// appearing in a formula.
#[derive(Default)]
pub struct VarMap {
  names: Vec<IString>,
  map:   HashMap<IString, usize>,
}

impl VarMap {
  pub fn new(names: &[&str]) -> VarMap {
    let mut var_map = VarMap::default();
    for name in names {
      var_map.intern(name);
    }
    var_map
  }

  /// Returns the track index for `name`, assigning the next free track on first sight.
  pub fn intern(&mut self, name: &str) -> usize {
    let key = IString::from(name);
    if let Some(&track) = self.map.get(&key) {
      return track;
    }
    let track = self.names.len();
    self.names.push(key.clone());
    self.map.insert(key, track);
    track
  }

  pub fn track_of(&self, name: &str) -> Option<usize> {
    self.map.get(&IString::from(name)).copied()
  }

  pub fn name_of(&self, track: usize) -> Option<&IString> {
    self.names.get(track)
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }
}
