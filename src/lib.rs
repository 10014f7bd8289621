#![allow(dead_code)]

pub mod abstractions;
pub mod api;
pub mod core;

// We re-export abstractions that are meant to be used publicly.
pub use abstractions::{
  log,
  IString
};

use crate::api::term::fixpoint::SearchPolicy;

// Configuration defaults. Per-run overrides go through `core::engine::EngineOptions`.

/// When a base-set term fails a membership test against a fixpoint, also test the reverse
/// direction and invalidate members the candidate subsumes.
pub const OPT_PRUNE_FIXPOINT: bool = false;

/// Run a full `remove_subsumed` pass every time an iterator over a fixpoint is exhausted.
pub const OPT_REDUCE_FIXPOINT_EVERYTIME: bool = false;

/// Worklist search order used when a fixpoint is created without an explicit policy.
pub const DEFAULT_WORKLIST_SEARCH: SearchPolicy = SearchPolicy::DepthFirst;
