/*!

The narrow contract the engine consumes from the symbolic-automaton tree. The engine never
inspects automata; it only asks one question, `intersect_non_empty`, and receives a term plus an
epsilon-check result back. Internal automata dispatch the question to their children and wrap the
children's answers in product, list, or fixpoint terms minted from the engine's workshops; leaf
automata answer from their transition relations.

Implementations must honor workshop uniqueness: every term they return has to come from the
engine's `TermWorkshop`, never from out-of-band construction.

*/

use crate::{
  api::{
    symbol::SymbolPtr,
    term::TermPtr,
    ResultType
  },
  core::error::EngineError
};

/// A pointer to an automaton node. No ownership is assumed; the symbolic-automaton tree lives
/// outside the engine and outlives every term that references it.
pub type AutomatonPtr = *mut dyn SymbolicAutomaton;

pub trait SymbolicAutomaton {
  /// Computes the image of `term` under `symbol` together with the epsilon-check result of the
  /// step. `under_complement` distinguishes membership from non-membership queries. Fatal
  /// conditions reported by the automaton layer (for example non-determinism propagated up from
  /// the transition relation backend) surface as `EngineError` and abort the decision run.
  fn intersect_non_empty(
    &mut self,
    symbol: SymbolPtr,
    term: TermPtr,
    under_complement: bool,
  ) -> Result<ResultType, EngineError>;
}

/// Address identity of an automaton node, used to key caches. The data pointer alone identifies
/// the node; the vtable half of the fat pointer is irrelevant and dropped.
#[inline(always)]
pub(crate) fn automaton_id(aut: AutomatonPtr) -> usize {
  aut as *mut () as usize
}
