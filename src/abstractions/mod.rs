#![allow(unused)]
/*!

Types/type aliases that abstract over the implementing backing type.

A motivating example is the `IString` type, an interned string type. A number of external crates
could provide this functionality. This module redirects to whatever chosen implementation we want.
To use the [`string_cache` crate](https://crates.io/crates/string_cache), we just define `IString`
as an alias for `string_cache::DefaultAtom`. If we later switch to a different interning crate, only
this module changes.

For infrastructure with a genuinely different backing implementation, we define an abstraction
layer over the implementation. The `log` module is the main example: its (crate) public interface
consists only of `set_global_logging_threshold()`/`get_global_logging_threshold()` and the logging
macros, while the backing implementation is encapsulated in the `log` module.

*/

mod nat_set;
mod rccell;
mod string_join;
mod heap;

use std::collections::HashMap as StdHashMap;

// Logging
pub mod log;

// Interned string. Use `DefaultAtom` for a global cache that can be used across threads.
pub use string_cache::DefaultAtom as IString;

// A set of (small) natural numbers
pub use nat_set::NatSet;

// Reference counted pointers with mutable state.
pub use rccell::{rc_cell, RcCell};

// Join sequences with a separator
pub(crate) use string_join::{join_string, join_iter};

// Std hashing collections, re-exported so the backing implementation can be swapped in one place.
pub type HashMap<K, V> = StdHashMap<K, V>;
