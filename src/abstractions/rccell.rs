/*!

Reference counted pointers with interior mutability, used for objects that are shared between
owners with different lifetimes (fixpoint iterators, for example: a fixpoint may outlive the
consumers of its iterators or vice versa).

*/

use std::{
  cell::RefCell,
  rc::{Rc, Weak}
};

pub type RcCell<T>   = Rc<RefCell<T>>;
pub type WeakCell<T> = Weak<RefCell<T>>;

/// Wrap a value in a reference counted cell.
#[inline(always)]
pub fn rc_cell<T>(value: T) -> RcCell<T> {
  Rc::new(RefCell::new(value))
}
