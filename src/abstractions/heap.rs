/*!

C-style manual memory management for the objects the workshops own. `heap_construct!` boxes a
value and leaks it as a raw `*mut T`; `heap_destroy!` takes ownership back and drops it. The
workshops are the only users: they construct every term and symbol through `heap_construct!`,
hand out non-owning raw pointers, and reclaim everything in their `Drop` impls.

The usual raw pointer rules apply and are the caller's responsibility: no double free, no use
after free, no aliased mutable references at the moment of destruction.

*/

/// Construct a new mutable pointer to a new heap allocated object. It is up to the user to
/// manually destroy the object and reclaim the memory; the `heap_destroy!` macro is provided
/// for this purpose.
#[macro_export]
macro_rules! heap_construct {
    ($expr:expr) => {{
        Box::into_raw(Box::new($expr))
    }};
}
pub use heap_construct;

/// Destroy a heap allocated object pointed to by a mutable pointer previously returned by
/// `heap_construct!`.
#[macro_export]
macro_rules! heap_destroy {
    ($ptr:expr) => {{
        // Assert that the given expression is a mutable raw pointer to prevent misuse.
        let _ = $ptr as *mut _;
        drop(unsafe { Box::from_raw($ptr) });
    }};
}
pub use heap_destroy;
