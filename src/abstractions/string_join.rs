use std::fmt::Display;
use std::iter::once;

/// Join an iterator of items with a separator computed from the following item, which doesn't
/// exist in the stdlib. (C.f. `Vec::join(…)`.)
pub fn join_iter<T>(mut iter: impl Iterator<Item = T>, sep: impl Fn(&T) -> T)
                    -> impl Iterator<Item = T>
{
  iter
      .next()
      .into_iter()
      .chain(iter.flat_map(move |s| once(sep(&s)).chain(once(s))))
}

/// Join a list of things that can be displayed as a string with a given separator.
///
/// This is a convenience function that defers to `join_iter`.
pub fn join_string<T: Display>(iter: impl Iterator<Item = T>, sep: &str) -> String {
  join_iter(iter.map(|t| t.to_string()), |_| sep.to_string()).collect::<String>()
}
