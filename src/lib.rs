//! A doubly linked list that stores one pointer-sized link per node.
//!
//! Each node keeps `prev ^ next` instead of two pointers. Knowing one
//! neighbour is enough to unlock the other, so a traversal always carries
//! the address it just came from. Two link-only sentinels close the list
//! into a ring, which lets every insertion and removal go through the same
//! two O(1) primitives with no null-neighbour special cases.
//!
//! ```
//! use xor_dllist::XorList;
//!
//! let mut list: XorList<i32> = [1, 5, 3, 1, 4].into();
//! list.cursor_front_mut().remove_current();
//! assert_eq!(vec![5, 3, 1, 4], list.iter().copied().collect::<Vec<_>>());
//!
//! let mut other = XorList::new();
//! other.swap(&mut list);
//! assert!(list.is_empty());
//! assert_eq!(Some(&4), other.back());
//! ```
//!
//! Encoded links are raw addresses; they mean nothing outside the running
//! process. With the `serde` feature a list serializes as a plain sequence
//! of values and is rebuilt node by node on load.

mod cursor;
mod iter;
mod list;
mod node;
#[cfg(feature = "serde")]
mod serde;
mod xor_ptr;

pub use allocator_api2::alloc::AllocError;
pub use cursor::{Cursor, CursorMut};
pub use iter::{IntoIter, Iter, IterMut};
pub use list::XorList;
