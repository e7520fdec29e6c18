use std::cell::Cell;
use std::ptr::NonNull;

use crate::xor_ptr::XorPtr;

/// The link-only half of a node.
///
/// A bare `Link` is a sentinel. Payload nodes embed one as their first field,
/// so every address stored in a link is the address of a `Link`.
pub(crate) struct Link {
    ptr: Cell<XorPtr<Link>>,
}

impl Link {
    #[inline]
    pub(crate) const fn unlinked() -> Self {
        Self {
            ptr: Cell::new(XorPtr::unlinked()),
        }
    }

    /// Unlocks the neighbour on the far side of `prev`.
    ///
    /// Works in both directions: pass the predecessor to get the successor,
    /// or the successor to get the predecessor.
    #[inline]
    pub(crate) fn next(&self, prev: *mut Link) -> *mut Link {
        self.ptr.get().other(prev)
    }

    /// Replaces the `old` neighbour with `new`.
    #[inline]
    pub(crate) fn update(&self, old: *mut Link, new: *mut Link) {
        self.ptr.set(self.ptr.get().replaced(old, new));
    }

    /// Overwrites both neighbours at once.
    #[inline]
    pub(crate) fn set(&self, a: *mut Link, b: *mut Link) {
        self.ptr.set(XorPtr::new(a, b));
    }

    #[inline]
    pub(crate) fn swap(&self, other: &Link) {
        self.ptr.swap(&other.ptr);
    }

    /// Resets to the zero state so a detached node names nobody.
    #[inline]
    pub(crate) fn unlink(&self) {
        self.ptr.set(XorPtr::unlinked());
    }

    #[inline]
    pub(crate) fn is_unlinked(&self) -> bool {
        self.ptr.get().is_unlinked()
    }

    /// Links `new_node` right after `before`, where `prev` precedes `before`.
    ///
    /// `prev, before, old_next` becomes `prev, before, new_node, old_next`.
    /// Returns `old_next`.
    ///
    /// # Safety
    ///
    /// All three pointers must be live links, `prev` must be the neighbour of
    /// `before` on the side opposite to the insertion, and `new_node` must not
    /// be linked anywhere. Nothing here can detect a wrong `prev`.
    pub(crate) unsafe fn insert(
        prev: *mut Link,
        before: *mut Link,
        new_node: *mut Link,
    ) -> *mut Link {
        debug_assert!(!prev.is_null() && !before.is_null() && !new_node.is_null());
        unsafe {
            let old_next = (*before).next(prev);
            (*old_next).update(before, new_node);
            (*before).update(old_next, new_node);
            (*new_node).set(before, old_next);
            old_next
        }
    }

    /// Unlinks the node right after `before`, where `prev` precedes `before`.
    ///
    /// `prev, before, old_next, new_next` becomes `prev, before, new_next`.
    /// The removed link is reset to the unlinked state and returned; the
    /// caller decides whether to free it or link it somewhere else.
    ///
    /// # Safety
    ///
    /// Same contract as [`Link::insert`], and the node after `before` must not
    /// be `prev` (the ring needs at least one node besides the two given).
    pub(crate) unsafe fn remove(prev: *mut Link, before: *mut Link) -> *mut Link {
        debug_assert!(!prev.is_null() && !before.is_null());
        unsafe {
            let old_next = (*before).next(prev);
            let new_next = (*old_next).next(before);
            (*new_next).update(old_next, before);
            (*before).update(old_next, new_next);
            (*old_next).unlink();
            old_next
        }
    }
}

/// The two permanent sentinels of one list.
pub(crate) struct Ends {
    pub(crate) front: Link,
    pub(crate) back: Link,
}

/// A link with a value attached. Never used as a sentinel.
#[repr(C)]
pub(crate) struct Node<T> {
    link: Link,
    pub(crate) value: T,
}

impl<T> Node<T> {
    #[inline]
    pub(crate) fn new(value: T) -> Self {
        Self {
            link: Link::unlinked(),
            value,
        }
    }

    #[inline]
    pub(crate) fn link(node: NonNull<Node<T>>) -> *mut Link {
        unsafe { &raw mut (*node.as_ptr()).link }
    }

    /// Inverse of [`Node::link`]; `link` sits at offset 0 under `repr(C)`.
    ///
    /// # Safety
    ///
    /// `link` must be the link of a live `Node<T>`, never a sentinel.
    #[inline]
    pub(crate) unsafe fn from_link(link: *mut Link) -> NonNull<Node<T>> {
        debug_assert!(!link.is_null());
        unsafe { NonNull::new_unchecked(link.cast()) }
    }
}
