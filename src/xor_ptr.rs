use std::fmt;
use std::marker::PhantomData;
use std::ptr;

/// Two addresses folded into one word as `a ^ b`.
///
/// The word means nothing on its own. Given one of the two addresses that
/// built it, [`XorPtr::other`] hands back the second one. Provenance is
/// exposed on the way in and picked back up on the way out, so a recovered
/// pointer may be dereferenced as long as the allocation it names is alive.
pub(crate) struct XorPtr<L> {
    bits: usize,
    marker: PhantomData<*mut L>,
}

impl<L> XorPtr<L> {
    /// The zero word, which is what `a ^ a` produces for any `a`.
    #[inline]
    pub(crate) const fn unlinked() -> Self {
        Self {
            bits: 0,
            marker: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn new(a: *mut L, b: *mut L) -> Self {
        Self {
            bits: a.expose_provenance() ^ b.expose_provenance(),
            marker: PhantomData,
        }
    }

    /// Recovers the address paired with `known`.
    #[inline]
    pub(crate) fn other(self, known: *mut L) -> *mut L {
        ptr::with_exposed_provenance_mut(self.bits ^ known.expose_provenance())
    }

    /// Swaps the `old` endpoint for `new`, leaving the opposite endpoint alone.
    ///
    /// `old` must be one of the two addresses this value was built from.
    #[inline]
    pub(crate) fn replaced(self, old: *mut L, new: *mut L) -> Self {
        Self::new(self.other(old), new)
    }

    #[inline]
    pub(crate) fn is_unlinked(self) -> bool {
        self.bits == 0
    }
}

impl<L> Clone for XorPtr<L> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<L> Copy for XorPtr<L> {}

impl<L> PartialEq for XorPtr<L> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<L> Eq for XorPtr<L> {}

impl<L> Default for XorPtr<L> {
    #[inline]
    fn default() -> Self {
        Self::unlinked()
    }
}

impl<L> fmt::Debug for XorPtr<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XorPtr({:#x})", self.bits)
    }
}
