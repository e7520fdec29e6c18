use std::fmt;

use allocator_api2::alloc::{AllocError, Allocator, Global};

use crate::XorList;
use crate::node::{Link, Node};

/// Raw traversal state: the node we came from and the node we are on.
///
/// `current` alone identifies the position; `prev` is the key needed to
/// unlock the next hop.
#[derive(Clone, Copy)]
pub(crate) struct Position {
    pub(crate) prev: *mut Link,
    pub(crate) current: *mut Link,
}

impl Position {
    /// Steps away from `prev`.
    ///
    /// # Safety
    ///
    /// Both links must be live and adjacent in the same ring.
    #[inline]
    pub(crate) unsafe fn advance(&mut self) {
        let next = unsafe { (*self.current).next(self.prev) };
        self.prev = self.current;
        self.current = next;
    }

    /// Steps towards `prev`.
    ///
    /// # Safety
    ///
    /// Both links must be live and adjacent in the same ring.
    #[inline]
    pub(crate) unsafe fn retreat(&mut self) {
        let prev = unsafe { (*self.prev).next(self.current) };
        self.current = self.prev;
        self.prev = prev;
    }
}

impl PartialEq for Position {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.current == other.current
    }
}

impl Eq for Position {}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Position")
            .field("prev", &self.prev)
            .field("current", &self.current)
            .finish()
    }
}

impl<T, A: Allocator> XorList<T, A> {
    /// Moves `pos` one element towards the back, hopping over the front
    /// sentinel so that the back sentinel is the only boundary position.
    #[inline]
    pub(crate) fn step_next(&self, pos: &mut Position) -> bool {
        unsafe { pos.advance() };
        if pos.current == self.front_link() {
            unsafe { pos.advance() };
            true
        } else {
            false
        }
    }

    /// Mirror of [`XorList::step_next`]. Returns `true` when the step wrapped
    /// around onto the back sentinel.
    #[inline]
    pub(crate) fn step_prev(&self, pos: &mut Position) -> bool {
        unsafe { pos.retreat() };
        if pos.current == self.front_link() {
            unsafe { pos.retreat() };
            true
        } else {
            false
        }
    }
}

/// A read-only cursor over an [`XorList`].
///
/// Besides the elements there is one "ghost" position, the back sentinel,
/// which sits between the last and the first element. Moving past either
/// end goes through it.
pub struct Cursor<'a, T: 'a, A: Allocator = Global> {
    index: usize,
    pos: Position,
    list: &'a XorList<T, A>,
}

impl<T, A: Allocator> Clone for Cursor<'_, T, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, A: Allocator> Copy for Cursor<'_, T, A> {}

impl<'a, T, A: Allocator> Cursor<'a, T, A> {
    pub(crate) fn new(list: &'a XorList<T, A>, pos: Position, index: usize) -> Self {
        Self { index, pos, list }
    }

    /// Index of the current element, or `None` on the ghost.
    pub fn index(&self) -> Option<usize> {
        (self.index < self.list.len()).then_some(self.index)
    }

    pub fn move_next(&mut self) {
        if self.list.step_next(&mut self.pos) {
            self.index = 0;
        } else {
            self.index += 1;
        }
    }

    pub fn move_prev(&mut self) {
        if self.list.step_prev(&mut self.pos) {
            self.index = self.list.len();
        } else {
            self.index -= 1;
        }
    }

    pub fn current(&self) -> Option<&'a T> {
        let list: &'a XorList<T, A> = self.list;
        list.value(self.pos.current)
    }

    pub fn peek_next(&self) -> Option<&'a T> {
        let list: &'a XorList<T, A> = self.list;
        let mut pos = self.pos;
        list.step_next(&mut pos);
        list.value(pos.current)
    }

    pub fn peek_prev(&self) -> Option<&'a T> {
        let list: &'a XorList<T, A> = self.list;
        let mut pos = self.pos;
        list.step_prev(&mut pos);
        list.value(pos.current)
    }

    pub fn front(&self) -> Option<&'a T> {
        self.list.front()
    }

    pub fn back(&self) -> Option<&'a T> {
        self.list.back()
    }

    #[cfg(test)]
    pub(crate) fn position(&self) -> Position {
        self.pos
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for Cursor<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor")
            .field(self.list)
            .field(&self.index())
            .finish()
    }
}

/// A cursor that can also edit the list around it.
///
/// Insertions and removals go through the list's two link primitives, so
/// each one touches at most three nodes.
pub struct CursorMut<'a, T: 'a, A: Allocator = Global> {
    index: usize,
    pos: Position,
    list: &'a mut XorList<T, A>,
}

impl<'a, T, A: Allocator> CursorMut<'a, T, A> {
    pub(crate) fn new(list: &'a mut XorList<T, A>, pos: Position, index: usize) -> Self {
        Self { index, pos, list }
    }

    pub fn index(&self) -> Option<usize> {
        (self.index < self.list.len()).then_some(self.index)
    }

    pub fn move_next(&mut self) {
        if self.list.step_next(&mut self.pos) {
            self.index = 0;
        } else {
            self.index += 1;
        }
    }

    pub fn move_prev(&mut self) {
        if self.list.step_prev(&mut self.pos) {
            self.index = self.list.len();
        } else {
            self.index -= 1;
        }
    }

    pub fn current(&mut self) -> Option<&mut T> {
        self.list.value_mut(self.pos.current)
    }

    pub fn peek_next(&mut self) -> Option<&mut T> {
        let mut pos = self.pos;
        self.list.step_next(&mut pos);
        self.list.value_mut(pos.current)
    }

    pub fn peek_prev(&mut self) -> Option<&mut T> {
        let mut pos = self.pos;
        self.list.step_prev(&mut pos);
        self.list.value_mut(pos.current)
    }

    /// Borrows a read-only cursor at the same position.
    pub fn as_cursor(&self) -> Cursor<'_, T, A> {
        Cursor::new(self.list, self.pos, self.index)
    }

    /// Inserts `value` before the current element, or at the back when on
    /// the ghost. The cursor keeps pointing at the same element.
    pub fn insert_before(&mut self, value: T) {
        if self.try_insert_before(value).is_err() {
            XorList::<T, A>::alloc_failed();
        }
    }

    pub fn try_insert_before(&mut self, value: T) -> Result<(), AllocError> {
        let node = Node::link(self.list.alloc_node(|| value)?);
        let mut at = self.pos;
        unsafe {
            at.retreat();
            Link::insert(at.prev, at.current, node);
        }
        self.pos.prev = node;
        self.list.len += 1;
        self.index += 1;
        Ok(())
    }

    /// Inserts `value` after the current element, or at the front when on
    /// the ghost. The cursor keeps pointing at the same element.
    pub fn insert_after(&mut self, value: T) {
        if self.try_insert_after(value).is_err() {
            XorList::<T, A>::alloc_failed();
        }
    }

    pub fn try_insert_after(&mut self, value: T) -> Result<(), AllocError> {
        let node = Node::link(self.list.alloc_node(|| value)?);
        let (front, back) = (self.list.front_link(), self.list.back_link());
        if self.pos.current == back {
            unsafe { Link::insert(back, front, node) };
            self.list.len += 1;
            self.pos = self.list.end();
            self.index = self.list.len();
        } else {
            unsafe { Link::insert(self.pos.prev, self.pos.current, node) };
            self.list.len += 1;
        }
        Ok(())
    }

    /// Unlinks the current element and moves onto the one after it.
    ///
    /// Returns `None` on the ghost.
    pub fn remove_current(&mut self) -> Option<T> {
        if self.pos.current == self.list.back_link() {
            return None;
        }
        let mut at = self.pos;
        let removed = unsafe {
            let next = (*self.pos.current).next(self.pos.prev);
            at.retreat();
            let removed = Link::remove(at.prev, at.current);
            debug_assert_eq!(removed, self.pos.current);
            self.pos.current = next;
            removed
        };
        self.list.len -= 1;
        Some(unsafe { self.list.take_node(Node::from_link(removed)) })
    }

    /// Removes up to `n` elements starting at the current one, stopping at
    /// the ghost. Returns how many were removed.
    pub fn remove_n(&mut self, n: usize) -> usize {
        let mut removed = 0;
        while removed < n && self.remove_current().is_some() {
            removed += 1;
        }
        removed
    }

    /// Inserts every item of `iter` before the current element, keeping
    /// their order. On the ghost they are appended at the back.
    pub fn insert_iter_before<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert_before(value);
        }
    }

    pub fn front(&self) -> Option<&T> {
        self.list.front()
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.list.front_mut()
    }

    pub fn back(&self) -> Option<&T> {
        self.list.back()
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.list.back_mut()
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for CursorMut<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut")
            .field(&*self.list)
            .field(&self.index())
            .finish()
    }
}
