use std::alloc::Layout;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

use allocator_api2::alloc::{AllocError, Allocator, Global};

use crate::cursor::{Cursor, CursorMut, Position};
use crate::iter::{IntoIter, Iter, IterMut};
use crate::node::{Ends, Link, Node};

/// A doubly linked list whose nodes carry a single XOR-encoded link.
///
/// Two link-only sentinels close the list into a ring, so inserting at
/// either end or removing the only element needs no special case. The
/// sentinels live in one heap block that stays put when the list value is
/// moved; element nodes are allocated one at a time with `A`.
pub struct XorList<T, A: Allocator = Global> {
    pub(crate) len: usize,
    ends: NonNull<Ends>,
    alloc: A,
    marker: PhantomData<Node<T>>,
}

unsafe impl<T: Send, A: Allocator + Send> Send for XorList<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for XorList<T, A> {}

impl<T> XorList<T> {
    pub fn new() -> Self {
        Self::new_in(Global)
    }
}

impl<T> Default for XorList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: Allocator> XorList<T, A> {
    pub fn new_in(alloc: A) -> Self {
        let ends = NonNull::from(Box::leak(Box::new(Ends {
            front: Link::unlinked(),
            back: Link::unlinked(),
        })));
        let list = Self {
            len: 0,
            ends,
            alloc,
            marker: PhantomData,
        };
        let (front, back) = (list.front_link(), list.back_link());
        unsafe {
            (*front).set(back, back);
            (*back).set(front, front);
        }
        list
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn front(&self) -> Option<&T> {
        let first = unsafe { (*self.front_link()).next(self.back_link()) };
        self.value(first)
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        let first = unsafe { (*self.front_link()).next(self.back_link()) };
        self.value_mut(first)
    }

    pub fn back(&self) -> Option<&T> {
        let last = unsafe { (*self.back_link()).next(self.front_link()) };
        self.value(last)
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        let last = unsafe { (*self.back_link()).next(self.front_link()) };
        self.value_mut(last)
    }

    pub fn push_front(&mut self, value: T) {
        if self.try_push_front(value).is_err() {
            Self::alloc_failed();
        }
    }

    /// Like [`XorList::push_front`], but reports allocation failure instead
    /// of aborting. The list is untouched on failure and `value` is dropped.
    pub fn try_push_front(&mut self, value: T) -> Result<(), AllocError> {
        self.try_emplace_front(|| value).map(|_| ())
    }

    pub fn push_back(&mut self, value: T) {
        if self.try_push_back(value).is_err() {
            Self::alloc_failed();
        }
    }

    /// Like [`XorList::push_back`], but reports allocation failure instead
    /// of aborting. The list is untouched on failure and `value` is dropped.
    pub fn try_push_back(&mut self, value: T) -> Result<(), AllocError> {
        self.try_emplace_back(|| value).map(|_| ())
    }

    /// Allocates a node at the front, then builds its value with `make`.
    pub fn emplace_front<F: FnOnce() -> T>(&mut self, make: F) -> &mut T {
        match self.try_emplace_front(make) {
            Ok(value) => value,
            Err(_) => Self::alloc_failed(),
        }
    }

    pub fn try_emplace_front<F: FnOnce() -> T>(&mut self, make: F) -> Result<&mut T, AllocError> {
        let node = self.alloc_node(make)?;
        unsafe { Link::insert(self.back_link(), self.front_link(), Node::link(node)) };
        self.len += 1;
        Ok(unsafe { &mut (*node.as_ptr()).value })
    }

    /// Allocates a node at the back, then builds its value with `make`.
    pub fn emplace_back<F: FnOnce() -> T>(&mut self, make: F) -> &mut T {
        match self.try_emplace_back(make) {
            Ok(value) => value,
            Err(_) => Self::alloc_failed(),
        }
    }

    pub fn try_emplace_back<F: FnOnce() -> T>(&mut self, make: F) -> Result<&mut T, AllocError> {
        let node = self.alloc_node(make)?;
        unsafe { Link::insert(self.front_link(), self.back_link(), Node::link(node)) };
        self.len += 1;
        Ok(unsafe { &mut (*node.as_ptr()).value })
    }

    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let removed = unsafe { Link::remove(self.back_link(), self.front_link()) };
        self.len -= 1;
        Some(unsafe { self.take_node(Node::from_link(removed)) })
    }

    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let removed = unsafe { Link::remove(self.front_link(), self.back_link()) };
        self.len -= 1;
        Some(unsafe { self.take_node(Node::from_link(removed)) })
    }

    /// Inserts `value` so that it ends up at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: T) {
        let len = self.len;
        assert!(
            index <= len,
            "insertion index (is {index}) should be <= len (is {len})"
        );
        self.cursor_at_mut(index).insert_before(value);
    }

    /// Removes and returns the element at `index`, or `None` if out of bounds.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        self.cursor_at_mut(index).remove_current()
    }

    /// Drops every element, back to front.
    ///
    /// If an element's destructor panics, the remaining nodes are still freed,
    /// then the panic resumes and propagates to the caller.
    pub fn clear(&mut self) {
        struct DropGuard<'a, T, A: Allocator>(&'a mut XorList<T, A>);

        impl<T, A: Allocator> Drop for DropGuard<'_, T, A> {
            fn drop(&mut self) {
                while self.0.pop_back().is_some() {}
            }
        }

        let guard = DropGuard(self);
        while guard.0.pop_back().is_some() {}
        mem::forget(guard);
    }

    /// Exchanges the contents of two lists.
    ///
    /// Each list keeps its own sentinels. Before the sentinel links are
    /// exchanged, the boundary nodes of both lists are rewritten to name the
    /// other list's sentinels, so no node is visited beyond the first two
    /// and last two of each side.
    pub fn swap(&mut self, other: &mut Self) {
        unsafe {
            Self::rebind(self, other);
            Self::rebind(other, self);
            (*self.front_link()).swap(&*other.front_link());
            (*self.back_link()).swap(&*other.back_link());
        }
        mem::swap(&mut self.len, &mut other.len);
        mem::swap(&mut self.alloc, &mut other.alloc);
    }

    /// Points every link of `from` that names one of its sentinels at the
    /// matching sentinel of `to` instead. Only reads links of `from`.
    unsafe fn rebind(from: &Self, to: &Self) {
        let (front, back) = (from.front_link(), from.back_link());
        let (to_front, to_back) = (to.front_link(), to.back_link());
        unsafe {
            match from.len {
                0 => {
                    (*front).set(to_back, to_back);
                    (*back).set(to_front, to_front);
                }
                1 => {
                    let only = (*front).next(back);
                    (*front).set(to_back, only);
                    (*back).set(only, to_front);
                    (*only).set(to_back, to_front);
                }
                _ => {
                    let first = (*front).next(back);
                    let second = (*first).next(front);
                    let last = (*back).next(front);
                    let before_last = (*last).next(back);
                    (*front).set(to_back, first);
                    (*back).set(to_front, last);
                    (*first).set(to_front, second);
                    (*last).set(to_back, before_last);
                }
            }
        }
    }

    /// Replaces the contents with `iter`, building the new ring first and
    /// swapping it in.
    pub fn assign<I: IntoIterator<Item = T>>(&mut self, iter: I)
    where
        A: Clone,
    {
        let mut fresh = Self::new_in(self.alloc.clone());
        fresh.extend(iter);
        self.swap(&mut fresh);
    }

    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|x| x == value)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.begin(), self.end(), self.len)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self.begin(), self.end(), self.len)
    }

    /// A cursor on the first element, or on the ghost if the list is empty.
    pub fn cursor_front(&self) -> Cursor<'_, T, A> {
        Cursor::new(self, self.begin(), 0)
    }

    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, T, A> {
        let begin = self.begin();
        CursorMut::new(self, begin, 0)
    }

    /// A cursor on the last element, or on the ghost if the list is empty.
    pub fn cursor_back(&self) -> Cursor<'_, T, A> {
        let (pos, index) = self.last_position();
        Cursor::new(self, pos, index)
    }

    pub fn cursor_back_mut(&mut self) -> CursorMut<'_, T, A> {
        let (pos, index) = self.last_position();
        CursorMut::new(self, pos, index)
    }

    fn last_position(&self) -> (Position, usize) {
        let mut pos = self.end();
        if self.is_empty() {
            return (pos, 0);
        }
        unsafe { pos.retreat() };
        (pos, self.len - 1)
    }

    /// Walks from whichever end is closer. `index == len` yields the ghost.
    fn cursor_at_mut(&mut self, index: usize) -> CursorMut<'_, T, A> {
        debug_assert!(index <= self.len);
        let len = self.len;
        if index <= len / 2 {
            let mut cursor = self.cursor_front_mut();
            for _ in 0..index {
                cursor.move_next();
            }
            cursor
        } else {
            let end = self.end();
            let mut cursor = CursorMut::new(self, end, len);
            for _ in index..len {
                cursor.move_prev();
            }
            cursor
        }
    }

    #[inline]
    pub(crate) fn front_link(&self) -> *mut Link {
        unsafe { &raw mut (*self.ends.as_ptr()).front }
    }

    #[inline]
    pub(crate) fn back_link(&self) -> *mut Link {
        unsafe { &raw mut (*self.ends.as_ptr()).back }
    }

    #[inline]
    fn is_sentinel(&self, link: *mut Link) -> bool {
        link == self.front_link() || link == self.back_link()
    }

    /// Position of the first element: `(front sentinel, first)`.
    #[inline]
    pub(crate) fn begin(&self) -> Position {
        let (front, back) = (self.front_link(), self.back_link());
        Position {
            prev: front,
            current: unsafe { (*front).next(back) },
        }
    }

    /// One past the last element: `(last, back sentinel)`.
    #[inline]
    pub(crate) fn end(&self) -> Position {
        let (front, back) = (self.front_link(), self.back_link());
        Position {
            prev: unsafe { (*back).next(front) },
            current: back,
        }
    }

    #[inline]
    pub(crate) fn value(&self, link: *mut Link) -> Option<&T> {
        if self.is_sentinel(link) {
            return None;
        }
        Some(unsafe { &(*Node::<T>::from_link(link).as_ptr()).value })
    }

    #[inline]
    pub(crate) fn value_mut(&mut self, link: *mut Link) -> Option<&mut T> {
        if self.is_sentinel(link) {
            return None;
        }
        Some(unsafe { &mut (*Node::<T>::from_link(link).as_ptr()).value })
    }

    /// Allocates an unlinked node, then fills in its value.
    pub(crate) fn alloc_node<F: FnOnce() -> T>(
        &self,
        make: F,
    ) -> Result<NonNull<Node<T>>, AllocError> {
        struct Dealloc<'a, A: Allocator> {
            alloc: &'a A,
            ptr: NonNull<u8>,
            layout: Layout,
        }

        impl<A: Allocator> Drop for Dealloc<'_, A> {
            fn drop(&mut self) {
                unsafe { self.alloc.deallocate(self.ptr, self.layout) };
            }
        }

        let layout = Layout::new::<Node<T>>();
        let node = self.alloc.allocate(layout)?.cast::<Node<T>>();
        let guard = Dealloc {
            alloc: &self.alloc,
            ptr: node.cast(),
            layout,
        };
        let value = make();
        mem::forget(guard);
        unsafe { node.as_ptr().write(Node::new(value)) };
        Ok(node)
    }

    /// Frees an unlinked node and hands back its value.
    ///
    /// # Safety
    ///
    /// `node` must come from [`XorList::alloc_node`] on this list (or on a
    /// list whose allocator was swapped into this one) and be unlinked.
    pub(crate) unsafe fn take_node(&self, node: NonNull<Node<T>>) -> T {
        unsafe {
            debug_assert!((*Node::link(node)).is_unlinked());
            let value = ptr::read(&raw const (*node.as_ptr()).value);
            self.alloc
                .deallocate(node.cast(), Layout::new::<Node<T>>());
            value
        }
    }

    #[cold]
    pub(crate) fn alloc_failed() -> ! {
        std::alloc::handle_alloc_error(Layout::new::<Node<T>>())
    }
}

/// Frees every node and the sentinels. A panicking element destructor does
/// not leak anything, but the panic resumes once teardown is done.
impl<T, A: Allocator> Drop for XorList<T, A> {
    fn drop(&mut self) {
        struct FreeEnds(NonNull<Ends>);

        impl Drop for FreeEnds {
            fn drop(&mut self) {
                drop(unsafe { Box::from_raw(self.0.as_ptr()) });
            }
        }

        let _ends = FreeEnds(self.ends);
        self.clear();
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for XorList<T, A> {
    fn clone(&self) -> Self {
        let mut list = Self::new_in(self.alloc.clone());
        list.extend(self.iter().cloned());
        list
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for XorList<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self).finish()
    }
}

impl<T> FromIterator<T> for XorList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<T, const N: usize> From<[T; N]> for XorList<T> {
    fn from(values: [T; N]) -> Self {
        Self::from_iter(values)
    }
}

impl<T, A: Allocator> Extend<T> for XorList<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        iter.into_iter().for_each(|value| self.push_back(value));
    }
}

impl<'a, T: Copy + 'a, A: Allocator> Extend<&'a T> for XorList<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T, A: Allocator> IntoIterator for XorList<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a XorList<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut XorList<T, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T: PartialEq, A: Allocator> PartialEq for XorList<T, A> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other)
    }
}

impl<T: Eq, A: Allocator> Eq for XorList<T, A> {}

impl<T: PartialOrd, A: Allocator> PartialOrd for XorList<T, A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other)
    }
}

impl<T: Ord, A: Allocator> Ord for XorList<T, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other)
    }
}

impl<T: Hash, A: Allocator> Hash for XorList<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len.hash(state);
        for value in self {
            value.hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::panic::{self, AssertUnwindSafe};
    use std::rc::Rc;

    /// Walks the whole ring both ways and checks it closes after `len + 1`
    /// hops, visiting the same nodes in mirrored order.
    fn check_ring<T, A: Allocator>(list: &XorList<T, A>) {
        let (front, back) = (list.front_link(), list.back_link());

        let mut forward = vec![];
        let mut pos = Position {
            prev: back,
            current: front,
        };
        for _ in 0..=list.len() {
            unsafe { pos.advance() };
            forward.push(pos.current);
        }
        assert_eq!(Some(&back), forward.last());

        let mut backward = vec![];
        let mut pos = Position {
            prev: front,
            current: back,
        };
        for _ in 0..=list.len() {
            unsafe { pos.advance() };
            backward.push(pos.current);
        }
        assert_eq!(Some(&front), backward.last());

        forward.pop();
        backward.pop();
        backward.reverse();
        assert_eq!(forward, backward);
        assert!(forward.iter().all(|&link| !list.is_sentinel(link)));
    }

    fn contents<T: Clone, A: Allocator>(list: &XorList<T, A>) -> Vec<T> {
        check_ring(list);
        let forward: Vec<T> = list.iter().cloned().collect();
        let mut backward: Vec<T> = list.iter().rev().cloned().collect();
        backward.reverse();
        assert_eq!(forward.len(), list.len());
        assert_eq!(backward.len(), list.len());
        forward
    }

    #[test]
    fn test_memory() {
        for _ in 0..100 {
            let mut list: XorList<u128> = XorList::new();
            for i in 0..10000u128 {
                list.push_front(i);
            }
        }
    }

    #[test]
    fn test_add_iterate() {
        let mut list: XorList<i32> = XorList::new();
        list.push_front(2);
        list.push_front(1);
        list.push_back(3);

        assert_eq!(vec![1, 2, 3], contents(&list));
        assert_eq!(Some(&1), list.front());
        assert_eq!(Some(&3), list.back());
        assert_eq!(3, list.len());
    }

    #[test]
    fn test_add_reverse_iterate() {
        let mut list: XorList<i32> = XorList::new();
        list.push_front(2);
        list.push_front(1);
        list.push_back(3);

        let items: Vec<i32> = list.into_iter().rev().collect();
        assert_eq!(vec![3, 2, 1], items);
    }

    #[test]
    fn test_matches_deque() {
        let mut list = XorList::new();
        let mut model = VecDeque::new();
        for i in 0..200 {
            if i % 3 == 2 {
                assert_eq!(model.pop_front(), list.pop_front());
            } else {
                list.push_back(i);
                model.push_back(i);
            }
        }
        assert_eq!(model.iter().copied().collect::<Vec<_>>(), contents(&list));
    }

    #[test]
    fn test_pop_empty() {
        let mut list: XorList<String> = XorList::new();
        assert_eq!(None, list.pop_front());
        assert_eq!(None, list.pop_back());
        assert_eq!(None, list.front());
        assert_eq!(None, list.back_mut());
        list.push_back("a".to_owned());
        assert_eq!(Some("a".to_owned()), list.pop_front());
        assert_eq!(None, list.pop_back());
        check_ring(&list);
    }

    #[test]
    fn test_erase_begin() {
        let mut list: XorList<i32> = [1, 5, 3, 1, 4].into();
        list.cursor_front_mut().remove_current();
        assert_eq!(vec![5, 3, 1, 4], contents(&list));
        assert_eq!(4, list.len());
    }

    #[test]
    fn test_insert_remove_index() {
        let mut list: XorList<i32> = [0, 2, 4].into();
        list.insert(1, 1);
        list.insert(3, 3);
        list.insert(5, 5);
        list.insert(0, -1);
        assert_eq!(vec![-1, 0, 1, 2, 3, 4, 5], contents(&list));

        assert_eq!(Some(4), list.remove(5));
        assert_eq!(Some(-1), list.remove(0));
        assert_eq!(None, list.remove(5));
        assert_eq!(Some(5), list.remove(4));
        assert_eq!(vec![0, 1, 2, 3], contents(&list));
    }

    #[test]
    #[should_panic(expected = "insertion index (is 3) should be <= len (is 2)")]
    fn test_insert_out_of_bounds() {
        let mut list: XorList<i32> = [1, 2].into();
        list.insert(3, 0);
    }

    #[test]
    fn test_emplace() {
        let mut list: XorList<Vec<u8>> = XorList::new();
        list.emplace_back(|| vec![2]).push(3);
        list.emplace_front(Vec::new).push(1);
        assert_eq!(vec![vec![1], vec![2, 3]], contents(&list));
    }

    #[test]
    fn test_iter_mut() {
        let mut list: XorList<i32> = (1..=4).collect();
        for value in &mut list {
            *value *= 2;
        }
        if let Some(last) = list.iter_mut().next_back() {
            *last = 0;
        }
        assert_eq!(vec![2, 4, 6, 0], contents(&list));
    }

    #[test]
    fn test_swap_self_inverse() {
        for (a, b) in [(0, 0), (1, 0), (0, 1), (1, 1), (2, 3), (5, 0), (2, 2), (3, 1)] {
            let xs: Vec<i32> = (0..a).collect();
            let ys: Vec<i32> = (100..100 + b).collect();
            let mut x: XorList<i32> = xs.iter().copied().collect();
            let mut y: XorList<i32> = ys.iter().copied().collect();

            x.swap(&mut y);
            assert_eq!(ys, contents(&x));
            assert_eq!(xs, contents(&y));

            x.swap(&mut y);
            assert_eq!(xs, contents(&x));
            assert_eq!(ys, contents(&y));
        }
    }

    #[test]
    fn test_swap_into_empty() {
        let mut x: XorList<i32> = XorList::new();
        let mut y: XorList<i32> = [7, 8].into();
        x.swap(&mut y);

        assert_eq!(vec![7, 8], contents(&x));
        assert_eq!(vec![8, 7], x.iter().rev().copied().collect::<Vec<_>>());
        assert!(y.is_empty());
        check_ring(&y);

        x.push_front(6);
        y.push_back(1);
        assert_eq!(vec![6, 7, 8], contents(&x));
        assert_eq!(vec![1], contents(&y));
    }

    #[test]
    fn test_swap_survives_moves() {
        let mut x: XorList<i32> = [1, 2, 3].into();
        let y: XorList<i32> = [4].into();
        let mut boxed = Box::new(y);
        x.swap(&mut boxed);
        let moved = *boxed;
        assert_eq!(vec![1, 2, 3], contents(&moved));
        assert_eq!(vec![4], contents(&x));
    }

    #[test]
    fn test_clear() {
        for n in [0, 1, 17] {
            let mut list: XorList<i32> = (0..n).collect();
            list.clear();
            assert!(list.is_empty());
            assert_eq!(0, list.len());
            check_ring(&list);
            list.push_back(1);
            assert_eq!(vec![1], contents(&list));
        }
    }

    #[test]
    fn test_remove_range() {
        let mut list: XorList<i32> = (0..6).collect();
        let mut cursor = list.cursor_front_mut();
        cursor.move_next();
        assert_eq!(0, cursor.remove_n(0));
        assert_eq!(Some(1), cursor.index());
        assert_eq!(2, cursor.remove_n(2));
        assert_eq!(Some(&mut 3), cursor.current());
        assert_eq!(vec![0, 3, 4, 5], contents(&list));

        let mut cursor = list.cursor_front_mut();
        cursor.move_next();
        assert_eq!(3, cursor.remove_n(10));
        assert_eq!(None, cursor.index());
        assert_eq!(0, cursor.remove_n(1));
        assert_eq!(vec![0], contents(&list));

        let mut cursor = list.cursor_front_mut();
        assert_eq!(1, cursor.remove_n(usize::MAX));
        assert!(list.is_empty());
        check_ring(&list);
    }

    #[test]
    fn test_insert_range() {
        let mut list: XorList<i32> = [1, 5].into();
        let mut cursor = list.cursor_front_mut();
        cursor.insert_iter_before(None);
        assert_eq!(Some(0), cursor.index());
        cursor.move_next();
        cursor.insert_iter_before([2, 3, 4]);
        assert_eq!(Some(4), cursor.index());
        assert_eq!(Some(&mut 5), cursor.current());
        assert_eq!(vec![1, 2, 3, 4, 5], contents(&list));

        let mut cursor = list.cursor_back_mut();
        cursor.move_next();
        cursor.insert_iter_before(6..=8);
        assert_eq!(None, cursor.index());
        assert_eq!(Some(&mut 8), cursor.peek_prev());
        assert_eq!((1..=8).collect::<Vec<_>>(), contents(&list));

        let mut empty: XorList<i32> = XorList::new();
        empty.cursor_front_mut().insert_iter_before([9, 10]);
        assert_eq!(vec![9, 10], contents(&empty));
    }

    #[test]
    fn test_assign() {
        let mut list: XorList<i32> = [1, 2, 3].into();
        list.assign([9, 8]);
        assert_eq!(vec![9, 8], contents(&list));
        list.assign(None);
        assert!(list.is_empty());
    }

    #[test]
    fn test_traits() {
        let a: XorList<i32> = [1, 2, 3].into();
        let b = a.clone();
        let c: XorList<i32> = [1, 2, 4].into();
        assert_eq!(a, b);
        assert!(a < c);
        assert_eq!(Ordering::Greater, c.cmp(&a));
        assert!(a.contains(&2));
        assert!(!a.contains(&4));
        assert_eq!("[1, 2, 3]", format!("{a:?}"));

        let mut d: XorList<i32> = XorList::default();
        d.extend(&[1, 2]);
        d.extend([3]);
        assert_eq!(a, d);
    }

    struct DropCounter {
        drops: Rc<Cell<usize>>,
        panics: bool,
    }

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
            if self.panics {
                panic!("element destructor failed");
            }
        }
    }

    #[test]
    fn test_drop_continues_after_panic() {
        let drops = Rc::new(Cell::new(0));
        let mut list = XorList::new();
        for i in 0..6 {
            list.push_back(DropCounter {
                drops: drops.clone(),
                panics: i == 3,
            });
        }

        let result = panic::catch_unwind(AssertUnwindSafe(move || drop(list)));
        assert!(result.is_err());
        assert_eq!(6, drops.get());
    }

    #[test]
    fn test_clear_continues_after_panic() {
        let drops = Rc::new(Cell::new(0));
        let mut list = XorList::new();
        for i in 0..4 {
            list.push_front(DropCounter {
                drops: drops.clone(),
                panics: i == 0,
            });
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| list.clear()));
        assert!(result.is_err());
        assert_eq!(4, drops.get());
        assert!(list.is_empty());
        check_ring(&list);
    }

    #[derive(Clone)]
    struct Budget(Rc<Cell<usize>>);

    unsafe impl Allocator for Budget {
        fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
            match self.0.get() {
                0 => Err(AllocError),
                left => {
                    self.0.set(left - 1);
                    Global.allocate(layout)
                }
            }
        }

        unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
            unsafe { Global.deallocate(ptr, layout) }
        }
    }

    #[test]
    fn test_alloc_failure_leaves_list_untouched() {
        let budget = Rc::new(Cell::new(2));
        let mut list = XorList::new_in(Budget(budget.clone()));
        list.try_push_back(1).unwrap();
        list.try_push_front(0).unwrap();

        assert_eq!(Err(AllocError), list.try_push_back(2));
        assert_eq!(Err(AllocError), list.try_emplace_front(|| 3).map(|_| ()));
        assert!(list.cursor_front_mut().try_insert_after(4).is_err());
        assert!(list.cursor_back_mut().try_insert_before(5).is_err());
        assert_eq!(vec![0, 1], contents(&list));

        budget.set(1);
        list.try_push_back(2).unwrap();
        assert_eq!(vec![0, 1, 2], contents(&list));
    }

    #[test]
    fn test_emplace_panic_frees_node() {
        let budget = Rc::new(Cell::new(usize::MAX));
        let mut list: XorList<i32, Budget> = XorList::new_in(Budget(budget.clone()));
        list.push_back(1);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            list.emplace_back(|| panic!("no value"));
        }));
        assert!(result.is_err());
        assert_eq!(vec![1], contents(&list));
    }

    #[test]
    fn test_swap_moves_allocators() {
        let left = Rc::new(Cell::new(10));
        let right = Rc::new(Cell::new(10));
        let mut x = XorList::new_in(Budget(left.clone()));
        let mut y = XorList::new_in(Budget(right.clone()));
        x.push_back(1);
        x.swap(&mut y);
        y.push_back(2);
        assert_eq!(8, left.get());
        assert_eq!(10, right.get());
        assert!(Rc::ptr_eq(&y.allocator().0, &left));
    }
}
