//! Ranged, strided traversal over a sequence.

use std::iter::FusedIterator;

use crate::arena::Link;
use crate::error::{Result, SeqError};
use crate::kind::{resolve_index, CursorState};
use crate::Backend;

/// Inclusive span of signed positions a [`Cursor`] visits.
///
/// Both ends use the same normalization as [`Locator::Index`](crate::Locator::Index)
/// and are resolved against the sequence length when the cursor first
/// iterates. With a negative stride `begin` is the higher position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub begin: isize,
    pub end: isize,
}

impl Range {
    #[inline]
    pub const fn new(begin: isize, end: isize) -> Self {
        Self { begin, end }
    }

    /// Every element, front to back.
    #[inline]
    pub const fn full() -> Self {
        Self { begin: 0, end: -1 }
    }

    /// Every element, back to front. Pair with a negative stride.
    #[inline]
    pub const fn reversed() -> Self {
        Self { begin: -1, end: 0 }
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::full()
    }
}

/// Stateful traversal: `Ready` until the first [`Cursor::iterate`], then
/// `Active` until it runs off its range (`Exhausted`) or honours a
/// [`Cursor::stop`] request (`Stopped`).
///
/// A cursor borrows its sequence, so the sequence cannot change or be dropped
/// while the cursor lives.
pub struct Cursor<'a, T> {
    backend: &'a dyn Backend<T>,
    range: Range,
    stride: isize,
    state: CursorState,
    stop_requested: bool,
    link: Link,
    index: usize,
    end: usize,
}

impl<'a, T> Cursor<'a, T> {
    pub(crate) fn new(backend: &'a dyn Backend<T>, range: Range, stride: isize) -> Result<Self> {
        if stride == 0 {
            return Err(SeqError::ZeroStride);
        }
        Ok(Self::with_stride(backend, range, stride))
    }

    /// Full range, stride one.
    pub(crate) fn over(backend: &'a dyn Backend<T>) -> Self {
        Self::with_stride(backend, Range::full(), 1)
    }

    fn with_stride(backend: &'a dyn Backend<T>, range: Range, stride: isize) -> Self {
        debug_assert_ne!(stride, 0);
        Self {
            backend,
            range,
            stride,
            state: CursorState::Ready,
            stop_requested: false,
            link: Link::NULL,
            index: 0,
            end: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> CursorState {
        self.state
    }

    #[inline]
    pub fn range(&self) -> Range {
        self.range
    }

    #[inline]
    pub fn stride(&self) -> isize {
        self.stride
    }

    /// Advances the cursor. The first call positions it at the start of the
    /// range; later calls move `stride` elements. Returns `false` once the
    /// cursor is exhausted or stopped, and on every call after that.
    pub fn iterate(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        if self.stop_requested {
            self.state = CursorState::Stopped;
            return false;
        }
        let forward = self.stride > 0;

        if self.state == CursorState::Ready {
            let len = self.backend.len();
            let bounds = resolve_index(self.range.begin, len).zip(resolve_index(self.range.end, len));
            let Some((begin, end)) = bounds else {
                self.state = CursorState::Exhausted;
                return false;
            };
            if (forward && begin > end) || (!forward && begin < end) {
                self.state = CursorState::Exhausted;
                return false;
            }
            self.link = self.backend.link_at(begin);
            self.index = begin;
            self.end = end;
            self.state = CursorState::Active;
            return true;
        }

        let hops = self.stride.unsigned_abs();
        let room = if forward {
            self.end - self.index
        } else {
            self.index - self.end
        };
        if hops > room {
            self.state = CursorState::Exhausted;
            return false;
        }
        for _ in 0..hops {
            self.link = self.backend.step(self.link, forward);
            debug_assert!(!self.link.is_null(), "stepped off a resolved range");
        }
        if forward {
            self.index += hops;
        } else {
            self.index -= hops;
        }
        true
    }

    /// Current element and its position. `None` unless the cursor is `Active`.
    pub fn get(&self) -> Option<(&'a T, usize)> {
        if self.state != CursorState::Active {
            return None;
        }
        let backend = self.backend;
        Some((backend.element(self.link), self.index))
    }

    /// Requests a stop; the next [`Cursor::iterate`] observes it.
    #[inline]
    pub fn stop(&mut self) {
        self.stop_requested = true;
    }
}

impl<'a, T> Iterator for Cursor<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.iterate() {
            return None;
        }
        self.get().map(|(element, index)| (index, element))
    }
}

impl<T> FusedIterator for Cursor<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::Placement;
    use crate::list::List;
    use crate::map::Map;

    fn list_of(items: &[u32]) -> List<u32> {
        let mut list = List::new(None);
        for &item in items {
            let mut payload = Some(item);
            assert!(list.add(Placement::Append, &mut || payload.take()).is_ok());
        }
        list
    }

    fn collect(cursor: Cursor<'_, u32>) -> Vec<(usize, u32)> {
        cursor.map(|(i, e)| (i, *e)).collect()
    }

    #[test]
    fn test_states() {
        let list = list_of(&[1, 2]);
        let mut cursor = Cursor::new(&list, Range::full(), 1).unwrap();
        assert_eq!(cursor.state(), CursorState::Ready);
        assert_eq!(cursor.get(), None);

        assert!(cursor.iterate());
        assert_eq!(cursor.state(), CursorState::Active);
        assert_eq!(cursor.get(), Some((&1, 0)));
        assert!(cursor.iterate());
        assert_eq!(cursor.get(), Some((&2, 1)));

        assert!(!cursor.iterate());
        assert_eq!(cursor.state(), CursorState::Exhausted);
        assert_eq!(cursor.get(), None);
        assert!(!cursor.iterate());
    }

    #[test]
    fn test_stride_and_range() {
        let list = list_of(&[0, 10, 20, 30, 40, 50, 60]);
        let cursor = Cursor::new(&list, Range::full(), 2).unwrap();
        assert_eq!(collect(cursor), [(0, 0), (2, 20), (4, 40), (6, 60)]);

        let cursor = Cursor::new(&list, Range::new(1, -2), 3).unwrap();
        assert_eq!(collect(cursor), [(1, 10), (4, 40)]);

        let cursor = Cursor::new(&list, Range::new(3, 3), 1).unwrap();
        assert_eq!(collect(cursor), [(3, 30)]);
    }

    #[test]
    fn test_negative_stride() {
        let list = list_of(&[0, 1, 2, 3, 4]);
        let cursor = Cursor::new(&list, Range::reversed(), -1).unwrap();
        assert_eq!(collect(cursor), [(4, 4), (3, 3), (2, 2), (1, 1), (0, 0)]);

        let cursor = Cursor::new(&list, Range::new(-1, 1), -2).unwrap();
        assert_eq!(collect(cursor), [(4, 4), (2, 2)]);
    }

    #[test]
    fn test_empty_or_unresolved_range() {
        let empty = list_of(&[]);
        let mut cursor = Cursor::new(&empty, Range::full(), 1).unwrap();
        assert!(!cursor.iterate());
        assert_eq!(cursor.state(), CursorState::Exhausted);

        let list = list_of(&[1, 2, 3]);
        assert!(collect(Cursor::new(&list, Range::new(5, -1), 1).unwrap()).is_empty());
        // Backwards range with a forward stride visits nothing.
        assert!(collect(Cursor::new(&list, Range::new(2, 0), 1).unwrap()).is_empty());
    }

    #[test]
    fn test_stop_is_cooperative() {
        let list = list_of(&[1, 2, 3]);
        let mut cursor = Cursor::new(&list, Range::full(), 1).unwrap();
        assert!(cursor.iterate());
        cursor.stop();
        // Still readable until the next iterate.
        assert_eq!(cursor.state(), CursorState::Active);
        assert_eq!(cursor.get(), Some((&1, 0)));
        assert!(!cursor.iterate());
        assert_eq!(cursor.state(), CursorState::Stopped);
        assert!(!cursor.iterate());
        assert_eq!(cursor.state(), CursorState::Stopped);
    }

    #[test]
    fn test_stop_before_first_iterate() {
        let list = list_of(&[1]);
        let mut cursor = Cursor::new(&list, Range::full(), 1).unwrap();
        cursor.stop();
        assert!(!cursor.iterate());
        assert_eq!(cursor.state(), CursorState::Stopped);
    }

    #[test]
    fn test_zero_stride() {
        let list = list_of(&[1]);
        assert_eq!(Cursor::new(&list, Range::full(), 0).err(), Some(SeqError::ZeroStride));
    }

    #[test]
    fn test_map_in_order() {
        let mut map: Map<u32> = Map::new(Box::new(|a: &u32, b: &u32| a.cmp(b)));
        for key in [40, 10, 30, 20, 50] {
            let mut payload = Some(key);
            assert!(map.add(Placement::Keyed, &mut || payload.take()).is_ok());
        }
        let forward = Cursor::new(&map, Range::full(), 1).unwrap();
        assert_eq!(collect(forward), [(0, 10), (1, 20), (2, 30), (3, 40), (4, 50)]);
        let backward = Cursor::new(&map, Range::new(-2, 0), -2).unwrap();
        assert_eq!(collect(backward), [(3, 40), (1, 20)]);
    }
}
