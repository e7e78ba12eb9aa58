//! Doubly-linked list backend.
//!
//! Positional lookups walk from whichever anchor is closer: an index past the
//! midpoint is reached backwards from `back`, anything else forwards from
//! `front`. No lookup takes more than `len / 2` hops.

use std::cmp::Ordering;
use std::mem;

use crate::arena::{Arena, Link};
use crate::error::{Refused, Result, SeqError};
use crate::hooks::Comparator;
use crate::kind::{resolve_index, Locator, Placement, Variant};
use crate::Backend;

struct ListNode<T> {
    element: T,
    next: Link,
    prev: Link,
}

/// `front` and `back` are both NULL exactly when the list is empty.
pub(crate) struct List<T> {
    nodes: Arena<ListNode<T>>,
    front: Link,
    back: Link,
    len: usize,
    compare: Option<Comparator<T>>,
}

impl<T> List<T> {
    pub(crate) fn new(compare: Option<Comparator<T>>) -> Self {
        Self {
            nodes: Arena::new(),
            front: Link::NULL,
            back: Link::NULL,
            len: 0,
            compare,
        }
    }

    pub(crate) fn with_capacity(capacity: usize, compare: Option<Comparator<T>>) -> Result<Self> {
        let mut list = Self::new(compare);
        list.nodes.reserve(capacity)?;
        Ok(list)
    }

    #[inline]
    fn node(&self, link: Link) -> &ListNode<T> {
        self.nodes.get(link)
    }

    #[inline]
    fn node_mut(&mut self, link: Link) -> &mut ListNode<T> {
        self.nodes.get_mut(link)
    }

    // =========================================================================
    // Addressing
    // =========================================================================

    /// Walks to the node at `index` (`index < len`), returning it together with
    /// the number of hops taken.
    fn walk(&self, index: usize) -> (Link, usize) {
        debug_assert!(index < self.len);
        if index > self.len / 2 {
            let hops = self.len - 1 - index;
            let mut link = self.back;
            for _ in 0..hops {
                link = self.node(link).prev;
            }
            (link, hops)
        } else {
            let mut link = self.front;
            for _ in 0..index {
                link = self.node(link).next;
            }
            (link, index)
        }
    }

    /// First node, front to back, whose element compares `Equal` to `probe`.
    fn scan(&self, compare: &Comparator<T>, probe: &T) -> Link {
        let mut link = self.front;
        while !link.is_null() {
            let node = self.node(link);
            if compare(&node.element, probe) == Ordering::Equal {
                return link;
            }
            link = node.next;
        }
        Link::NULL
    }

    fn find(&self, locator: Locator<'_, T>) -> Result<Link> {
        match locator {
            Locator::Index(index) => resolve_index(index, self.len)
                .map(|abs| self.walk(abs).0)
                .ok_or(SeqError::NotFound),
            Locator::Key(probe) => {
                let Some(compare) = &self.compare else {
                    return Err(invalid(locator.mode().as_str()));
                };
                let link = self.scan(compare, probe);
                if link.is_null() {
                    Err(SeqError::NotFound)
                } else {
                    Ok(link)
                }
            }
            Locator::Recv | Locator::Pop => Err(invalid(locator.mode().as_str())),
        }
    }

    // =========================================================================
    // Splicing
    // =========================================================================

    fn link_back(&mut self, link: Link) {
        let back = self.back;
        if back.is_null() {
            debug_assert!(self.front.is_null());
            self.front = link;
        } else {
            self.node_mut(back).next = link;
            self.node_mut(link).prev = back;
        }
        self.back = link;
    }

    fn link_front(&mut self, link: Link) {
        let front = self.front;
        if front.is_null() {
            debug_assert!(self.back.is_null());
            self.back = link;
        } else {
            self.node_mut(front).prev = link;
            self.node_mut(link).next = front;
        }
        self.front = link;
    }

    fn link_before(&mut self, anchor: Link, link: Link) {
        let prev = self.node(anchor).prev;
        {
            let node = self.node_mut(link);
            node.next = anchor;
            node.prev = prev;
        }
        if prev.is_null() {
            self.front = link;
        } else {
            self.node_mut(prev).next = link;
        }
        self.node_mut(anchor).prev = link;
    }

    fn link_after(&mut self, anchor: Link, link: Link) {
        let next = self.node(anchor).next;
        {
            let node = self.node_mut(link);
            node.prev = anchor;
            node.next = next;
        }
        if next.is_null() {
            self.back = link;
        } else {
            self.node_mut(next).prev = link;
        }
        self.node_mut(anchor).next = link;
    }

    /// Puts `link` exactly where `anchor` is and detaches `anchor`.
    fn link_in_place_of(&mut self, anchor: Link, link: Link) {
        let (prev, next) = {
            let old = self.node(anchor);
            (old.prev, old.next)
        };
        {
            let node = self.node_mut(link);
            node.prev = prev;
            node.next = next;
        }
        if prev.is_null() {
            self.front = link;
        } else {
            self.node_mut(prev).next = link;
        }
        if next.is_null() {
            self.back = link;
        } else {
            self.node_mut(next).prev = link;
        }
    }

    fn unlink(&mut self, link: Link) {
        let (prev, next) = {
            let node = self.node(link);
            (node.prev, node.next)
        };
        if prev.is_null() {
            self.front = next;
        } else {
            self.node_mut(prev).next = next;
        }
        if next.is_null() {
            self.back = prev;
        } else {
            self.node_mut(next).prev = prev;
        }
    }
}

#[inline]
fn invalid(op: &'static str) -> SeqError {
    SeqError::InvalidLocator {
        op,
        variant: Variant::List,
    }
}

impl<T> Backend<T> for List<T> {
    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    fn add(
        &mut self,
        placement: Placement<'_, T>,
        make: &mut dyn FnMut() -> Option<T>,
    ) -> Result<Option<T>, Refused<T>> {
        let anchor = match placement {
            Placement::Append | Placement::Prepend => Link::NULL,
            Placement::Before(at) | Placement::After(at) | Placement::Replace(at) => {
                self.find(at)?
            }
            Placement::Keyed | Placement::Send | Placement::Push => {
                return Err(invalid(placement.mode().as_str()).into());
            }
        };

        self.nodes.reserve(1)?;
        let element = make().ok_or(SeqError::Rejected)?;
        let link = self.nodes.alloc(ListNode {
            element,
            next: Link::NULL,
            prev: Link::NULL,
        });

        match placement {
            Placement::Append => self.link_back(link),
            Placement::Prepend => self.link_front(link),
            Placement::Before(_) => self.link_before(anchor, link),
            Placement::After(_) => self.link_after(anchor, link),
            Placement::Replace(_) => {
                self.link_in_place_of(anchor, link);
                return Ok(Some(self.nodes.free(anchor).element));
            }
            Placement::Keyed | Placement::Send | Placement::Push => {
                unreachable!("rejected before allocation")
            }
        }
        self.len += 1;
        Ok(None)
    }

    fn remove(&mut self, locator: Locator<'_, T>) -> Result<T> {
        let link = self.find(locator)?;
        self.unlink(link);
        self.len -= 1;
        Ok(self.nodes.free(link).element)
    }

    fn get(&self, locator: Locator<'_, T>) -> Result<&T> {
        let link = self.find(locator)?;
        Ok(&self.node(link).element)
    }

    fn set(
        &mut self,
        locator: Locator<'_, T>,
        make: &mut dyn FnMut() -> Option<T>,
    ) -> Result<T, Refused<T>> {
        let link = self.find(locator)?;
        let element = make().ok_or(SeqError::Rejected)?;
        Ok(mem::replace(&mut self.node_mut(link).element, element))
    }

    fn clear(&mut self, release: &mut dyn FnMut(T)) {
        let mut link = self.front;
        self.front = Link::NULL;
        self.back = Link::NULL;
        self.len = 0;
        while !link.is_null() {
            let node = self.nodes.free(link);
            link = node.next;
            release(node.element);
        }
        self.nodes.clear();
    }

    fn link_at(&self, index: usize) -> Link {
        self.walk(index).0
    }

    fn step(&self, link: Link, forward: bool) -> Link {
        let node = self.node(link);
        if forward {
            node.next
        } else {
            node.prev
        }
    }

    fn element(&self, link: Link) -> &T {
        &self.node(link).element
    }

    #[cfg(test)]
    fn validate(&self) {
        assert_eq!(
            self.front.is_null(),
            self.back.is_null(),
            "front and back must be null together"
        );

        let mut count = 0usize;
        let mut prev = Link::NULL;
        let mut link = self.front;
        while !link.is_null() {
            let node = self.node(link);
            assert_eq!(node.prev, prev, "prev link must mirror next link");
            count += 1;
            assert!(count <= self.len, "chain longer than len (cycle?)");
            prev = link;
            link = node.next;
        }
        assert_eq!(prev, self.back, "chain must end at back");
        assert_eq!(count, self.len, "reachable node count must match len");
        assert_eq!(self.nodes.live(), self.len, "arena must hold only reachable nodes");
    }
}
