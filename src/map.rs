//! Red-black tree backend.
//!
//! Both insertion and removal rebalance on the way down (single pass, no
//! parent links). A false root (`Link::HEAD`) sits above the real root while
//! a pass runs so that rotations at the top need no special case: its right
//! child is the tree root and it is never red.

use std::cmp::Ordering;
use std::mem;

use crate::arena::{Arena, Link};
use crate::error::{Refused, Result, SeqError};
use crate::hooks::Comparator;
use crate::kind::{resolve_index, Locator, Placement, Variant};
use crate::Backend;

const LEFT: usize = 0;
const RIGHT: usize = 1;

struct TreeNode<T> {
    element: T,
    link: [Link; 2],
    red: bool,
}

pub(crate) struct Map<T> {
    nodes: Arena<TreeNode<T>>,
    root: Link,
    len: usize,
    compare: Comparator<T>,
}

impl<T> Map<T> {
    pub(crate) fn new(compare: Comparator<T>) -> Self {
        Self {
            nodes: Arena::new(),
            root: Link::NULL,
            len: 0,
            compare,
        }
    }

    pub(crate) fn with_capacity(capacity: usize, compare: Comparator<T>) -> Result<Self> {
        let mut map = Self::new(compare);
        map.nodes.reserve(capacity)?;
        Ok(map)
    }

    // =========================================================================
    // Node access
    // =========================================================================

    #[inline]
    fn child(&self, link: Link, dir: usize) -> Link {
        if link == Link::HEAD {
            if dir == RIGHT {
                self.root
            } else {
                Link::NULL
            }
        } else {
            self.nodes.get(link).link[dir]
        }
    }

    #[inline]
    fn set_child(&mut self, link: Link, dir: usize, child: Link) {
        if link == Link::HEAD {
            debug_assert_eq!(dir, RIGHT, "false root only has a right child");
            self.root = child;
        } else {
            self.nodes.get_mut(link).link[dir] = child;
        }
    }

    #[inline]
    fn is_red(&self, link: Link) -> bool {
        !link.is_null() && link != Link::HEAD && self.nodes.get(link).red
    }

    #[inline]
    fn set_red(&mut self, link: Link, red: bool) {
        if !link.is_null() && link != Link::HEAD {
            self.nodes.get_mut(link).red = red;
        }
    }

    #[inline]
    fn element_of(&self, link: Link) -> &T {
        &self.nodes.get(link).element
    }

    /// Direction to take from `at` when looking for `target`: right when
    /// `at` orders strictly before it.
    #[inline]
    fn dir_towards(&self, at: Link, target: &T) -> usize {
        ((self.compare)(self.element_of(at), target) == Ordering::Less) as usize
    }

    // =========================================================================
    // Rotations
    // =========================================================================

    /// Single rotation of the subtree at `root` in direction `dir`. The old
    /// root turns red, the new root black. Returns the new subtree root.
    fn rotate(&mut self, root: Link, dir: usize) -> Link {
        let save = self.child(root, 1 - dir);
        let inner = self.child(save, dir);
        self.set_child(root, 1 - dir, inner);
        self.set_child(save, dir, root);
        self.set_red(root, true);
        self.set_red(save, false);
        save
    }

    /// Double rotation: straightens the inner grandchild first.
    fn rotate2(&mut self, root: Link, dir: usize) -> Link {
        let child = self.child(root, 1 - dir);
        let straightened = self.rotate(child, 1 - dir);
        self.set_child(root, 1 - dir, straightened);
        self.rotate(root, dir)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    fn find_key(&self, probe: &T) -> Link {
        let mut link = self.root;
        while !link.is_null() {
            match (self.compare)(probe, self.element_of(link)) {
                Ordering::Equal => return link,
                Ordering::Less => link = self.child(link, LEFT),
                Ordering::Greater => link = self.child(link, RIGHT),
            }
        }
        Link::NULL
    }

    /// Node at in-order rank `index` (`index < len`), walking from whichever
    /// end is closer.
    fn nth(&self, index: usize) -> Link {
        debug_assert!(index < self.len);
        let (dir, mut remaining) = if index > self.len / 2 {
            (RIGHT, self.len - 1 - index)
        } else {
            (LEFT, index)
        };
        let mut stack = Vec::new();
        let mut link = self.root;
        loop {
            while !link.is_null() {
                stack.push(link);
                link = self.child(link, dir);
            }
            let Some(top) = stack.pop() else {
                unreachable!("rank {index} outside tree of {}", self.len)
            };
            if remaining == 0 {
                return top;
            }
            remaining -= 1;
            link = self.child(top, 1 - dir);
        }
    }

    fn find(&self, locator: Locator<'_, T>) -> Result<Link> {
        let link = match locator {
            Locator::Index(index) => match resolve_index(index, self.len) {
                Some(abs) => self.nth(abs),
                None => Link::NULL,
            },
            Locator::Key(probe) => self.find_key(probe),
            Locator::Recv | Locator::Pop => return Err(invalid(locator.mode().as_str())),
        };
        if link.is_null() {
            Err(SeqError::NotFound)
        } else {
            Ok(link)
        }
    }

    /// Outermost node in direction `dir` under `link`.
    fn extreme(&self, mut link: Link, dir: usize) -> Link {
        while !link.is_null() {
            let next = self.child(link, dir);
            if next.is_null() {
                break;
            }
            link = next;
        }
        link
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Links the detached red node `node` into the tree, rebalancing on the
    /// way down. No element in the tree may compare equal to it.
    fn insert_node(&mut self, node: Link) {
        if self.root.is_null() {
            self.root = node;
            self.set_red(node, false);
            return;
        }

        let mut t = Link::HEAD;
        let mut g = Link::NULL;
        let mut p = Link::NULL;
        let mut q = self.root;
        let mut dir = RIGHT;
        let mut last = RIGHT;

        loop {
            if q.is_null() {
                q = node;
                self.set_child(p, dir, q);
            } else if self.is_red(self.child(q, LEFT)) && self.is_red(self.child(q, RIGHT)) {
                // Color flip.
                self.set_red(q, true);
                let (l, r) = (self.child(q, LEFT), self.child(q, RIGHT));
                self.set_red(l, false);
                self.set_red(r, false);
            }

            if self.is_red(q) && self.is_red(p) {
                let dir2 = (self.child(t, RIGHT) == g) as usize;
                let fixed = if q == self.child(p, last) {
                    self.rotate(g, 1 - last)
                } else {
                    self.rotate2(g, 1 - last)
                };
                self.set_child(t, dir2, fixed);
            }

            if q == node {
                break;
            }

            last = dir;
            dir = self.dir_towards(q, self.element_of(node));
            if !g.is_null() {
                t = g;
            }
            g = p;
            p = q;
            q = self.child(q, dir);
        }

        let root = self.root;
        self.set_red(root, false);
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Unlinks `target` from the tree and returns its element, rebalancing on
    /// the way down so the node finally spliced out is red or has a red child.
    fn remove_node(&mut self, target: Link) -> T {
        debug_assert!(!self.root.is_null());

        let mut q = Link::HEAD;
        let mut p = Link::NULL;
        let mut found = Link::NULL;
        let mut dir = RIGHT;

        while !self.child(q, dir).is_null() {
            let last = dir;
            let g = p;
            p = q;
            q = self.child(q, dir);

            let ord = (self.compare)(self.element_of(q), self.element_of(target));
            dir = (ord == Ordering::Less) as usize;
            if ord == Ordering::Equal {
                found = q;
            }

            // Push a red node down.
            if self.is_red(q) || self.is_red(self.child(q, dir)) {
                continue;
            }
            if self.is_red(self.child(q, 1 - dir)) {
                let rotated = self.rotate(q, dir);
                self.set_child(p, last, rotated);
                p = rotated;
                continue;
            }

            let s = self.child(p, 1 - last);
            if s.is_null() {
                continue;
            }
            if !self.is_red(self.child(s, 1 - last)) && !self.is_red(self.child(s, last)) {
                self.set_red(p, false);
                self.set_red(s, true);
                self.set_red(q, true);
            } else {
                let dir2 = (self.child(g, RIGHT) == p) as usize;
                let fixed = if self.is_red(self.child(s, last)) {
                    self.rotate2(p, last)
                } else {
                    self.rotate(p, last)
                };
                self.set_child(g, dir2, fixed);

                self.set_red(q, true);
                self.set_red(fixed, true);
                let (l, r) = (self.child(fixed, LEFT), self.child(fixed, RIGHT));
                self.set_red(l, false);
                self.set_red(r, false);
            }
        }

        debug_assert_eq!(found, target, "target must lie on the search path");

        // `q` is the in-order neighbour of `found` with at most one child;
        // splice it out and move its element into `found`'s slot.
        let side = (self.child(p, RIGHT) == q) as usize;
        let orphan = self.child(q, self.child(q, LEFT).is_null() as usize);
        self.set_child(p, side, orphan);
        let spliced = self.nodes.free(q);
        let element = if found == q {
            spliced.element
        } else {
            mem::replace(&mut self.nodes.get_mut(found).element, spliced.element)
        };

        let root = self.root;
        self.set_red(root, false);
        element
    }
}

#[inline]
fn invalid(op: &'static str) -> SeqError {
    SeqError::InvalidLocator {
        op,
        variant: Variant::Map,
    }
}

impl<T> Backend<T> for Map<T> {
    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    fn add(
        &mut self,
        placement: Placement<'_, T>,
        make: &mut dyn FnMut() -> Option<T>,
    ) -> Result<Option<T>, Refused<T>> {
        if !matches!(placement, Placement::Keyed) {
            return Err(invalid(placement.mode().as_str()).into());
        }

        self.nodes.reserve(1)?;
        let element = make().ok_or(SeqError::Rejected)?;
        if !self.find_key(&element).is_null() {
            return Err(Refused::new(SeqError::DuplicateKey, Some(element)));
        }

        let node = self.nodes.alloc(TreeNode {
            element,
            link: [Link::NULL; 2],
            red: true,
        });
        self.insert_node(node);
        self.len += 1;
        Ok(None)
    }

    fn remove(&mut self, locator: Locator<'_, T>) -> Result<T> {
        let target = self.find(locator)?;
        let element = self.remove_node(target);
        self.len -= 1;
        Ok(element)
    }

    fn get(&self, locator: Locator<'_, T>) -> Result<&T> {
        let link = self.find(locator)?;
        Ok(self.element_of(link))
    }

    fn set(
        &mut self,
        locator: Locator<'_, T>,
        make: &mut dyn FnMut() -> Option<T>,
    ) -> Result<T, Refused<T>> {
        let link = self.find(locator)?;
        let element = make().ok_or(SeqError::Rejected)?;
        if (self.compare)(&element, self.element_of(link)) != Ordering::Equal {
            return Err(Refused::new(SeqError::KeyMismatch, Some(element)));
        }
        Ok(mem::replace(&mut self.nodes.get_mut(link).element, element))
    }

    fn clear(&mut self, release: &mut dyn FnMut(T)) {
        // In-order: descend left pushing ancestors, then visit and go right.
        let mut stack = Vec::new();
        let mut link = self.root;
        self.root = Link::NULL;
        self.len = 0;
        loop {
            while !link.is_null() {
                stack.push(link);
                link = self.child(link, LEFT);
            }
            let Some(top) = stack.pop() else { break };
            let node = self.nodes.free(top);
            link = node.link[RIGHT];
            release(node.element);
        }
        self.nodes.clear();
    }

    fn link_at(&self, index: usize) -> Link {
        self.nth(index)
    }

    /// In-order neighbour of `link`, found from its subtree or by a descent
    /// from the root.
    fn step(&self, link: Link, forward: bool) -> Link {
        let dir = forward as usize;
        let sub = self.child(link, dir);
        if !sub.is_null() {
            return self.extreme(sub, 1 - dir);
        }
        let target = self.element_of(link);
        let mut neighbour = Link::NULL;
        let mut at = self.root;
        while at != link {
            let go = self.dir_towards(at, target);
            if go != dir {
                neighbour = at;
            }
            at = self.child(at, go);
        }
        neighbour
    }

    fn element(&self, link: Link) -> &T {
        self.element_of(link)
    }

    #[cfg(test)]
    fn validate(&self) {
        assert!(!self.is_red(self.root), "root must be black");
        let count = self.check_subtree(self.root, None, None).1;
        assert_eq!(count, self.len, "reachable node count must match len");
        assert_eq!(self.nodes.live(), self.len, "arena must hold only reachable nodes");
    }
}

#[cfg(test)]
impl<T> Map<T> {
    /// Returns (black height, node count) of the subtree at `link`, checking
    /// order bounds and the red-red rule along the way.
    fn check_subtree(&self, link: Link, lo: Option<Link>, hi: Option<Link>) -> (usize, usize) {
        if link.is_null() {
            return (1, 0);
        }
        let element = self.element_of(link);
        if let Some(lo) = lo {
            assert_eq!(
                (self.compare)(self.element_of(lo), element),
                Ordering::Less,
                "in-order violation"
            );
        }
        if let Some(hi) = hi {
            assert_eq!(
                (self.compare)(element, self.element_of(hi)),
                Ordering::Less,
                "in-order violation"
            );
        }
        let (left, right) = (self.child(link, LEFT), self.child(link, RIGHT));
        if self.is_red(link) {
            assert!(
                !self.is_red(left) && !self.is_red(right),
                "red node with red child"
            );
        }
        let (lh, lc) = self.check_subtree(left, lo, Some(link));
        let (rh, rc) = self.check_subtree(right, Some(link), hi);
        assert_eq!(lh, rh, "black height mismatch");
        (lh + (!self.is_red(link)) as usize, lc + rc + 1)
    }

    fn in_order(&self) -> Vec<&T> {
        let mut out = Vec::with_capacity(self.len);
        if self.len == 0 {
            return out;
        }
        let mut link = self.link_at(0);
        while !link.is_null() {
            out.push(self.element_of(link));
            link = self.step(link, true);
        }
        out
    }
}
