//! Slot arena backing list and tree nodes.
//!
//! Nodes refer to each other through [`Link`]s (slot numbers) instead of
//! pointers. Freed slots go on a free list and are reused by later allocations.

use crate::error::{Result, SeqError};

// =============================================================================
// Link type
// =============================================================================

/// Link: 32-bit slot number.
///
/// - `0xFFFF_FFFF` = NULL (absent child / end of chain)
/// - `0xFFFF_FFFE` = HEAD (false tree root used during top-down rebalancing;
///   never stored in a node)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct Link(u32);

impl Link {
    pub(crate) const NULL: Link = Link(u32::MAX);
    pub(crate) const HEAD: Link = Link(u32::MAX - 1);
    /// Number of addressable slots.
    const MAX_SLOTS: usize = (u32::MAX - 1) as usize;

    #[inline]
    pub(crate) fn is_null(self) -> bool {
        self.0 == Self::NULL.0
    }

    #[inline]
    fn slot(self) -> usize {
        debug_assert!(self != Self::NULL && self != Self::HEAD);
        self.0 as usize
    }
}

// =============================================================================
// Arena
// =============================================================================

pub(crate) struct Arena<N> {
    slots: Vec<Option<N>>,
    free: Vec<Link>,
}

impl<N> Arena<N> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Makes room for `additional` more nodes without reallocating.
    pub(crate) fn reserve(&mut self, additional: usize) -> Result<()> {
        let spare = self.free.len();
        if additional <= spare {
            return Ok(());
        }
        let grow = additional - spare;
        if self.slots.len().saturating_add(grow) > Link::MAX_SLOTS {
            return Err(SeqError::Alloc);
        }
        self.slots.try_reserve(grow).map_err(|_| SeqError::Alloc)
    }

    /// Stores `node` and returns its link.
    ///
    /// Needs space secured by a prior successful [`Arena::reserve`], so that an
    /// allocation failure is reported before the caller gives up `node`.
    pub(crate) fn alloc(&mut self, node: N) -> Link {
        if let Some(link) = self.free.pop() {
            debug_assert!(self.slots[link.slot()].is_none());
            self.slots[link.slot()] = Some(node);
            return link;
        }
        debug_assert!(self.slots.len() < self.slots.capacity());
        let link = Link(self.slots.len() as u32);
        self.slots.push(Some(node));
        link
    }

    /// Releases the slot behind `link` and returns its node.
    pub(crate) fn free(&mut self, link: Link) -> N {
        match self.slots[link.slot()].take() {
            Some(node) => {
                self.free.push(link);
                node
            }
            None => panic!("double free of arena slot {}", link.0),
        }
    }

    #[inline]
    pub(crate) fn get(&self, link: Link) -> &N {
        match &self.slots[link.slot()] {
            Some(node) => node,
            None => panic!("dangling link {}", link.0),
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, link: Link) -> &mut N {
        match &mut self.slots[link.slot()] {
            Some(node) => node,
            None => panic!("dangling link {}", link.0),
        }
    }

    /// Number of live nodes.
    pub(crate) fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}
