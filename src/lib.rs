//! # seq-rs
//!
//! One owning handle, [`Seq`], over several container variants: a
//! doubly-linked list addressed by signed position and an ordered map backed
//! by a red-black tree. Element lifecycle is customised through an add hook
//! (payload to element) and a remove hook (element release), and traversal
//! goes through a ranged, strided [`Cursor`].
//!
//! ## Example
//!
//! ```rust
//! use seq_rs::{Config, Locator, Seq, SeqError, Variant};
//!
//! let mut list = Seq::create(Config::new(Variant::List)).unwrap();
//! list.append("foo").unwrap();
//! list.append("bar").unwrap();
//! list.append("baz").unwrap();
//! assert_eq!(list.len(), 3);
//! assert_eq!(list.get(Locator::Index(-1)), Ok(&"baz"));
//! list.remove(Locator::Index(1)).unwrap();
//! assert_eq!(list.get(Locator::Index(1)), Ok(&"baz"));
//!
//! let mut map = Seq::create(Config::ordered(Variant::Map)).unwrap();
//! for key in [30, 10, 20] {
//!     map.insert(key).unwrap();
//! }
//! assert_eq!(map.insert(20), Err(SeqError::DuplicateKey));
//! let keys: Vec<i32> = map.iter().map(|(_, key)| *key).collect();
//! assert_eq!(keys, [10, 20, 30]);
//! ```

use std::cmp::Ordering;
use std::fmt;

mod arena;
mod cursor;
mod error;
mod hooks;
mod kind;
mod list;
mod map;

#[cfg(test)]
mod proptests;

use arena::Link;
use error::Refused;
use hooks::Hooks;
use list::List;
use map::Map;

pub use cursor::{Cursor, Range};
pub use error::{Result, SeqError};
pub use hooks::{AddHook, Comparator, RemoveHook};
pub use kind::{AddMode, CursorState, GetMode, Locator, Placement, Variant};

// =============================================================================
// Backend interface
// =============================================================================

/// Storage operations one variant provides to [`Seq`].
///
/// Every fallible mutation either succeeds or leaves the backend exactly as
/// it was. `make` runs the add hook; backends call it only once the target is
/// resolved and node space is reserved, so that nothing can fail after an
/// element exists except checks that hand the element back in [`Refused`].
pub(crate) trait Backend<T> {
    fn len(&self) -> usize;

    /// Stores a new element at `placement`. Returns the displaced element for
    /// [`Placement::Replace`].
    fn add(
        &mut self,
        placement: Placement<'_, T>,
        make: &mut dyn FnMut() -> Option<T>,
    ) -> Result<Option<T>, Refused<T>>;

    fn remove(&mut self, locator: Locator<'_, T>) -> Result<T>;

    fn get(&self, locator: Locator<'_, T>) -> Result<&T>;

    /// Swaps the element at `locator` for a new one and returns the old one.
    fn set(
        &mut self,
        locator: Locator<'_, T>,
        make: &mut dyn FnMut() -> Option<T>,
    ) -> Result<T, Refused<T>>;

    /// Empties the backend, passing every element to `release` in traversal order.
    fn clear(&mut self, release: &mut dyn FnMut(T));

    // === Traversal ===
    fn link_at(&self, index: usize) -> Link;
    fn step(&self, link: Link, forward: bool) -> Link;
    fn element(&self, link: Link) -> &T;

    /// Panics if any structural invariant is broken.
    #[cfg(test)]
    fn validate(&self);
}

// =============================================================================
// Configuration
// =============================================================================

/// Settings consumed by [`Seq::create`].
///
/// `P` is the payload type handed to the add calls; the add hook turns it into
/// a stored `T`.
pub struct Config<T, P = T> {
    variant: Variant,
    name: String,
    capacity: usize,
    hooks: Hooks<P, T>,
    compare: Option<Comparator<T>>,
}

impl<T: 'static> Config<T> {
    /// Payloads are stored as-is and dropped on removal.
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            name: String::new(),
            capacity: 0,
            hooks: Hooks::identity(),
            compare: None,
        }
    }
}

impl<T: Ord + 'static> Config<T> {
    /// Like [`Config::new`], ordered by `Ord`.
    pub fn ordered(variant: Variant) -> Self {
        Self::new(variant).with_comparator(T::cmp)
    }
}

impl<T, P> Config<T, P>
where
    T: TryFrom<P> + 'static,
    P: 'static,
{
    /// Builds each element from its payload with `TryFrom`; a failed
    /// conversion rejects the add.
    pub fn converting(variant: Variant) -> Self {
        Self {
            variant,
            name: String::new(),
            capacity: 0,
            hooks: Hooks {
                add: Box::new(|payload| T::try_from(payload).ok()),
                remove: None,
            },
            compare: None,
        }
    }
}

impl<T, P> Config<T, P> {
    pub fn with_add_hook<Q>(self, hook: impl FnMut(Q) -> Option<T> + 'static) -> Config<T, Q> {
        Config {
            variant: self.variant,
            name: self.name,
            capacity: self.capacity,
            hooks: self.hooks.with_add(Box::new(hook)),
            compare: self.compare,
        }
    }

    pub fn with_remove_hook(mut self, hook: impl FnMut(T) + 'static) -> Self {
        self.hooks.remove = Some(Box::new(hook));
        self
    }

    pub fn with_comparator(mut self, compare: impl Fn(&T, &T) -> Ordering + 'static) -> Self {
        self.compare = Some(Box::new(compare));
        self
    }

    /// Label attached to every log event of the sequence.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Node slots to reserve up front.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

// =============================================================================
// Seq
// =============================================================================

/// Owning handle over one container variant.
///
/// The handle keeps its own element count next to the backend's. Every
/// successful add except [`Placement::Replace`] increments it and every
/// successful remove decrements it; failed calls change nothing.
pub struct Seq<T, P = T> {
    variant: Variant,
    name: String,
    count: usize,
    /// Set once the sequence first holds an element; hooks are fixed from then on.
    held: bool,
    hooks: Hooks<P, T>,
    backend: Box<dyn Backend<T>>,
}

impl<T: 'static, P> Seq<T, P> {
    /// Builds the sequence described by `config`.
    ///
    /// Only [`Variant::List`] and [`Variant::Map`] are available; a map needs
    /// a comparator.
    pub fn create(config: Config<T, P>) -> Result<Self> {
        let Config {
            variant,
            name,
            capacity,
            hooks,
            compare,
        } = config;

        let backend: Result<Box<dyn Backend<T>>> = match (variant, compare) {
            (Variant::List, compare) => {
                List::with_capacity(capacity, compare).map(|list| Box::new(list) as Box<dyn Backend<T>>)
            }
            (Variant::Map, Some(compare)) => {
                Map::with_capacity(capacity, compare).map(|map| Box::new(map) as Box<dyn Backend<T>>)
            }
            (Variant::Map, None) => Err(SeqError::MissingComparator),
            (other, _) => Err(SeqError::Unsupported(other)),
        };

        match backend {
            Ok(backend) => {
                tracing::trace!(seq = %name, %variant, capacity, "created");
                Ok(Self {
                    variant,
                    name,
                    count: 0,
                    held: false,
                    hooks,
                    backend,
                })
            }
            Err(error) => {
                tracing::debug!(seq = %name, %variant, %error, "create failed");
                Err(error)
            }
        }
    }
}

impl<T, P> Seq<T, P> {
    #[inline]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[doc(alias = "size")]
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.count, self.backend.len());
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // === Adding ===

    /// Turns `payload` into an element with the add hook and stores it at
    /// `placement`.
    ///
    /// The anchor of a relative placement is resolved before the hook runs. If
    /// the attempt fails after the hook produced an element, that element is
    /// passed to the remove hook.
    pub fn add(&mut self, placement: Placement<'_, T>, payload: P) -> Result<()> {
        let op = placement.mode().as_str();
        let hooks = &mut self.hooks;
        let mut payload = Some(payload);
        let mut make = || payload.take().and_then(|payload| hooks.acquire(payload));

        match self.backend.add(placement, &mut make) {
            Ok(displaced) => {
                match displaced {
                    Some(old) => self.hooks.release(old),
                    None => self.count += 1,
                }
                self.held = true;
                debug_assert_eq!(self.count, self.backend.len());
                tracing::trace!(seq = %self.name, op, len = self.count, "added");
                Ok(())
            }
            Err(Refused { error, element }) => {
                if let Some(element) = element {
                    self.hooks.release(element);
                }
                self.failed(op, &error);
                Err(error)
            }
        }
    }

    #[inline]
    pub fn append(&mut self, payload: P) -> Result<()> {
        self.add(Placement::Append, payload)
    }

    #[inline]
    pub fn prepend(&mut self, payload: P) -> Result<()> {
        self.add(Placement::Prepend, payload)
    }

    #[inline]
    pub fn insert_before(&mut self, anchor: Locator<'_, T>, payload: P) -> Result<()> {
        self.add(Placement::Before(anchor), payload)
    }

    #[inline]
    pub fn insert_after(&mut self, anchor: Locator<'_, T>, payload: P) -> Result<()> {
        self.add(Placement::After(anchor), payload)
    }

    /// Swaps the anchor element for a new one. The old element goes to the
    /// remove hook; the length is unchanged.
    #[inline]
    pub fn replace(&mut self, anchor: Locator<'_, T>, payload: P) -> Result<()> {
        self.add(Placement::Replace(anchor), payload)
    }

    /// Stores an element at its comparator position (maps).
    #[inline]
    pub fn insert(&mut self, payload: P) -> Result<()> {
        self.add(Placement::Keyed, payload)
    }

    // === Access ===

    /// Removes the element at `locator` and passes it to the remove hook.
    pub fn remove(&mut self, locator: Locator<'_, T>) -> Result<()> {
        let op = locator.mode().as_str();
        match self.backend.remove(locator) {
            Ok(element) => {
                self.hooks.release(element);
                self.count -= 1;
                debug_assert_eq!(self.count, self.backend.len());
                tracing::trace!(seq = %self.name, op, len = self.count, "removed");
                Ok(())
            }
            Err(error) => {
                self.failed(op, &error);
                Err(error)
            }
        }
    }

    pub fn get(&self, locator: Locator<'_, T>) -> Result<&T> {
        let op = locator.mode().as_str();
        self.backend.get(locator).map_err(|error| {
            self.failed(op, &error);
            error
        })
    }

    /// Replaces the element at `locator` with one built from `payload`. On a
    /// map the new element must compare equal to the old one.
    pub fn set(&mut self, locator: Locator<'_, T>, payload: P) -> Result<()> {
        let op = locator.mode().as_str();
        let hooks = &mut self.hooks;
        let mut payload = Some(payload);
        let mut make = || payload.take().and_then(|payload| hooks.acquire(payload));

        match self.backend.set(locator, &mut make) {
            Ok(old) => {
                self.hooks.release(old);
                tracing::trace!(seq = %self.name, op, len = self.count, "set");
                Ok(())
            }
            Err(Refused { error, element }) => {
                if let Some(element) = element {
                    self.hooks.release(element);
                }
                self.failed(op, &error);
                Err(error)
            }
        }
    }

    /// Removes every element, passing each to the remove hook (lists front to
    /// back, maps in comparator order).
    pub fn clear(&mut self) {
        let hooks = &mut self.hooks;
        self.backend.clear(&mut |element| hooks.release(element));
        self.count = 0;
        tracing::trace!(seq = %self.name, "cleared");
    }

    // === Traversal ===

    /// Every element with its position, in sequence order.
    pub fn iter(&self) -> Cursor<'_, T> {
        Cursor::over(&*self.backend)
    }

    /// Cursor over `range`, moving `stride` positions per step. A negative
    /// stride walks towards the front.
    pub fn cursor(&self, range: Range, stride: isize) -> Result<Cursor<'_, T>> {
        Cursor::new(&*self.backend, range, stride).map_err(|error| {
            self.failed("CURSOR", &error);
            error
        })
    }

    // === Hooks ===

    /// Replaces the add hook. Only allowed while the sequence has never held
    /// an element.
    pub fn set_add_hook(&mut self, hook: impl FnMut(P) -> Option<T> + 'static) -> Result<()> {
        self.check_hooks_open("SET_ADD_HOOK")?;
        self.hooks.add = Box::new(hook);
        Ok(())
    }

    /// Replaces the remove hook. Only allowed while the sequence has never
    /// held an element.
    pub fn set_remove_hook(&mut self, hook: impl FnMut(T) + 'static) -> Result<()> {
        self.check_hooks_open("SET_REMOVE_HOOK")?;
        self.hooks.remove = Some(Box::new(hook));
        Ok(())
    }

    fn check_hooks_open(&self, op: &'static str) -> Result<()> {
        if self.held {
            let error = SeqError::HooksFrozen;
            self.failed(op, &error);
            return Err(error);
        }
        Ok(())
    }

    #[inline]
    fn failed(&self, op: &'static str, error: &SeqError) {
        tracing::debug!(seq = %self.name, op, %error, "operation failed");
    }

    #[cfg(test)]
    fn validate(&self) {
        self.backend.validate();
        assert_eq!(self.count, self.backend.len(), "handle count must match backend");
    }
}

impl<T, P> Drop for Seq<T, P> {
    fn drop(&mut self) {
        if self.count > 0 {
            self.clear();
        }
    }
}

impl<'a, T, P> IntoIterator for &'a Seq<T, P> {
    type Item = (usize, &'a T);
    type IntoIter = Cursor<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: fmt::Debug, P> fmt::Debug for Seq<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|(_, element)| element)).finish()
    }
}
