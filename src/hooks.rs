//! Element lifecycle hooks and comparators.

use std::cmp::Ordering;

/// Turns a call-site payload into a stored element. Returning `None` declines
/// the payload and fails the add.
pub type AddHook<P, T> = Box<dyn FnMut(P) -> Option<T>>;

/// Releases a stored element as its node leaves the sequence.
pub type RemoveHook<T> = Box<dyn FnMut(T)>;

/// Orders elements. Maps require one; lists use it for [`Locator::Key`](crate::Locator::Key).
pub type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering>;

pub(crate) struct Hooks<P, T> {
    pub(crate) add: AddHook<P, T>,
    pub(crate) remove: Option<RemoveHook<T>>,
}

impl<T: 'static> Hooks<T, T> {
    /// Stores payloads as-is and drops removed elements.
    pub(crate) fn identity() -> Self {
        Self {
            add: Box::new(Some),
            remove: None,
        }
    }
}

impl<P, T> Hooks<P, T> {
    #[inline]
    pub(crate) fn acquire(&mut self, payload: P) -> Option<T> {
        (self.add)(payload)
    }

    #[inline]
    pub(crate) fn release(&mut self, element: T) {
        match &mut self.remove {
            Some(remove) => remove(element),
            None => drop(element),
        }
    }

    pub(crate) fn with_add<Q>(self, add: AddHook<Q, T>) -> Hooks<Q, T> {
        Hooks {
            add,
            remove: self.remove,
        }
    }
}
