//! Variant tags, addressing modes and their diagnostic names.

use std::fmt;

// =============================================================================
// Diagnostic name tables
// =============================================================================

const VARIANT_NAMES: [&str; 6] = ["LIST", "MAP", "RING", "QUEUE", "STACK", "ARRAY"];

const ADD_MODE_NAMES: [&str; 8] = [
    "APPEND", "PREPEND", "BEFORE", "AFTER", "REPLACE", "KEYED", "SEND", "PUSH",
];

const GET_MODE_NAMES: [&str; 4] = ["INDEX", "KEY", "RECV", "POP"];

const CURSOR_STATE_NAMES: [&str; 4] = ["READY", "ACTIVE", "EXHAUSTED", "STOPPED"];

// =============================================================================
// Variant
// =============================================================================

/// Container implementation selected when a [`Seq`](crate::Seq) is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Doubly-linked list addressed by signed position.
    List,
    /// Red-black tree ordered by a caller comparator.
    Map,
    Ring,
    Queue,
    Stack,
    Array,
}

impl Variant {
    pub const ALL: [Variant; 6] = [
        Variant::List,
        Variant::Map,
        Variant::Ring,
        Variant::Queue,
        Variant::Stack,
        Variant::Array,
    ];

    #[inline]
    pub fn as_str(self) -> &'static str {
        VARIANT_NAMES[self as usize]
    }

    /// Whether [`Seq::create`](crate::Seq::create) can build this variant.
    #[inline]
    pub fn is_implemented(self) -> bool {
        matches!(self, Variant::List | Variant::Map)
    }
}

// =============================================================================
// Addressing modes
// =============================================================================

/// Tag of a [`Placement`], used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddMode {
    Append,
    Prepend,
    Before,
    After,
    Replace,
    Keyed,
    Send,
    Push,
}

impl AddMode {
    #[inline]
    pub fn as_str(self) -> &'static str {
        ADD_MODE_NAMES[self as usize]
    }
}

/// Tag of a [`Locator`], used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GetMode {
    Index,
    Key,
    Recv,
    Pop,
}

impl GetMode {
    #[inline]
    pub fn as_str(self) -> &'static str {
        GET_MODE_NAMES[self as usize]
    }
}

/// Selects the element a get/remove/set targets, or the anchor of a relative add.
#[derive(Debug, PartialEq, Eq)]
pub enum Locator<'a, T> {
    /// Signed position; negative values count from the back (`-1` is the last element).
    Index(isize),
    /// The element comparing `Equal` to the probe under the sequence comparator.
    Key(&'a T),
    Recv,
    Pop,
}

// Manual impls: a derive would demand `T: Copy` for the borrowed probe.
impl<T> Clone for Locator<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Locator<'_, T> {}

impl<T> Locator<'_, T> {
    #[inline]
    pub fn mode(&self) -> GetMode {
        match self {
            Locator::Index(_) => GetMode::Index,
            Locator::Key(_) => GetMode::Key,
            Locator::Recv => GetMode::Recv,
            Locator::Pop => GetMode::Pop,
        }
    }
}

/// Where [`Seq::add`](crate::Seq::add) puts the new element.
#[derive(Debug, PartialEq, Eq)]
pub enum Placement<'a, T> {
    Append,
    Prepend,
    /// Immediately before the anchor element.
    Before(Locator<'a, T>),
    /// Immediately after the anchor element.
    After(Locator<'a, T>),
    /// In place of the anchor element. Does not change the element count.
    Replace(Locator<'a, T>),
    /// At the position given by the comparator (maps).
    Keyed,
    Send,
    Push,
}

impl<T> Clone for Placement<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Placement<'_, T> {}

impl<T> Placement<'_, T> {
    #[inline]
    pub fn mode(&self) -> AddMode {
        match self {
            Placement::Append => AddMode::Append,
            Placement::Prepend => AddMode::Prepend,
            Placement::Before(_) => AddMode::Before,
            Placement::After(_) => AddMode::After,
            Placement::Replace(_) => AddMode::Replace,
            Placement::Keyed => AddMode::Keyed,
            Placement::Send => AddMode::Send,
            Placement::Push => AddMode::Push,
        }
    }
}

// =============================================================================
// Cursor state
// =============================================================================

/// Lifecycle of a [`Cursor`](crate::Cursor). `Exhausted` and `Stopped` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorState {
    Ready,
    Active,
    Exhausted,
    Stopped,
}

impl CursorState {
    #[inline]
    pub fn as_str(self) -> &'static str {
        CURSOR_STATE_NAMES[self as usize]
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, CursorState::Exhausted | CursorState::Stopped)
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(Variant, AddMode, GetMode, CursorState);

// =============================================================================
// Index normalization
// =============================================================================

/// Resolves a signed position against `len`.
///
/// Negative indices count from the back: `absolute = len - |index|`. Anything
/// outside `0..len` does not resolve.
#[inline]
pub(crate) fn resolve_index(index: isize, len: usize) -> Option<usize> {
    if index < 0 {
        len.checked_sub(index.unsigned_abs())
    } else {
        let abs = index.unsigned_abs();
        (abs < len).then_some(abs)
    }
}
