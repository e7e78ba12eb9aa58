use crate::kind::Variant;

/// Errors reported by [`Seq`](crate::Seq) and [`Cursor`](crate::Cursor) operations.
///
/// A failed mutation never leaves a partial change behind: the structure and
/// the element counter are exactly as they were before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeqError {
    /// The addressing mode does not apply to this variant.
    #[error("{op} is not a valid locator for a {variant} sequence")]
    InvalidLocator { op: &'static str, variant: Variant },

    /// Node storage could not grow.
    #[error("node allocation failed")]
    Alloc,

    /// The add hook returned no element for the payload.
    #[error("add hook declined the payload")]
    Rejected,

    /// The locator did not resolve to an element.
    #[error("no element at the requested location")]
    NotFound,

    #[error("{0} sequences are not implemented")]
    Unsupported(Variant),

    #[error("map sequences require a comparator")]
    MissingComparator,

    /// A map already holds an element comparing equal to the new one.
    #[error("an element with an equal key is already present")]
    DuplicateKey,

    /// A map `set` produced an element that does not compare equal to the one it replaces.
    #[error("replacement element does not compare equal to the element it replaces")]
    KeyMismatch,

    #[error("hooks cannot change once the sequence has held elements")]
    HooksFrozen,

    #[error("cursor stride must be non-zero")]
    ZeroStride,
}

pub type Result<T, E = SeqError> = std::result::Result<T, E>;

/// A failed insertion, carrying the element the add hook already produced (if
/// any) so the caller can hand it to the remove hook.
pub(crate) struct Refused<T> {
    pub(crate) error: SeqError,
    pub(crate) element: Option<T>,
}

impl<T> Refused<T> {
    #[inline]
    pub(crate) fn new(error: SeqError, element: Option<T>) -> Self {
        Self { error, element }
    }
}

impl<T> From<SeqError> for Refused<T> {
    fn from(error: SeqError) -> Self {
        Self::new(error, None)
    }
}
