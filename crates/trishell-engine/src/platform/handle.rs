use std::fmt;
use std::num::NonZeroU32;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        pub struct $name(NonZeroU32);

        impl $name {
            #[inline]
            pub const fn new(raw: NonZeroU32) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn get(self) -> u32 {
                self.0.get()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "#{}"), self.0)
            }
        }
    };
}

opaque_id!(
    /// Platform window identifier.
    WindowId,
    "window"
);

opaque_id!(
    /// Rendering context identifier.
    ContextId,
    "context"
);

opaque_id!(
    /// GPU object identifier (vertex array, buffer, shader or program).
    ///
    /// Never zero; the "not allocated" state is an empty [`Owned`] slot.
    GpuId,
    "gpu"
);

/// Monotonic source of non-zero identifiers.
#[derive(Debug, Default)]
pub struct IdAllocator {
    last: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next identifier. Identifiers are never reused.
    pub fn next(&mut self) -> NonZeroU32 {
        let next = self
            .last
            .checked_add(1)
            .and_then(NonZeroU32::new)
            .expect("identifier space exhausted");
        self.last = next.get();
        next
    }
}

/// Scoped ownership of one platform handle.
///
/// A slot is either empty or holds a live handle. `release` hands the handle to
/// the release closure and empties the slot, so releasing twice is a no-op.
#[derive(Debug)]
pub struct Owned<H: Copy> {
    handle: Option<H>,
}

impl<H: Copy> Owned<H> {
    #[inline]
    pub const fn empty() -> Self {
        Self { handle: None }
    }

    #[inline]
    pub const fn new(handle: H) -> Self {
        Self { handle: Some(handle) }
    }

    #[inline]
    pub fn get(&self) -> Option<H> {
        self.handle
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.handle.is_some()
    }

    /// Releases the handle through `release`.
    ///
    /// Returns `true` when a live handle was released, `false` when the slot
    /// was already empty.
    pub fn release(&mut self, release: impl FnOnce(H)) -> bool {
        match self.handle.take() {
            Some(handle) => {
                release(handle);
                true
            }
            None => false,
        }
    }
}

impl<H: Copy> Default for Owned<H> {
    fn default() -> Self {
        Self::empty()
    }
}
