//! Canonical type handle.
//!
//! `TypeRef` is a 32-bit index into a module's type set. It lives here, in
//! the bottom crate, so AST nodes can carry their resolved type without the
//! AST depending on the type-system crate. The type set itself (storage,
//! canonicalization, comparison) is `refu_types`.

use std::fmt;

/// A 32-bit index into a module's type set.
///
/// Equality of two `TypeRef`s from the same set means canonical type
/// equality, because the set never stores two structurally equal entries.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct TypeRef(u32);

impl TypeRef {
    /// Create a handle from a raw index. Only the type set does this.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw index.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.0)
    }
}

// Compile-time size assertion: TypeRef must stay 4 bytes
const _: () = assert!(std::mem::size_of::<TypeRef>() == 4);
