//! Hash-interned string storage.
//!
//! A `StringTable` maps a 32-bit content fingerprint to its owned string.
//! Every identifier and every string literal in a module is interned; from
//! then on the compiler passes around the fingerprint (`StrId`) and equality
//! is a u32 comparison. Each analyzer owns two tables, one for identifiers
//! and one for string literals.

use std::fmt;

use rustc_hash::FxHashMap;

/// Handle to an interned string: its 32-bit FNV-1a fingerprint.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StrId(u32);

impl StrId {
    /// The handle a string would intern to, without a table.
    ///
    /// Handles are content fingerprints, so they are stable across
    /// tables; this lets code compare against well-known names (the
    /// elementary type names) without carrying a table around.
    pub fn of(s: &str) -> Self {
        Self(fnv1a32(s))
    }

    /// Rebuild a handle from a raw fingerprint.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw fingerprint.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for StrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StrId({:#010x})", self.0)
    }
}

/// Two distinct strings produced the same 32-bit fingerprint.
///
/// The second insertion is refused; the caller decides how to surface this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashCollision {
    pub hash: u32,
    pub existing: String,
    pub rejected: String,
}

impl fmt::Display for HashCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "string table hash collision: {:#010x} maps to both {:?} and {:?}",
            self.hash, self.existing, self.rejected
        )
    }
}

impl std::error::Error for HashCollision {}

/// 32-bit FNV-1a over the string's bytes.
#[inline]
fn fnv1a32(s: &str) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in s.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

/// Map from 32-bit fingerprint to owned string.
///
/// `add` is a no-op for strings already present (it still returns the
/// existing handle). Distinct strings that collide on the fingerprint fail
/// the second insert with [`HashCollision`]; full-content comparison gates
/// every insertion, so a collision can never alias two strings.
#[derive(Default)]
pub struct StringTable {
    map: FxHashMap<u32, Box<str>>,
}

impl StringTable {
    pub fn new() -> Self {
        Self {
            map: FxHashMap::default(),
        }
    }

    /// Intern a string, returning its canonical handle.
    pub fn add(&mut self, s: &str) -> Result<StrId, HashCollision> {
        let hash = fnv1a32(s);
        match self.map.get(&hash) {
            Some(existing) if existing.as_ref() == s => Ok(StrId(hash)),
            Some(existing) => Err(HashCollision {
                hash,
                existing: existing.to_string(),
                rejected: s.to_string(),
            }),
            None => {
                self.map.insert(hash, s.into());
                Ok(StrId(hash))
            }
        }
    }

    /// Look up the string for a handle, if present.
    pub fn get(&self, id: StrId) -> Option<&str> {
        self.map.get(&id.0).map(AsRef::as_ref)
    }

    /// Look up the string for a handle interned in this table.
    ///
    /// # Panics
    /// Panics if the handle was never interned here. Handles are only
    /// produced by `add`, so this indicates a table mix-up.
    pub fn lookup(&self, id: StrId) -> &str {
        &self.map[&id.0]
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over all interned strings in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (StrId, &str)> {
        self.map.iter().map(|(h, s)| (StrId(*h), s.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_then_get_round_trips() {
        let mut t = StringTable::new();
        let id = t.add("radius").unwrap();
        assert_eq!(t.get(id), Some("radius"));
        assert_eq!(t.lookup(id), "radius");
    }

    #[test]
    fn re_adding_returns_existing_handle() {
        let mut t = StringTable::new();
        let a = t.add("width").unwrap();
        let b = t.add("width").unwrap();
        assert_eq!(a, b);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn distinct_strings_get_distinct_handles() {
        let mut t = StringTable::new();
        let a = t.add("width").unwrap();
        let b = t.add("height").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn get_unknown_is_none() {
        let t = StringTable::new();
        assert_eq!(t.get(StrId(0xdead_beef)), None);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Interning uniqueness: equal strings always resolve to the
            // same handle and the same canonical content.
            #[test]
            fn equal_strings_share_a_handle(s in ".{0,64}") {
                let mut t = StringTable::new();
                let a = t.add(&s).unwrap();
                let b = t.add(&s).unwrap();
                prop_assert_eq!(a, b);
                prop_assert_eq!(t.lookup(a), s.as_str());
            }

            #[test]
            fn distinct_strings_never_alias(a in "[a-z]{1,12}", b in "[a-z]{1,12}") {
                prop_assume!(a != b);
                let mut t = StringTable::new();
                let ia = t.add(&a).unwrap();
                // A genuine 32-bit collision is refused, never aliased.
                if let Ok(ib) = t.add(&b) {
                    prop_assert_ne!(ia, ib);
                    prop_assert_eq!(t.lookup(ib), b.as_str());
                }
                prop_assert_eq!(t.lookup(ia), a.as_str());
            }
        }
    }
}
