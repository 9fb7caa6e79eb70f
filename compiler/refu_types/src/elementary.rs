//! Predeclared elementary types.

use std::fmt;

use bitflags::bitflags;

/// The predeclared scalar types.
///
/// Discriminant values double as the fixed `TypeRef` indices these types
/// are pre-interned at in every type set, and as the shared RIR UIDs.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(u32)]
pub enum ElementaryKind {
    I8 = 0,
    U8 = 1,
    I16 = 2,
    U16 = 3,
    I32 = 4,
    U32 = 5,
    I64 = 6,
    U64 = 7,
    F32 = 8,
    F64 = 9,
    String = 10,
    Bool = 11,
    Nil = 12,
}

bitflags! {
    /// Property flags for elementary type classification.
    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    pub struct ElemFlags: u8 {
        const INTEGER = 1 << 0;
        const SIGNED  = 1 << 1;
        const FLOAT   = 1 << 2;
        const NUMERIC = Self::INTEGER.bits() | Self::FLOAT.bits();
    }
}

impl ElementaryKind {
    pub const ALL: [ElementaryKind; 13] = [
        ElementaryKind::I8,
        ElementaryKind::U8,
        ElementaryKind::I16,
        ElementaryKind::U16,
        ElementaryKind::I32,
        ElementaryKind::U32,
        ElementaryKind::I64,
        ElementaryKind::U64,
        ElementaryKind::F32,
        ElementaryKind::F64,
        ElementaryKind::String,
        ElementaryKind::Bool,
        ElementaryKind::Nil,
    ];

    /// The source-level spelling.
    pub const fn name(self) -> &'static str {
        match self {
            ElementaryKind::I8 => "i8",
            ElementaryKind::U8 => "u8",
            ElementaryKind::I16 => "i16",
            ElementaryKind::U16 => "u16",
            ElementaryKind::I32 => "i32",
            ElementaryKind::U32 => "u32",
            ElementaryKind::I64 => "i64",
            ElementaryKind::U64 => "u64",
            ElementaryKind::F32 => "f32",
            ElementaryKind::F64 => "f64",
            ElementaryKind::String => "string",
            ElementaryKind::Bool => "bool",
            ElementaryKind::Nil => "nil",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        ElementaryKind::ALL.iter().copied().find(|k| k.name() == name)
    }

    pub const fn flags(self) -> ElemFlags {
        match self {
            ElementaryKind::I8
            | ElementaryKind::I16
            | ElementaryKind::I32
            | ElementaryKind::I64 => ElemFlags::INTEGER.union(ElemFlags::SIGNED),
            ElementaryKind::U8
            | ElementaryKind::U16
            | ElementaryKind::U32
            | ElementaryKind::U64 => ElemFlags::INTEGER,
            ElementaryKind::F32 | ElementaryKind::F64 => {
                ElemFlags::FLOAT.union(ElemFlags::SIGNED)
            }
            ElementaryKind::String | ElementaryKind::Bool | ElementaryKind::Nil => {
                ElemFlags::empty()
            }
        }
    }

    /// Storage width in bits. Strings and nil report 0.
    pub const fn width_bits(self) -> u32 {
        match self {
            ElementaryKind::I8 | ElementaryKind::U8 => 8,
            ElementaryKind::I16 | ElementaryKind::U16 => 16,
            ElementaryKind::I32 | ElementaryKind::U32 | ElementaryKind::F32 => 32,
            ElementaryKind::I64 | ElementaryKind::U64 | ElementaryKind::F64 => 64,
            ElementaryKind::Bool => 1,
            ElementaryKind::String | ElementaryKind::Nil => 0,
        }
    }

    /// Storage size in bytes, for sum-variant payload sizing.
    pub const fn byte_size(self) -> u32 {
        match self {
            ElementaryKind::String => 16, // pointer + length
            ElementaryKind::Bool => 1,
            other => other.width_bits() / 8,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.flags().intersects(ElemFlags::NUMERIC)
    }

    pub fn is_integer(self) -> bool {
        self.flags().contains(ElemFlags::INTEGER)
    }

    pub fn is_float(self) -> bool {
        self.flags().contains(ElemFlags::FLOAT)
    }

    pub fn is_signed(self) -> bool {
        self.flags().contains(ElemFlags::SIGNED)
    }

    /// Whether a value of `self` implicitly widens to `to`.
    ///
    /// Widening stays within a family: integers widen to strictly larger
    /// integers (signed sources require a signed target), floats widen
    /// `f32 → f64`. Everything else requires exact equality.
    pub fn widens_to(self, to: ElementaryKind) -> bool {
        if self == to {
            return true;
        }
        if self.is_integer() && to.is_integer() {
            if self.is_signed() && !to.is_signed() {
                return false;
            }
            return to.width_bits() > self.width_bits();
        }
        if self.is_float() && to.is_float() {
            return to.width_bits() > self.width_bits();
        }
        false
    }

    /// The common promoted type of two arithmetic operands, if the
    /// families are compatible.
    pub fn promoted_with(self, other: ElementaryKind) -> Option<ElementaryKind> {
        if self == other {
            return Some(self);
        }
        if self.widens_to(other) {
            return Some(other);
        }
        if other.widens_to(self) {
            return Some(self);
        }
        None
    }

    /// The smallest signed integer type holding `v` (literal defaulting).
    pub fn fitting_int(v: i64) -> ElementaryKind {
        if i64::from(i8::MIN) <= v && v <= i64::from(i8::MAX) {
            ElementaryKind::I8
        } else if i64::from(i16::MIN) <= v && v <= i64::from(i16::MAX) {
            ElementaryKind::I16
        } else if i64::from(i32::MIN) <= v && v <= i64::from(i32::MAX) {
            ElementaryKind::I32
        } else {
            ElementaryKind::I64
        }
    }

    /// Whether an integer literal value is representable in `self`.
    pub fn int_fits(self, v: i64) -> bool {
        match self {
            ElementaryKind::I8 => i64::from(i8::MIN) <= v && v <= i64::from(i8::MAX),
            ElementaryKind::U8 => 0 <= v && v <= i64::from(u8::MAX),
            ElementaryKind::I16 => i64::from(i16::MIN) <= v && v <= i64::from(i16::MAX),
            ElementaryKind::U16 => 0 <= v && v <= i64::from(u16::MAX),
            ElementaryKind::I32 => i64::from(i32::MIN) <= v && v <= i64::from(i32::MAX),
            ElementaryKind::U32 => 0 <= v && v <= i64::from(u32::MAX),
            ElementaryKind::I64 => true,
            ElementaryKind::U64 => 0 <= v,
            _ => false,
        }
    }
}

impl fmt::Display for ElementaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_stays_in_family() {
        assert!(ElementaryKind::I8.widens_to(ElementaryKind::I32));
        assert!(ElementaryKind::U8.widens_to(ElementaryKind::U16));
        assert!(ElementaryKind::U8.widens_to(ElementaryKind::I16));
        assert!(ElementaryKind::F32.widens_to(ElementaryKind::F64));

        assert!(!ElementaryKind::I32.widens_to(ElementaryKind::I8)); // narrowing
        assert!(!ElementaryKind::I8.widens_to(ElementaryKind::U16)); // sign loss
        assert!(!ElementaryKind::I32.widens_to(ElementaryKind::F64)); // cross family
        assert!(!ElementaryKind::Bool.widens_to(ElementaryKind::I8));
    }

    #[test]
    fn promotion_picks_the_wider_type() {
        assert_eq!(
            ElementaryKind::I8.promoted_with(ElementaryKind::I32),
            Some(ElementaryKind::I32)
        );
        assert_eq!(
            ElementaryKind::F64.promoted_with(ElementaryKind::F32),
            Some(ElementaryKind::F64)
        );
        assert_eq!(ElementaryKind::I32.promoted_with(ElementaryKind::F32), None);
    }

    #[test]
    fn literal_defaulting_fits_smallest_signed() {
        assert_eq!(ElementaryKind::fitting_int(42), ElementaryKind::I8);
        assert_eq!(ElementaryKind::fitting_int(300), ElementaryKind::I16);
        assert_eq!(ElementaryKind::fitting_int(1 << 40), ElementaryKind::I64);
    }

    #[test]
    fn names_round_trip() {
        for kind in ElementaryKind::ALL {
            assert_eq!(ElementaryKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ElementaryKind::from_name("Shape"), None);
    }
}
