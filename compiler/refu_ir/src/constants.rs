//! Numeric constant payloads.

use std::fmt;

/// A numeric literal as it appears in the source.
///
/// Floats keep their bit pattern so the containing token and AST node
/// stay `Eq`/`Hash`-derivable.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub enum Constant {
    Int(i64),
    Float(crate::FloatBits),
}

impl Constant {
    pub fn float(v: f64) -> Self {
        Constant::Float(crate::FloatBits::new(v))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Constant::Int(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Constant::Float(_))
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{v}"),
            // {:?} keeps the trailing ".0" on whole floats
            Constant::Float(bits) => write!(f, "{:?}", bits.value()),
        }
    }
}

impl fmt::Debug for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_displays_plain() {
        assert_eq!(Constant::Int(42).to_string(), "42");
    }

    #[test]
    fn float_keeps_decimal_point() {
        assert_eq!(Constant::float(3.0).to_string(), "3.0");
        assert_eq!(Constant::float(4.5).to_string(), "4.5");
    }
}
