//! Type storage representation.

use refu_ir::{StrId, TypeOpKind, TypeRef};

use crate::ElementaryKind;

/// One canonical type in a [`crate::TypeSet`].
///
/// Operand handles always point into the same set, so structural equality
/// of two entries reduces to tag equality plus recursive operand equality.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeData {
    /// A predeclared scalar.
    Elementary(ElementaryKind),
    /// A user-named composite; `body` is the declared description.
    Defined { name: StrId, body: TypeRef },
    /// Binary product `,`, sum `|`, or implication `->`.
    Operator {
        op: TypeOpKind,
        left: TypeRef,
        right: TypeRef,
    },
    /// A labeled field `name:type` inside a product or sum.
    Leaf { name: StrId, inner: TypeRef },
    /// A parameter introduced by a generic declaration.
    Generic { name: StrId },
}

impl TypeData {
    pub fn is_elementary(&self) -> bool {
        matches!(self, TypeData::Elementary(_))
    }

    pub fn elementary(&self) -> Option<ElementaryKind> {
        match self {
            TypeData::Elementary(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_sum(&self) -> bool {
        matches!(
            self,
            TypeData::Operator {
                op: TypeOpKind::Sum,
                ..
            }
        )
    }

    pub fn is_implication(&self) -> bool {
        matches!(
            self,
            TypeData::Operator {
                op: TypeOpKind::Implication,
                ..
            }
        )
    }
}
