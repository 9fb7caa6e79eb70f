//! Type system for the refu compiler.
//!
//! Semantic types are canonical, hash-consed entries in a per-module
//! [`TypeSet`], referenced by `TypeRef` indices. Elementary types are
//! pre-interned at fixed indices shared by every set; composite types are
//! created on demand from AST type descriptions and deduplicated under
//! generic-permissive structural comparison.

mod compare;
mod data;
mod elementary;
mod error;
mod set;

pub use compare::{MatchCtx, TypeCmp};
pub use data::TypeData;
pub use elementary::{ElemFlags, ElementaryKind};
pub use error::TypeError;
pub use set::{generic_param_names, TypeSet, FIRST_DYNAMIC};

pub use refu_ir::TypeRef;
