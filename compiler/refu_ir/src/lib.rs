//! Core data structures for the refu compiler:
//! - Spans for source locations
//! - Hash-interned string tables for identifiers and literals
//! - Tokens and `TokenList` for lexer output
//! - The AST arena and the node state machine
//!
//! # Design Philosophy
//!
//! - **Intern everything**: identifiers and string literals become
//!   `StrId` (the 32-bit content hash), types become `TypeRef` (u32).
//! - **Flatten everything**: no `Box<AstNode>`; nodes live in an arena
//!   and reference each other through `NodeId` indices.
//!
//! Types that contain floats store them as u64 bits so token and AST
//! equality stays derivable.

mod ast;
mod constants;
mod span;
mod strings;
mod token;
mod type_ref;

pub use ast::{
    Ast, AstKind, AstNode, BinaryOpKind, NodeId, NodeState, TypeOpKind,
};
pub use constants::Constant;
pub use span::Span;
pub use strings::{HashCollision, StrId, StringTable};
pub use token::{FloatBits, Token, TokenKind, TokenList};
pub use type_ref::TypeRef;
