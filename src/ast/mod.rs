//! AST node families (spec §3). Each family is a closed sum type matched
//! exhaustively by the evaluator/serializer rather than an open visitor
//! (spec §9, "Dynamic dispatch over AST node kinds") — the same choice the
//! teacher made representing `NodeType` as one large enum in `node.rs`.

pub mod css;
pub mod sass;

pub use css::{CssAtRule, CssDeclaration, CssNode, CssStatement, CssStylesheet};
pub use sass::{Expression, Statement, Stylesheet};
