//! Evaluator-specific scope bits that don't belong in [`crate::module`]:
//! the content-block register and per-call argument frames (spec §4.3,
//! "a content-block register for the currently executing mixin").

use crate::ast::sass::{ArgumentList, Statement};
use crate::module::Scope;
use std::rc::Rc;

/// A `{ ... }` block passed to `@include`, captured together with the
/// scope it closes over so `@content` can run it later with its own
/// lexical environment restored (spec §4.3, "`@content` ... emits the
/// block with its own lexical scope").
#[derive(Clone)]
pub struct ContentBlock {
    pub body: Rc<[Statement]>,
    pub closure: Scope,
}

/// Bound arguments passed to `@content(...)`, exposed to the block's
/// body the same way a mixin's own parameters would be.
#[derive(Clone, Default)]
pub struct ContentArgs {
    pub arguments: ArgumentList,
}
