//! The CSS AST (spec §3): what the evaluator produces and the only tree the
//! extender and serializer see. Selector fields are wrapped in
//! `Rc<RefCell<_>>` so the extender can rewrite them in place and have the
//! change visible through every reference to the node (spec §9, "Shared
//! children in CSS AST mutated by the extender" — an interior-mutability
//! pattern in place of cloning subtrees, the arena-with-indices
//! alternative the design note also allows).

use crate::selector::SelectorList;
use crate::span::Span;
use crate::value::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct CssDeclaration {
    pub name: String,
    pub value: Value,
    pub important: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaFeature {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaQuery {
    pub modifier: Option<String>,
    pub media_type: Option<String>,
    pub features: Vec<MediaFeature>,
}

impl fmt::Display for MediaFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "({}: {})", self.name, v),
            None => write!(f, "({})", self.name),
        }
    }
}

impl fmt::Display for MediaQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote_anything = false;
        if let Some(modifier) = &self.modifier {
            write!(f, "{}", modifier)?;
            wrote_anything = true;
        }
        if let Some(media_type) = &self.media_type {
            if wrote_anything {
                write!(f, " ")?;
            }
            write!(f, "{}", media_type)?;
            wrote_anything = true;
        }
        for feature in &self.features {
            if wrote_anything {
                write!(f, " and ")?;
            }
            write!(f, "{}", feature)?;
            wrote_anything = true;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SupportsCondition {
    Declaration { property: String, value: String },
    Interpolation(String),
    Not(Box<SupportsCondition>),
    And(Vec<SupportsCondition>),
    Or(Vec<SupportsCondition>),
}

impl fmt::Display for SupportsCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupportsCondition::Declaration { property, value } => write!(f, "({}: {})", property, value),
            SupportsCondition::Interpolation(text) => write!(f, "{}", text),
            SupportsCondition::Not(inner) => write!(f, "not {}", parenthesize_supports(inner)),
            SupportsCondition::And(items) => write_supports_list(f, items, "and"),
            SupportsCondition::Or(items) => write_supports_list(f, items, "or"),
        }
    }
}

fn parenthesize_supports(cond: &SupportsCondition) -> String {
    match cond {
        SupportsCondition::Declaration { .. } | SupportsCondition::Interpolation(_) => cond.to_string(),
        _ => format!("({})", cond),
    }
}

fn write_supports_list(f: &mut fmt::Formatter<'_>, items: &[SupportsCondition], joiner: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", joiner)?;
        }
        write!(f, "{}", parenthesize_supports(item))?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeSelector {
    /// `"from"`, `"to"`, or a percentage like `"50%"`.
    pub value: String,
}

impl fmt::Display for KeyframeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CssAtRule {
    Media {
        queries: Vec<MediaQuery>,
    },
    Supports {
        condition: SupportsCondition,
    },
    Keyframes {
        name: String,
        vendor_prefix: Option<String>,
    },
    KeyframeBlock {
        selectors: Vec<KeyframeSelector>,
    },
    Unknown {
        name: String,
        prelude: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CssStatement {
    Root,
    AtRule(CssAtRule),
    StyleRule { selector: Rc<RefCell<SelectorList>> },
    Declaration(CssDeclaration),
    Comment(String),
    Import { url: String },
}

/// Where a CSS node's text came from in the original source, resolved to
/// line/column eagerly at emit time since the serializer no longer has
/// access to the [`crate::span::SourceFile`] that decoded it (spec §4.6,
/// source map builder).
#[derive(Debug, Clone, PartialEq)]
pub struct Origin {
    pub url: Rc<str>,
    pub line: u32,
    pub column: u32,
}

/// One node of the CSS tree. Children live behind `Rc<RefCell<_>>` rather
/// than owned directly, since extension can graft a rewritten selector
/// list shared by several rules and the serializer walks the same tree the
/// extender just edited.
#[derive(Debug, Clone)]
pub struct CssNode {
    pub statement: CssStatement,
    pub children: Rc<RefCell<Vec<CssNode>>>,
    pub span: Span,
    /// Canonicalized text of the nearest enclosing `@media`/`@supports`
    /// condition, used by the extender to scope extensions (spec §4.5,
    /// "Extensions ... are scoped").
    pub condition_scope: Option<Rc<str>>,
    /// Set by `Evaluator::emit` from whichever file is current when the
    /// node is produced. `None` for nodes synthesized by `@at-root`/the
    /// extender with no single originating position.
    pub origin: Option<Origin>,
    /// `false` only for an `@<unknown>` at-rule with no `{ }` body at all
    /// (e.g. `@unknown foo;`), so the serializer can tell it apart from one
    /// with an empty body (`@unknown foo {}`) — both have no children.
    pub has_block: bool,
}

impl CssNode {
    pub fn new(statement: CssStatement, span: Span) -> Self {
        Self {
            statement,
            children: Rc::new(RefCell::new(Vec::new())),
            span,
            condition_scope: None,
            origin: None,
            has_block: true,
        }
    }

    pub fn root(span: Span) -> Self {
        Self::new(CssStatement::Root, span)
    }

    pub fn push_child(&self, child: CssNode) {
        self.children.borrow_mut().push(child);
    }

    pub fn is_empty_rule(&self) -> bool {
        matches!(self.statement, CssStatement::StyleRule { .. }) && self.children.borrow().is_empty()
    }

    pub fn selector(&self) -> Option<Rc<RefCell<SelectorList>>> {
        match &self.statement {
            CssStatement::StyleRule { selector } => Some(selector.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CssStylesheet {
    pub root: CssNode,
}

impl CssStylesheet {
    pub fn new(root: CssNode) -> Self {
        Self { root }
    }
}
