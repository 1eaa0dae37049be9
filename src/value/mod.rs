//! The Value sum type (spec §3): the closed set of runtime Sass values.

pub mod calculation;
pub mod color;
pub mod number;

pub use calculation::Calculation;
pub use color::SassColor;
pub use number::SassNumber;

use crate::selector::SelectorList;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSeparator {
    Comma,
    Space,
    Slash,
    /// A single-element or empty list has no meaningful separator yet; it
    /// takes on whichever separator it's first combined with.
    Undecided,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SassList {
    pub separator: ListSeparator,
    pub bracketed: bool,
    pub elements: Vec<Value>,
}

impl SassList {
    pub fn new(separator: ListSeparator, bracketed: bool, elements: Vec<Value>) -> Self {
        Self {
            separator,
            bracketed,
            elements,
        }
    }

    pub fn empty() -> Self {
        Self::new(ListSeparator::Undecided, false, Vec::new())
    }
}

/// Sass maps keep insertion order and compare keys by value equality, so a
/// plain ordered vector stands in for the hash map `indexmap` gives the
/// rest of the crate — `Value` isn't `Hash` because numbers and colors
/// compare with a tolerance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SassMap {
    pub pairs: Vec<(Value, Value)>,
}

impl SassMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn insert(&mut self, key: Value, value: Value) {
        if let Some(existing) = self.pairs.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = value;
        } else {
            self.pairs.push((key, value));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quotes {
    Quoted,
    Unquoted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SassString {
    pub text: String,
    pub quotes: Quotes,
}

impl SassString {
    pub fn quoted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quotes: Quotes::Quoted,
        }
    }

    pub fn unquoted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quotes: Quotes::Unquoted,
        }
    }
}

/// First-class function reference: either defined within the core's
/// built-in library or registered by an embedder (spec §9, "First-class
/// functions across host boundaries").
#[derive(Clone)]
pub enum SassFunction {
    Builtin {
        name: Rc<str>,
        module: Option<Rc<str>>,
    },
    UserDefined(Rc<crate::ast::sass::FunctionDecl>),
    Host(Rc<str>),
}

impl fmt::Debug for SassFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SassFunction({})", self.name())
    }
}

impl PartialEq for SassFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl SassFunction {
    pub fn name(&self) -> &str {
        match self {
            SassFunction::Builtin { name, .. } => name,
            SassFunction::UserDefined(decl) => &decl.name,
            SassFunction::Host(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(SassNumber),
    String(SassString),
    Color(SassColor),
    List(SassList),
    Map(SassMap),
    Function(SassFunction),
    Calculation(Calculation),
    Selector(SelectorList),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Color(_) => "color",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Function(_) => "function",
            Value::Calculation(_) => "calculation",
            Value::Selector(_) => "selector",
        }
    }

    pub fn quoted_string(text: impl Into<String>) -> Self {
        Value::String(SassString::quoted(text))
    }

    pub fn unquoted_string(text: impl Into<String>) -> Self {
        Value::String(SassString::unquoted(text))
    }

    /// Used when eliding empty declarations (spec §4.3, "Declaration").
    pub fn is_empty_unquoted_string(&self) -> bool {
        matches!(self, Value::String(s) if s.quotes == Quotes::Unquoted && s.text.is_empty())
    }

    /// List view used by `@each` and list built-ins: a bare value acts like
    /// a one-element, space-separated list.
    pub fn as_list_elements(&self) -> Vec<Value> {
        match self {
            Value::List(list) => list.elements.clone(),
            other => vec![other.clone()],
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => match s.quotes {
                Quotes::Quoted => write!(f, "\"{}\"", s.text.replace('\\', "\\\\").replace('"', "\\\"")),
                Quotes::Unquoted => write!(f, "{}", s.text),
            },
            Value::Color(c) => {
                if let Some(name) = c.to_name() {
                    write!(f, "{}", name)
                } else if c.alpha >= 1.0 {
                    write!(
                        f,
                        "#{:02x}{:02x}{:02x}",
                        c.red.round() as u8,
                        c.green.round() as u8,
                        c.blue.round() as u8
                    )
                } else {
                    write!(
                        f,
                        "rgba({}, {}, {}, {})",
                        c.red.round(),
                        c.green.round(),
                        c.blue.round(),
                        number::format_number(c.alpha)
                    )
                }
            }
            Value::List(list) => {
                let sep = match list.separator {
                    ListSeparator::Comma => ", ",
                    ListSeparator::Space | ListSeparator::Undecided => " ",
                    ListSeparator::Slash => "/",
                };
                if list.bracketed {
                    write!(f, "[")?;
                }
                for (i, el) in list.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", sep)?;
                    }
                    write!(f, "{}", el)?;
                }
                if list.bracketed {
                    write!(f, "]")?;
                }
                Ok(())
            }
            Value::Map(map) => {
                write!(f, "(")?;
                for (i, (k, v)) in map.pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, ")")
            }
            Value::Function(func) => write!(f, "get-function(\"{}\")", func.name()),
            Value::Calculation(calc) => write!(f, "{}", calc),
            Value::Selector(sel) => write!(f, "{}", sel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn an_opaque_color_with_a_css_name_renders_as_that_name() {
        let red = Value::Color(SassColor::rgb(255.0, 0.0, 0.0, 1.0));
        assert_eq!(red.to_string(), "red");
    }

    #[test]
    fn an_opaque_color_with_no_css_name_renders_as_a_hex_triple() {
        let c = Value::Color(SassColor::rgb(18.0, 52.0, 86.0, 1.0));
        assert_eq!(c.to_string(), "#123456");
    }

    #[test]
    fn a_translucent_color_renders_as_rgba_even_when_its_rgb_has_a_name() {
        let c = Value::Color(SassColor::rgb(255.0, 0.0, 0.0, 0.5));
        assert_eq!(c.to_string(), "rgba(255, 0, 0, 0.5)");
    }

    #[test]
    fn a_quoted_string_escapes_embedded_quotes_and_backslashes() {
        let s = Value::String(SassString::quoted(r#"a"b\c"#));
        assert_eq!(s.to_string(), r#""a\"b\\c""#);
    }

    #[test]
    fn a_comma_list_joins_with_comma_space() {
        let list = Value::List(SassList::new(ListSeparator::Comma, false, vec![Value::unquoted_string("a"), Value::unquoted_string("b")]));
        assert_eq!(list.to_string(), "a, b");
    }

    #[test]
    fn a_bracketed_space_list_keeps_its_brackets() {
        let list = Value::List(SassList::new(ListSeparator::Space, true, vec![Value::unquoted_string("a"), Value::unquoted_string("b")]));
        assert_eq!(list.to_string(), "[a b]");
    }

    #[test]
    fn null_is_falsy_and_everything_else_is_truthy_except_false() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Number(SassNumber::unitless(0.0)).is_truthy());
    }
}
