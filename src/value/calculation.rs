//! `calc()`/`min()`/`max()`/`clamp()` as an unevaluated structure (spec §3).
//!
//! Calculations are carried through the evaluator without being reduced to
//! a single number, since CSS consumers (not Sass) resolve `var()` and
//! viewport-relative terms at paint time.

use super::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    pub name: String,
    pub arguments: Vec<CalcArg>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalcArg {
    Value(Value),
    Operation(Box<CalcArg>, CalcOp, Box<CalcArg>),
    Interpolation(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalcOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for CalcOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CalcOp::Add => "+",
            CalcOp::Sub => "-",
            CalcOp::Mul => "*",
            CalcOp::Div => "/",
        })
    }
}

impl fmt::Display for Calculation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for CalcArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcArg::Value(v) => write!(f, "{}", v),
            CalcArg::Operation(l, op, r) => write!(f, "{} {} {}", l, op, r),
            CalcArg::Interpolation(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SassNumber;

    fn num(n: f64) -> CalcArg {
        CalcArg::Value(Value::Number(SassNumber::unitless(n)))
    }

    #[test]
    fn calc_renders_its_single_argument_without_surrounding_operators() {
        let c = Calculation { name: "calc".to_string(), arguments: vec![num(10.0)] };
        assert_eq!(c.to_string(), "calc(10)");
    }

    #[test]
    fn nested_operations_render_with_surrounding_spaces() {
        let op = CalcArg::Operation(Box::new(num(1.0)), CalcOp::Add, Box::new(num(2.0)));
        let c = Calculation { name: "calc".to_string(), arguments: vec![op] };
        assert_eq!(c.to_string(), "calc(1 + 2)");
    }

    #[test]
    fn min_joins_multiple_arguments_with_a_comma() {
        let c = Calculation { name: "min".to_string(), arguments: vec![num(1.0), num(2.0)] };
        assert_eq!(c.to_string(), "min(1, 2)");
    }

    #[test]
    fn an_unresolved_var_term_passes_through_as_raw_text() {
        let c = Calculation { name: "calc".to_string(), arguments: vec![CalcArg::Interpolation("var(--gap)".to_string())] };
        assert_eq!(c.to_string(), "calc(var(--gap))");
    }
}
