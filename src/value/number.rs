//! Numbers with units (spec §3, "A number is a finite-precision rational").
//!
//! Represented as an `f64` magnitude plus two multisets of unit tokens
//! (numerators and denominators), the way CSS-level dimension handling in
//! the teacher's tokenizer kept a `value: Number, unit: String` pair but
//! generalized to support compound units (`px/s`, `deg*1`) and conversion.

use std::collections::BTreeMap;
use std::fmt;

/// Decimal digits of precision for equality and `inspect` formatting.
pub const PRECISION: i32 = 10;

/// A multiset of unit names, e.g. `{"px": 1}` or `{"px": 1, "s": 1}`.
pub type UnitSet = BTreeMap<String, i32>;

#[derive(Debug, Clone)]
pub struct SassNumber {
    pub value: f64,
    pub numerators: Vec<String>,
    pub denominators: Vec<String>,
    /// Set when the literal had `as-slash` notation (`1/2`), preserved only
    /// for `inspect`/stringification of the original list-like slash value.
    pub as_slash: Option<(Box<SassNumber>, Box<SassNumber>)>,
}

impl SassNumber {
    pub fn unitless(value: f64) -> Self {
        Self {
            value,
            numerators: Vec::new(),
            denominators: Vec::new(),
            as_slash: None,
        }
    }

    pub fn with_unit(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            numerators: vec![unit.into()],
            denominators: Vec::new(),
            as_slash: None,
        }
    }

    pub fn is_unitless(&self) -> bool {
        self.numerators.is_empty() && self.denominators.is_empty()
    }

    /// A "simple-unit" number has exactly one numerator and no denominator.
    pub fn is_simple_unit(&self) -> bool {
        self.numerators.len() == 1 && self.denominators.is_empty()
    }

    pub fn unit(&self) -> Option<&str> {
        if self.is_simple_unit() {
            Some(&self.numerators[0])
        } else {
            None
        }
    }

    fn reduced_units(&self) -> (Vec<String>, Vec<String>) {
        let mut nums = self.numerators.clone();
        let mut dens = self.denominators.clone();
        let mut i = 0;
        while i < nums.len() {
            if let Some(j) = dens.iter().position(|d| units_equal(d, &nums[i])) {
                nums.remove(i);
                dens.remove(j);
            } else {
                i += 1;
            }
        }
        nums.sort();
        dens.sort();
        (nums, dens)
    }

    /// Converts this number's magnitude into the given compatible unit
    /// vectors, or `None` if the unit families don't match.
    pub fn value_in(&self, numerators: &[String], denominators: &[String]) -> Option<f64> {
        let (my_n, my_d) = self.reduced_units();
        let mut factor = 1.0;
        factor *= conversion_factor_product(&my_n, numerators)?;
        factor /= conversion_factor_product(&my_d, denominators)?;
        Some(self.value * factor)
    }

    pub fn compatible_with(&self, other: &SassNumber) -> bool {
        self.value_in(&other.numerators, &other.denominators).is_some()
    }

    pub fn add(&self, other: &SassNumber) -> Result<SassNumber, String> {
        if self.is_unitless() && other.is_unitless() {
            return Ok(SassNumber::unitless(self.value + other.value));
        }
        let converted = other
            .value_in(&self.numerators, &self.denominators)
            .ok_or_else(|| incompatible_units(self, other))?;
        Ok(SassNumber {
            value: self.value + converted,
            numerators: self.numerators.clone(),
            denominators: self.denominators.clone(),
            as_slash: None,
        })
    }

    pub fn sub(&self, other: &SassNumber) -> Result<SassNumber, String> {
        let negated = SassNumber {
            value: -other.value,
            numerators: other.numerators.clone(),
            denominators: other.denominators.clone(),
            as_slash: None,
        };
        self.add(&negated)
    }

    pub fn mul(&self, other: &SassNumber) -> SassNumber {
        let mut numerators = self.numerators.clone();
        numerators.extend(other.numerators.clone());
        let mut denominators = self.denominators.clone();
        denominators.extend(other.denominators.clone());
        let mut result = SassNumber {
            value: self.value * other.value,
            numerators,
            denominators,
            as_slash: None,
        };
        let (n, d) = result.reduced_units();
        result.numerators = n;
        result.denominators = d;
        result
    }

    pub fn div(&self, other: &SassNumber) -> SassNumber {
        let mut numerators = self.numerators.clone();
        numerators.extend(other.denominators.clone());
        let mut denominators = self.denominators.clone();
        denominators.extend(other.numerators.clone());
        let mut result = SassNumber {
            value: self.value / other.value,
            numerators,
            denominators,
            as_slash: None,
        };
        let (n, d) = result.reduced_units();
        result.numerators = n;
        result.denominators = d;
        result
    }

    pub fn rem(&self, other: &SassNumber) -> Result<SassNumber, String> {
        let converted = other
            .value_in(&self.numerators, &self.denominators)
            .ok_or_else(|| incompatible_units(self, other))?;
        Ok(SassNumber {
            value: self.value % converted,
            numerators: self.numerators.clone(),
            denominators: self.denominators.clone(),
            as_slash: None,
        })
    }

    pub fn neg(&self) -> SassNumber {
        SassNumber {
            value: -self.value,
            numerators: self.numerators.clone(),
            denominators: self.denominators.clone(),
            as_slash: None,
        }
    }

    /// Rounded to [`PRECISION`] fractional digits, the tolerance equality
    /// and serialization both use.
    pub fn rounded(&self) -> f64 {
        let factor = 10f64.powi(PRECISION);
        (self.value * factor).round() / factor
    }

    pub fn require_unitless(&self, context: &str) -> Result<(), String> {
        if self.is_unitless() {
            Ok(())
        } else {
            Err(format!("{} must be unitless", context))
        }
    }

    pub fn require_unit(&self, unit: &str, context: &str) -> Result<(), String> {
        if self.unit().map(|u| units_equal(u, unit)).unwrap_or(false) {
            Ok(())
        } else {
            Err(format!("{} must have unit {:?}", context, unit))
        }
    }

    /// Integer value iff the number is an integer within precision, used by
    /// `@for`/`@each`/list-index functions.
    pub fn as_integer(&self) -> Option<i64> {
        let r = self.rounded();
        if (r - r.trunc()).abs() < 1e-9 {
            Some(r.trunc() as i64)
        } else {
            None
        }
    }
}

fn incompatible_units(a: &SassNumber, b: &SassNumber) -> String {
    format!("{} and {} are incompatible", a, b)
}

impl PartialEq for SassNumber {
    fn eq(&self, other: &Self) -> bool {
        match self.value_in(&other.numerators, &other.denominators) {
            Some(converted) => {
                let factor = 10f64.powi(PRECISION);
                (converted * factor).round() == (other.value * factor).round()
            }
            None => false,
        }
    }
}

impl fmt::Display for SassNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_number(self.rounded()))?;
        if !self.numerators.is_empty() || !self.denominators.is_empty() {
            write!(f, "{}", self.unit_suffix())?;
        }
        Ok(())
    }
}

impl SassNumber {
    /// CSS-legal unit suffix; a purely-denominator unit only ever appears
    /// here when inspecting, never in emitted CSS (callers check that).
    pub fn unit_suffix(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.numerators.join("*"));
        if !self.denominators.is_empty() {
            out.push_str("/");
            out.push_str(&self.denominators.join("/"));
        }
        out
    }
}

pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let mut s = format!("{:.*}", PRECISION as usize, value);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}

/// Two unit names in the same conversion family (case-sensitive per CSS).
fn units_equal(a: &str, b: &str) -> bool {
    a == b || conversion_factor(a, b).is_some()
}

/// Factor to multiply a value with unit `from` by to get the equivalent
/// value in unit `to`, or `None` if the units aren't in the same family.
fn conversion_factor(from: &str, to: &str) -> Option<f64> {
    if from == to {
        return Some(1.0);
    }
    let families: &[&[(&str, f64)]] = &[
        // length, canonicalized to px
        &[
            ("px", 1.0),
            ("in", 96.0),
            ("cm", 96.0 / 2.54),
            ("mm", 96.0 / 25.4),
            ("q", 96.0 / 101.6),
            ("pt", 96.0 / 72.0),
            ("pc", 16.0),
        ],
        // angle, canonicalized to deg
        &[
            ("deg", 1.0),
            ("grad", 0.9),
            ("rad", 180.0 / std::f64::consts::PI),
            ("turn", 360.0),
        ],
        // time, canonicalized to s
        &[("s", 1.0), ("ms", 0.001)],
        // frequency, canonicalized to Hz
        &[("hz", 1.0), ("khz", 1000.0)],
        // resolution, canonicalized to dpi
        &[("dpi", 1.0), ("dpcm", 2.54), ("dppx", 96.0), ("x", 96.0)],
    ];
    for family in families {
        let f = family.iter().find(|(u, _)| u.eq_ignore_ascii_case(from));
        let t = family.iter().find(|(u, _)| u.eq_ignore_ascii_case(to));
        if let (Some((_, fv)), Some((_, tv))) = (f, t) {
            return Some(fv / tv);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addition_is_commutative_across_compatible_units() {
        // spec §8 invariant #2.
        let a = SassNumber::with_unit(1.0, "in");
        let b = SassNumber::with_unit(96.0, "px");
        assert_eq!(a.add(&b).unwrap(), b.add(&a).unwrap());
    }

    #[test]
    fn one_inch_equals_ninety_six_pixels() {
        let inches = SassNumber::with_unit(1.0, "in");
        let pixels = SassNumber::with_unit(96.0, "px");
        assert_eq!(inches, pixels);
    }

    #[test]
    fn multiply_then_divide_by_the_same_simple_unit_is_a_no_op() {
        // spec §8 invariant #3: n * (1 u) / (1 u) == n.
        let n = SassNumber::with_unit(5.0, "px");
        let one_px = SassNumber::with_unit(1.0, "px");
        let result = n.mul(&one_px).div(&one_px);
        assert!(result.is_unitless());
        assert_eq!(result.value, 5.0);
    }

    #[test]
    fn incompatible_units_cannot_add() {
        let a = SassNumber::with_unit(1.0, "px");
        let b = SassNumber::with_unit(1.0, "deg");
        assert!(a.add(&b).is_err());
    }

    #[test]
    fn division_cancels_a_shared_denominator_unit() {
        let speed = SassNumber { value: 10.0, numerators: vec!["px".into()], denominators: vec!["s".into()], as_slash: None };
        let time = SassNumber::with_unit(2.0, "s");
        let distance = speed.mul(&time);
        assert!(!distance.is_unitless());
        assert_eq!(distance.unit(), Some("px"));
        assert_eq!(distance.value, 20.0);
    }

    #[test]
    fn format_number_elides_leading_zero_trailing_zeros() {
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(0.0), "0");
    }
}

fn conversion_factor_product(from: &[String], to: &[String]) -> Option<f64> {
    if from.len() != to.len() {
        // Best-effort: only exact family-for-family matches are supported,
        // mirroring Sass's behavior of rejecting mismatched compound units.
        if from.is_empty() && to.is_empty() {
            return Some(1.0);
        }
        return None;
    }
    if from.is_empty() {
        return Some(1.0);
    }
    // Match greedily; compound units in practice are at most two deep
    // (e.g. `px/s`), so this avoids a full bipartite matching algorithm.
    let mut remaining: Vec<&String> = to.iter().collect();
    let mut factor = 1.0;
    for f in from {
        let pos = remaining
            .iter()
            .position(|t| conversion_factor(f, t).is_some())?;
        let t = remaining.remove(pos);
        factor *= conversion_factor(f, t)?;
    }
    Some(factor)
}
