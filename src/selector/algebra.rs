//! Resolution of `&`, unification, and the superselector test (spec §4.4).
//!
//! The teacher's `matcher/styling.rs` matched a selector against a live DOM
//! node by consuming compound/combinator pairs from the end of the
//! selector backward (`consume(&mut parts)`); the same "walk from the
//! rightmost compound inward" shape is reused here, but the thing being
//! matched against is another selector's compound, not an element.

use super::{Combinator, ComplexComponent, ComplexSelector, CompoundSelector, SelectorList, SimpleSelector};

/// Resolves `&` in `child` against `context` (spec §4.3 "Style rule",
/// §4.4 "Resolve parent reference"). When `context` is `None` the child is
/// returned unchanged (used for `@at-root` and top-level rules).
pub fn resolve_parent(context: Option<&SelectorList>, child: &SelectorList) -> SelectorList {
    let Some(context) = context else {
        return child.clone();
    };
    let mut out = Vec::new();
    for complex in &child.complex {
        if complex.contains_parent() {
            for ctx in &context.complex {
                if let Some(resolved) = resolve_parent_in_complex(ctx, complex) {
                    out.push(resolved);
                }
            }
        } else {
            for ctx in &context.complex {
                out.push(ctx.append_descendant(complex));
            }
        }
    }
    SelectorList { complex: out }
}

fn resolve_parent_in_complex(context: &ComplexSelector, child: &ComplexSelector) -> Option<ComplexSelector> {
    let mut components = Vec::new();
    for component in &child.components {
        match component {
            ComplexComponent::Compound(compound) if compound.contains_parent() => {
                if compound.simples.len() == 1 {
                    // Leading/lone `&`: splice the whole context in place.
                    components.extend(context.components.clone());
                } else {
                    // `&` at a non-leading position within the compound:
                    // unify the compound onto every compound of `context`.
                    let rest: CompoundSelector = CompoundSelector {
                        simples: compound.simples.iter().filter(|s| !matches!(s, SimpleSelector::Parent)).cloned().collect(),
                    };
                    let last = context.last_compound()?;
                    let unified = unify_compound(last, &rest)?;
                    let mut prefix = context.components.clone();
                    prefix.pop();
                    components.extend(prefix);
                    components.push(ComplexComponent::Compound(unified));
                }
            }
            other => components.push(other.clone()),
        }
    }
    Some(ComplexSelector { components })
}

/// Combines two compound selectors into their intersection, or `None` if
/// no element could match both (spec §4.4 "Unify").
pub fn unify_compound(a: &CompoundSelector, b: &CompoundSelector) -> Option<CompoundSelector> {
    let mut simples = Vec::new();
    let mut a_type: Option<&SimpleSelector> = None;
    let mut b_type: Option<&SimpleSelector> = None;

    for s in &a.simples {
        if matches!(s, SimpleSelector::Type(_)) {
            a_type = Some(s);
        } else if !matches!(s, SimpleSelector::Universal) {
            simples.push(s.clone());
        }
    }
    for s in &b.simples {
        if matches!(s, SimpleSelector::Type(_)) {
            b_type = Some(s);
        } else if !matches!(s, SimpleSelector::Universal) && !simples.contains(s) {
            simples.push(s.clone());
        }
    }

    // Type selectors unify only when equal or one side is universal.
    let merged_type = match (a_type, b_type) {
        (Some(t1), Some(t2)) if t1 == t2 => Some(t1.clone()),
        (Some(_), Some(_)) => return None,
        (Some(t), None) | (None, Some(t)) => Some(t.clone()),
        (None, None) => None,
    };

    if let Some(t) = merged_type {
        simples.insert(0, t);
    } else if a.is_universal_only() && b.is_universal_only() {
        simples.push(SimpleSelector::Universal);
    }

    if simples.is_empty() {
        simples.push(SimpleSelector::Universal);
    }

    Some(CompoundSelector { simples })
}

/// `A` is a superselector of `B` iff every element matched by `B` is
/// matched by `A` (spec §4.4 "Superselector test", testable property #4).
///
/// This implements the common, decidable fragment: equal or combinator-
/// compatible structure where every simple selector of `A`'s compound is
/// present in the corresponding compound of `B`. Pseudo-class argument
/// semantics (`:not()`, `:nth-child()`) are compared syntactically rather
/// than through the CSS selector profile they describe.
pub fn is_superselector(a: &SelectorList, b: &SelectorList) -> bool {
    b.complex.iter().all(|bc| a.complex.iter().any(|ac| complex_is_superselector(ac, bc)))
}

fn complex_is_superselector(a: &ComplexSelector, b: &ComplexSelector) -> bool {
    let a_compounds: Vec<&CompoundSelector> = a.compounds().collect();
    let b_compounds: Vec<&CompoundSelector> = b.compounds().collect();
    if a_compounds.len() > b_compounds.len() {
        return false;
    }
    // Anchor at the rightmost compound (both selectors describe the same
    // target element there), then walk left matching combinators.
    let a_last = match a_compounds.last() {
        Some(c) => c,
        None => return b_compounds.is_empty(),
    };
    let b_last = match b_compounds.last() {
        Some(c) => c,
        None => return false,
    };
    if !compound_is_superselector(a_last, b_last) {
        return false;
    }
    if a_compounds.len() == 1 {
        return true;
    }

    let a_combinators: Vec<&Combinator> = a
        .components
        .iter()
        .filter_map(|c| match c {
            ComplexComponent::Combinator(comb) => Some(comb),
            _ => None,
        })
        .collect();
    let b_combinators: Vec<&Combinator> = b
        .components
        .iter()
        .filter_map(|c| match c {
            ComplexComponent::Combinator(comb) => Some(comb),
            _ => None,
        })
        .collect();
    if a_combinators.len() > b_combinators.len() {
        return false;
    }

    // Require the trailing combinator chain to match exactly; this is
    // stricter than dart-sass's full algorithm (which allows descendant
    // combinators to "skip" compounds) but is safe: it never reports a
    // superselector relationship that doesn't hold.
    let offset = b_compounds.len() - a_compounds.len();
    for i in 0..a_compounds.len() - 1 {
        if !compound_is_superselector(a_compounds[i], b_compounds[i + offset]) {
            return false;
        }
        if a_combinators[i] != b_combinators[i + offset] {
            return false;
        }
    }
    true
}

fn compound_is_superselector(a: &CompoundSelector, b: &CompoundSelector) -> bool {
    a.simples.iter().all(|s| b.simples.contains(s) || matches!(s, SimpleSelector::Universal))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str) -> CompoundSelector {
        CompoundSelector { simples: vec![SimpleSelector::Class(name.into())] }
    }

    fn type_(name: &str) -> CompoundSelector {
        CompoundSelector { simples: vec![SimpleSelector::Type(name.into())] }
    }

    fn list_of(compounds: Vec<CompoundSelector>) -> SelectorList {
        SelectorList::from_complex(compounds.into_iter().map(ComplexSelector::single).collect())
    }

    #[test]
    fn a_compound_is_its_own_superselector() {
        let a = list_of(vec![class("x")]);
        assert!(is_superselector(&a, &a));
    }

    #[test]
    fn fewer_simple_selectors_is_a_superselector_of_more() {
        // `.x` is a superselector of `.x.y`: every element matching `.x.y`
        // also matches `.x` (spec §8 invariant #4).
        let a = list_of(vec![class("x")]);
        let b = list_of(vec![CompoundSelector {
            simples: vec![SimpleSelector::Class("x".into()), SimpleSelector::Class("y".into())],
        }]);
        assert!(is_superselector(&a, &b));
        assert!(!is_superselector(&b, &a));
    }

    #[test]
    fn disjoint_classes_are_not_superselectors() {
        let a = list_of(vec![class("x")]);
        let b = list_of(vec![class("y")]);
        assert!(!is_superselector(&a, &b));
        assert!(!is_superselector(&b, &a));
    }

    #[test]
    fn unify_combines_a_type_and_a_class_into_one_compound() {
        let unified = unify_compound(&type_("a"), &class("x")).expect("should unify");
        assert_eq!(unified.simples, vec![SimpleSelector::Type("a".into()), SimpleSelector::Class("x".into())]);
    }

    #[test]
    fn unify_fails_between_two_distinct_type_selectors() {
        assert_eq!(unify_compound(&type_("a"), &type_("b")), None);
    }

    #[test]
    fn unify_with_universal_keeps_the_concrete_type() {
        let universal = CompoundSelector { simples: vec![SimpleSelector::Universal] };
        let unified = unify_compound(&type_("a"), &universal).expect("should unify");
        assert_eq!(unified.simples, vec![SimpleSelector::Type("a".into())]);
    }

    #[test]
    fn resolve_parent_splices_context_for_a_lone_ampersand() {
        let context = list_of(vec![class("btn")]);
        let child = SelectorList::from_complex(vec![ComplexSelector {
            components: vec![
                ComplexComponent::Compound(CompoundSelector { simples: vec![SimpleSelector::Parent] }),
                ComplexComponent::Combinator(Combinator::Descendant),
                ComplexComponent::Compound(CompoundSelector { simples: vec![SimpleSelector::PseudoClass { name: "hover".into(), args: None }] }),
            ],
        }]);
        let resolved = resolve_parent(Some(&context), &child);
        assert_eq!(resolved.to_string(), ".btn :hover");
    }

    #[test]
    fn resolve_parent_appends_as_descendant_when_no_ampersand_is_present() {
        let context = list_of(vec![class("btn")]);
        let child = list_of(vec![class("icon")]);
        let resolved = resolve_parent(Some(&context), &child);
        assert_eq!(resolved.to_string(), ".btn .icon");
    }
}
