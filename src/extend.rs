//! The `@extend` engine (spec §4.5): once the whole CSS tree has been
//! produced, rewrite every selector occurrence that matches a registered
//! extendee to include the extender as well.
//!
//! Walks the finished CSS tree the way the teacher's `walker.rs` walks a
//! parse tree — recursive descent over `Rc<RefCell<Vec<CssNode>>>`
//! children — except here the visit mutates selectors in place via the
//! same interior mutability the evaluator already set up for this purpose
//! (`CssStatement::StyleRule`'s `Rc<RefCell<SelectorList>>`, spec §9).

use crate::ast::css::{CssNode, CssStatement};
use crate::error::SassRuntimeException;
use crate::selector::algebra::unify_compound;
use crate::selector::{Combinator, ComplexComponent, ComplexSelector, CompoundSelector, SelectorList};
use crate::span::FileSpan;
use std::cell::RefCell;
use std::rc::Rc;

struct Extension {
    extender: SelectorList,
    extendee: SelectorList,
    optional: bool,
    span: FileSpan,
    condition_scope: Option<Rc<str>>,
    matched: bool,
}

/// Append-only record of every `@extend` seen during evaluation, plus the
/// index used to apply them once evaluation is done.
#[derive(Default)]
pub struct Extender {
    extensions: Vec<Extension>,
}

impl Extender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_extension(&mut self, extender: SelectorList, extendee: SelectorList, optional: bool, span: FileSpan, condition_scope: Option<Rc<str>>) {
        self.extensions.push(Extension { extender, extendee, optional, span, condition_scope, matched: false });
    }

    /// Rewrites every matching selector occurrence in the tree rooted at
    /// `root_children`, iterating to a fixed point so extend chains compose
    /// transitively (spec §4.5: "if A extends B and B extends C, then A
    /// also extends C"). Fails if a non-optional extension never matched
    /// anything by the time the document is done.
    pub fn finish(&mut self, root_children: &Rc<RefCell<Vec<CssNode>>>) -> Result<(), SassRuntimeException> {
        if self.extensions.is_empty() {
            return Ok(());
        }
        for _ in 0..=self.extensions.len() {
            let mut changed = false;
            for child in root_children.borrow().iter() {
                self.apply_pass(child, &mut changed);
            }
            if !changed {
                break;
            }
        }
        for ext in &self.extensions {
            if !ext.optional && !ext.matched {
                return Err(SassRuntimeException::new(
                    format!("\"{}\" failed to @extend \"{}\".\nThe selector \"{}\" was not found.", ext.extender, ext.extendee, ext.extendee),
                    ext.span.clone(),
                ));
            }
        }
        Ok(())
    }

    fn apply_pass(&mut self, node: &CssNode, changed: &mut bool) {
        if let CssStatement::StyleRule { selector } = &node.statement {
            for idx in 0..self.extensions.len() {
                if !condition_matches(&self.extensions[idx].condition_scope, &node.condition_scope) {
                    continue;
                }
                let targets = target_compounds(&self.extensions[idx].extendee);
                let extender_list = self.extensions[idx].extender.clone();
                let mut additions = Vec::new();
                {
                    let list = selector.borrow();
                    for complex in &list.complex {
                        for target in &targets {
                            if let Some(new_complexes) = try_extend_complex(complex, target, &extender_list) {
                                additions.extend(new_complexes);
                            }
                        }
                    }
                }
                if !additions.is_empty() {
                    self.extensions[idx].matched = true;
                    let mut list = selector.borrow_mut();
                    for complex in additions {
                        if !list.complex.contains(&complex) {
                            list.complex.push(complex);
                            *changed = true;
                        }
                    }
                }
            }
        }
        for child in node.children.borrow().iter() {
            self.apply_pass(child, changed);
        }
    }
}

fn condition_matches(extension_scope: &Option<Rc<str>>, node_scope: &Option<Rc<str>>) -> bool {
    match (extension_scope, node_scope) {
        (None, _) => true,
        (Some(a), Some(b)) => a == b,
        (Some(_), None) => false,
    }
}

fn target_compounds(list: &SelectorList) -> Vec<CompoundSelector> {
    list.complex.iter().filter_map(|c| c.last_compound().cloned()).collect()
}

/// If `complex` contains a compound that is at least as specific as
/// `target` (a superset of its simple selectors), returns the new complex
/// selectors produced by unifying what's left with every complex selector
/// in the extender's list.
fn try_extend_complex(complex: &ComplexSelector, target: &CompoundSelector, extender_list: &SelectorList) -> Option<Vec<ComplexSelector>> {
    let mut results = Vec::new();
    for (idx, component) in complex.components.iter().enumerate() {
        let ComplexComponent::Compound(c) = component else { continue };
        if !contains_all_simples(c, target) {
            continue;
        }
        let remainder = remainder_compound(c, target);
        for e_complex in &extender_list.complex {
            if let Some(new_complex) = splice_extension(complex, idx, &remainder, e_complex) {
                results.push(new_complex);
            }
        }
    }
    if results.is_empty() {
        None
    } else {
        Some(results)
    }
}

fn contains_all_simples(c: &CompoundSelector, target: &CompoundSelector) -> bool {
    target.simples.iter().all(|s| c.simples.contains(s))
}

fn remainder_compound(c: &CompoundSelector, target: &CompoundSelector) -> CompoundSelector {
    let simples: Vec<_> = c.simples.iter().filter(|s| !target.simples.contains(s)).cloned().collect();
    if simples.is_empty() {
        CompoundSelector { simples: vec![crate::selector::SimpleSelector::Universal] }
    } else {
        CompoundSelector { simples }
    }
}

fn splice_extension(complex: &ComplexSelector, idx: usize, remainder: &CompoundSelector, e_complex: &ComplexSelector) -> Option<ComplexSelector> {
    let e_last = e_complex.last_compound()?;
    let unified = unify_compound(remainder, e_last)?;
    let mut components = complex.components[..idx].to_vec();
    let e_prefix_end = e_complex.components.iter().rposition(|c| matches!(c, ComplexComponent::Compound(_))).unwrap_or(0);
    let e_prefix = &e_complex.components[..e_prefix_end];
    if !components.is_empty() && !e_prefix.is_empty() {
        components.push(ComplexComponent::Combinator(Combinator::Descendant));
    }
    components.extend(e_prefix.iter().cloned());
    components.push(ComplexComponent::Compound(unified));
    components.extend(complex.components[idx + 1..].iter().cloned());
    Some(ComplexSelector { components })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::css::CssNode;
    use crate::selector::SimpleSelector;
    use crate::span::{SourceFile, Span};

    fn dummy_span() -> FileSpan {
        FileSpan::new(SourceFile::new("test.scss", ""), Span::point(0))
    }

    fn single(simples: Vec<SimpleSelector>) -> SelectorList {
        SelectorList::from_complex(vec![ComplexSelector::single(CompoundSelector { simples })])
    }

    fn style_rule(selector: SelectorList) -> CssNode {
        CssNode::new(CssStatement::StyleRule { selector: Rc::new(RefCell::new(selector)) }, Span::point(0))
    }

    #[test]
    fn extending_a_matching_placeholder_adds_the_extender_to_the_selector_list() {
        let placeholder = single(vec![SimpleSelector::Placeholder("p".into())]);
        let extender = single(vec![SimpleSelector::Class("err".into())]);
        let mut ext = Extender::new();
        ext.add_extension(extender, placeholder.clone(), false, dummy_span(), None);

        let rule = style_rule(placeholder);
        let root = Rc::new(RefCell::new(vec![rule]));
        ext.finish(&root).expect("extension should match");

        let rewritten = root.borrow();
        let CssStatement::StyleRule { selector } = &rewritten[0].statement else { unreachable!() };
        assert_eq!(selector.borrow().to_string(), "%p, .err");
    }

    #[test]
    fn a_required_extension_matching_nothing_is_a_compile_error() {
        let placeholder = single(vec![SimpleSelector::Placeholder("unused".into())]);
        let extender = single(vec![SimpleSelector::Class("err".into())]);
        let mut ext = Extender::new();
        ext.add_extension(extender, placeholder, false, dummy_span(), None);

        let root = Rc::new(RefCell::new(vec![style_rule(single(vec![SimpleSelector::Class("other".into())]))]));
        assert!(ext.finish(&root).is_err());
    }

    #[test]
    fn an_optional_extension_matching_nothing_is_silently_dropped() {
        // spec §8 invariant #5: with `!optional`, a non-matching extend
        // succeeds and leaves the CSS exactly as if it had been deleted.
        let placeholder = single(vec![SimpleSelector::Placeholder("unused".into())]);
        let extender = single(vec![SimpleSelector::Class("err".into())]);
        let mut ext = Extender::new();
        ext.add_extension(extender, placeholder, true, dummy_span(), None);

        let original = single(vec![SimpleSelector::Class("other".into())]);
        let root = Rc::new(RefCell::new(vec![style_rule(original.clone())]));
        ext.finish(&root).expect("optional extension should not error");

        let rewritten = root.borrow();
        let CssStatement::StyleRule { selector } = &rewritten[0].statement else { unreachable!() };
        assert_eq!(*selector.borrow(), original);
    }

    #[test]
    fn extensions_scoped_to_different_media_conditions_do_not_cross_over() {
        let placeholder = single(vec![SimpleSelector::Placeholder("p".into())]);
        let extender = single(vec![SimpleSelector::Class("err".into())]);
        let mut ext = Extender::new();
        ext.add_extension(extender, placeholder.clone(), true, dummy_span(), Some(Rc::from("@media (min-width: 1px)")));

        let mut rule = style_rule(placeholder);
        rule.condition_scope = Some(Rc::from("@media (min-width: 2px)"));
        let original = rule.selector().unwrap();
        let root = Rc::new(RefCell::new(vec![rule]));
        ext.finish(&root).expect("optional, scoped extension should not error");

        assert_eq!(original.borrow().complex.len(), 1);
    }
}
