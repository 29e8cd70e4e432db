//! CSS selector matching engine.
//! Spec: <https://www.w3.org/TR/selectors-4/>

use crate::{
    Combinator, ComplexSelector, CompoundSelector, ElementAdapter, PseudoClass, PseudoElement,
    SelectorList, SimpleSelector,
};
use core::iter;

/// Match a selector list against an element.
///
/// `pseudo` selects the pseudo-element being styled; `None` means the element itself.
/// Spec: Section 4.1
pub fn matches_selector_list<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    list: &SelectorList,
    pseudo: Option<PseudoElement>,
) -> bool {
    list.selectors
        .iter()
        .any(|selector_item| matches_complex(adapter, element, selector_item, pseudo))
}

/// Match a complex selector against an element.
///
/// The subject compound must target exactly `pseudo`; pseudo-elements anywhere else
/// make the selector invalid, so it never matches.
/// Spec: Section 3.1, 16 — Right-to-left matching strategy
pub fn matches_complex<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    sel: &ComplexSelector,
    pseudo: Option<PseudoElement>,
) -> bool {
    if sel.subject().pseudo_element() != pseudo {
        return false;
    }
    let misplaced_pseudo = iter::once(&sel.first)
        .chain(sel.rest.iter().map(|pair| &pair.1))
        .take(sel.rest.len())
        .any(|compound| compound.pseudo_element().is_some());
    if misplaced_pseudo {
        return false;
    }
    if !matches_compound(adapter, element, sel.subject()) {
        return false;
    }
    matches_leftward(adapter, element, sel, sel.rest.len())
}

/// The compound at `position`, where 0 is `sel.first` and `n` is `sel.rest[n - 1]`.
fn compound_at(sel: &ComplexSelector, position: usize) -> Option<&CompoundSelector> {
    if position == 0 {
        Some(&sel.first)
    } else {
        sel.rest.get(position - 1).map(|pair| &pair.1)
    }
}

/// Having matched the compound at `position` against `element`, match everything left of it.
/// Backtracks over descendant and general-sibling candidates.
/// Spec: Section 16 — Combinators
fn matches_leftward<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    sel: &ComplexSelector,
    position: usize,
) -> bool {
    if position == 0 {
        return true;
    }
    let Some((combinator, _)) = sel.rest.get(position - 1) else {
        return false;
    };
    let Some(left) = compound_at(sel, position - 1) else {
        return false;
    };
    let candidate_matches = |candidate: A::Handle| {
        matches_compound(adapter, candidate, left)
            && matches_leftward(adapter, candidate, sel, position - 1)
    };
    match combinator {
        Combinator::Descendant => {
            let mut current_parent = adapter.parent(element);
            while let Some(ancestor_element) = current_parent {
                if candidate_matches(ancestor_element) {
                    return true;
                }
                current_parent = adapter.parent(ancestor_element);
            }
            false
        }
        Combinator::Child => adapter.parent(element).is_some_and(candidate_matches),
        Combinator::AdjacentSibling => adapter
            .previous_sibling_element(element)
            .is_some_and(candidate_matches),
        Combinator::GeneralSibling => {
            let mut current_sibling = adapter.previous_sibling_element(element);
            while let Some(sibling_element) = current_sibling {
                if candidate_matches(sibling_element) {
                    return true;
                }
                current_sibling = adapter.previous_sibling_element(sibling_element);
            }
            false
        }
    }
}

/// Match a compound selector against a single element.
///
/// Pseudo-element components are ignored here; `matches_complex` checks them.
/// Spec: Section 5–6, 14
pub fn matches_compound<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    compound: &CompoundSelector,
) -> bool {
    compound
        .simples
        .iter()
        .all(|simple| matches_simple(adapter, element, simple))
}

fn matches_simple<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    simple: &SimpleSelector,
) -> bool {
    match simple {
        SimpleSelector::Universal | SimpleSelector::PseudoElement(_) => true,
        SimpleSelector::Type(type_name) => {
            type_name.is_empty() || type_name == "*" || adapter.tag_name(element) == type_name
        }
        SimpleSelector::Class(class_name) => adapter.has_class(element, class_name),
        SimpleSelector::IdSelector(id_value) => adapter
            .element_id(element)
            .is_some_and(|value| value == id_value),
        SimpleSelector::AttrExists(name) => adapter.attr(element, name).is_some(),
        SimpleSelector::AttrEquals { name, value } => adapter
            .attr(element, name)
            .is_some_and(|attr_value| attr_value == value),
        SimpleSelector::PseudoClass(pseudo_class) => match pseudo_class {
            PseudoClass::Root => adapter.parent(element).is_none(),
            PseudoClass::FirstChild => adapter.previous_sibling_element(element).is_none(),
            PseudoClass::LastChild => adapter.next_sibling_element(element).is_none(),
            PseudoClass::Not(list) => !matches_selector_list(adapter, element, list, None),
            PseudoClass::Other(name) => {
                log::trace!("unsupported pseudo-class :{name} never matches");
                false
            }
        },
    }
}
