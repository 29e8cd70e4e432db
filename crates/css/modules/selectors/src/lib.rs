//! Selectors Level 4 — Element matching and specificity.
//! Spec: <https://www.w3.org/TR/selectors-4/>
//!
//! This crate implements the subset of selectors needed by the style inspector:
//! - Type, universal, class, id and attribute (presence and equals) selectors
//! - Structural pseudo-classes (`:root`, `:first-child`, `:last-child`) and `:not(...)`
//! - The `::before` / `::after` pseudo-elements (legacy single-colon form included)
//! - Combinators: descendant, child, adjacent sibling, general sibling
//! - Grammar-aware splitting of selector lists on top-level commas
//! - Packed specificity calculation
//!
//! Each function includes a reference to its corresponding section in the spec.

#![forbid(unsafe_code)]

mod matcher;
mod parser;
mod specificity;
mod split;

// Re-export public API
pub use matcher::{matches_complex, matches_compound, matches_selector_list};
pub use parser::{parse_complex_selector, parse_selector_list};
pub use specificity::{Specificity, specificity_of_complex, specificity_of_compound};
pub use split::split_selector_list;

/// An adapter that abstracts DOM access for selector matching.
/// Implement this for your DOM layer.
///
/// Spec references:
/// - Section 3: Selectors overview and element matching
pub trait ElementAdapter {
    type Handle: Copy + Eq;

    /// Parent element if any.
    /// Spec: Section 16 — Combinators (for tree relationships)
    fn parent(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Previous sibling element (skip non-elements if your DOM has mixed nodes).
    /// Spec: Section 16 — Sibling combinators
    fn previous_sibling_element(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Next sibling element (skip non-elements if your DOM has mixed nodes).
    /// Spec: Section 14 — Tree-structural pseudo-classes
    fn next_sibling_element(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Tag name in ASCII lowercase (per HTML parsing conventions).
    /// Spec: Section 5 — Type selectors
    fn tag_name(&self, element: Self::Handle) -> &str;

    /// Returns Some(id) if the element has an id attribute, else None.
    /// Spec: Section 6.7 — ID selectors
    fn element_id(&self, element: Self::Handle) -> Option<&str>;

    /// True if the element has the given class token.
    /// Spec: Section 6.6 — Class selectors
    fn has_class(&self, element: Self::Handle, class: &str) -> bool;

    /// Returns the attribute value if present.
    /// Spec: Section 6 — Attribute selectors
    fn attr(&self, element: Self::Handle, name: &str) -> Option<&str>;
}

/// Pseudo-elements the inspector can bind generated content to.
/// Spec: CSS Pseudo-Elements Level 4, Section 3.1
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum PseudoElement {
    /// `::before`
    Before,
    /// `::after`
    After,
}

impl PseudoElement {
    /// Parse a pseudo-element name (without colons), ASCII case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("before") {
            Some(Self::Before)
        } else if name.eq_ignore_ascii_case("after") {
            Some(Self::After)
        } else {
            None
        }
    }

    /// The single-colon tag the inspector reports for this pseudo-element.
    pub const fn as_tag(self) -> &'static str {
        match self {
            Self::Before => ":before",
            Self::After => ":after",
        }
    }
}

/// Pseudo-classes (subset).
/// Spec: Sections 4.3, 14
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PseudoClass {
    /// Spec: Section 14.1 — `:root`
    Root,
    /// Spec: Section 14.4.1 — `:first-child`
    FirstChild,
    /// Spec: Section 14.4.2 — `:last-child`
    LastChild,
    /// Spec: Section 4.3 — `:not(<complex-selector-list>)`
    Not(SelectorList),
    /// Any other pseudo-class. Parsed for specificity, never matches.
    Other(String),
}

/// Simple selectors (subset).
/// Spec: Sections 5, 6, 4.3, 14
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimpleSelector {
    /// Spec: Section 5.1 — Type selectors
    Type(String),
    /// Spec: Section 6.6 — Class selectors
    Class(String),
    /// Spec: Section 6.7 — ID selectors
    IdSelector(String),
    /// Spec: Section 6.1 — Attribute presence `[attr]`
    AttrExists(String),
    /// Spec: Section 6.1 — Attribute equals `[attr=value]`
    AttrEquals { name: String, value: String },
    /// Spec: Section 4 — Pseudo-classes
    PseudoClass(PseudoClass),
    /// Spec: Section 3.6.1 — Pseudo-elements, only valid in the last compound.
    PseudoElement(PseudoElement),
    /// Universal selector '*'. Matches any element and adds no specificity.
    /// Spec: Section 5.2 — Universal selector
    Universal,
}

/// A compound selector is a sequence of simple selectors (no combinators).
/// Spec: Section 3.1 — Compound selectors
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    pub simples: Vec<SimpleSelector>,
}

impl CompoundSelector {
    /// The pseudo-element this compound targets, if any.
    pub fn pseudo_element(&self) -> Option<PseudoElement> {
        self.simples.iter().find_map(|simple| match simple {
            SimpleSelector::PseudoElement(pseudo) => Some(*pseudo),
            _ => None,
        })
    }
}

/// Combinators between compounds.
/// Spec: Section 16 — Combinators
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

/// A complex selector is one or more compounds separated by combinators.
/// Spec: Section 3.1
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ComplexSelector {
    pub first: CompoundSelector,
    pub rest: Vec<(Combinator, CompoundSelector)>,
}

impl ComplexSelector {
    /// The compound the subject element must match (the right-most one).
    pub fn subject(&self) -> &CompoundSelector {
        self.rest.last().map_or(&self.first, |pair| &pair.1)
    }

    /// True when the selector has no simple selectors at all.
    pub fn is_empty(&self) -> bool {
        self.first.simples.is_empty() && self.rest.is_empty()
    }
}

/// A selector list separated by commas.
/// Spec: Section 4.1 — Selector lists
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}
