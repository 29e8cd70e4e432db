//! Collaborator capabilities the resolver queries.
//!
//! The resolver never walks a DOM or a stylesheet object graph itself. A host
//! implements these traits over whatever engine it wraps and hands out opaque
//! identity handles. Accessors on objects that have gone away return an error.

use crate::declarations::DeclarationBlock;
use anyhow::Result;
use css_selectors::{PseudoElement, Specificity};
use std::collections::HashMap;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
        pub struct $name(pub u64);
    };
}

handle!(
    /// Identity of an element (or generated `::before`/`::after` node).
    ElementId
);
handle!(
    /// Identity of a document.
    DocumentId
);
handle!(
    /// Identity of a stylesheet object.
    SheetId
);
handle!(
    /// Identity of a rule object inside a stylesheet.
    RuleId
);

/// Stylesheet metadata as exposed by the host.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SheetInfo {
    /// Address of an external sheet; `None` for `<style>` sheets.
    pub href: Option<String>,
    /// Location of the owner node's document, used when there is no href.
    pub owner_location: Option<String>,
    pub disabled: bool,
    /// The sheet's own media list; empty means unconditional.
    pub media_text: String,
    /// Browser-provided (user-agent) stylesheet.
    pub user_agent: bool,
}

/// The kinds of rule the resolver distinguishes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleKind {
    Style {
        selector_text: String,
        declarations: DeclarationBlock,
        line: u32,
        column: u32,
    },
    Import {
        media_text: String,
        /// The imported sheet, `None` when it failed to load.
        sheet: Option<SheetId>,
    },
    Media {
        media_text: String,
        rules: Vec<RuleId>,
    },
    Keyframes {
        name: String,
    },
    Other,
}

/// A rule plus its position in the stylesheet object graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleInfo {
    pub kind: RuleKind,
    pub parent_sheet: Option<SheetId>,
    pub parent_rule: Option<RuleId>,
}

/// Result of resolving a node to the element that style queries are asked about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binding {
    pub element: ElementId,
    pub pseudo: Option<PseudoElement>,
}

/// Live stylesheet and element enumeration.
pub trait StyleSheetSource {
    /// Top-level stylesheets of a document in document order.
    ///
    /// # Errors
    /// Returns an error if the document is no longer alive.
    fn style_sheets(&self, document: DocumentId) -> Result<Vec<SheetId>>;

    /// # Errors
    /// Returns an error if the sheet is no longer alive.
    fn sheet_info(&self, sheet: SheetId) -> Result<SheetInfo>;

    /// The sheet's `cssRules` in order.
    ///
    /// # Errors
    /// Returns an error if the sheet is no longer alive.
    fn sheet_rules(&self, sheet: SheetId) -> Result<Vec<RuleId>>;

    /// # Errors
    /// Returns an error if the rule is no longer alive.
    fn rule_info(&self, rule: RuleId) -> Result<RuleInfo>;

    /// Evaluate media text against the document's view. Empty text always matches.
    fn media_matches(&self, document: DocumentId, media_text: &str) -> bool;

    /// # Errors
    /// Returns an error if the element is no longer alive.
    fn owner_document(&self, element: ElementId) -> Result<DocumentId>;

    /// Parent element, `None` once the parent is not an element.
    fn parent_element(&self, element: ElementId) -> Option<ElementId>;

    /// Declarations of `element.style`.
    ///
    /// # Errors
    /// Returns an error if the element is no longer alive.
    fn inline_style(&self, element: ElementId) -> Result<DeclarationBlock>;
}

/// Selector matching primitives.
pub trait SelectorMatcher {
    /// Style rules whose selectors match the node, least specific first.
    /// `Ok(None)` means the host has no rules for this node.
    ///
    /// # Errors
    /// Returns an error if the node cannot be matched.
    fn style_rules_for_node(
        &self,
        element: ElementId,
        pseudo: Option<PseudoElement>,
    ) -> Result<Option<Vec<RuleId>>>;

    /// Whether selector `selector_index` of `rule` matches the element.
    ///
    /// # Errors
    /// Returns an error if the rule or element is gone or the index is out of range.
    fn selector_matches_element(
        &self,
        element: ElementId,
        rule: RuleId,
        selector_index: usize,
        pseudo: Option<PseudoElement>,
    ) -> Result<bool>;

    /// # Errors
    /// Returns an error if the rule is gone or the index is out of range.
    fn specificity(&self, rule: RuleId, selector_index: usize) -> Result<Specificity>;
}

/// Computed style retrieval.
pub trait ComputedStyleProvider {
    /// # Errors
    /// Returns an error if the element is no longer alive.
    fn computed_style(
        &self,
        element: ElementId,
        pseudo: Option<PseudoElement>,
    ) -> Result<HashMap<String, String>>;
}

/// Static knowledge of which properties inherit.
pub trait InheritancePredicate {
    fn is_inherited_property(&self, name: &str) -> bool;
}

/// Maps generated content nodes to the authorable element that owns them.
pub trait PseudoBinding {
    fn binding_element_and_pseudo(&self, node: ElementId) -> Binding;
}

/// What the short-name helpers need to know about an element.
pub trait ElementNaming {
    fn id_attribute(&self, element: ElementId) -> Option<String>;
    fn tag_name(&self, element: ElementId) -> String;
    fn previous_element_sibling(&self, element: ElementId) -> Option<ElementId>;
    /// True for the document's `<body>` and `<head>`.
    fn is_body_or_head(&self, element: ElementId) -> bool;
}

/// Everything a [`crate::CascadeResolver`] needs from its host.
pub trait InspectorHost:
    StyleSheetSource
    + SelectorMatcher
    + ComputedStyleProvider
    + InheritancePredicate
    + PseudoBinding
    + ElementNaming
{
}

impl<T> InspectorHost for T where
    T: StyleSheetSource
        + SelectorMatcher
        + ComputedStyleProvider
        + InheritancePredicate
        + PseudoBinding
        + ElementNaming
{
}
