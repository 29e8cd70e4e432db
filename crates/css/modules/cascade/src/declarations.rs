//! Declaration blocks keyed by normalized property name.
//! Spec: <https://www.w3.org/TR/cssom-1/#css-declaration-blocks>

use css_style_attr::{Declaration, normalize_property_name, parse_declaration_list};

/// Priority string reported for `!important` declarations.
pub const IMPORTANT: &str = "important";

/// An ordered declaration block.
///
/// Insertion order is kept and a property may appear more than once with
/// different priority, the way a parsed rule body can.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeclarationBlock {
    entries: Vec<Declaration>,
}

impl DeclarationBlock {
    #[inline]
    pub const fn new(entries: Vec<Declaration>) -> Self {
        Self { entries }
    }

    /// Parse declaration text such as a rule body or a `style` attribute.
    pub fn parse(text: &str) -> Self {
        Self::new(parse_declaration_list(text))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.entries.iter()
    }

    /// The effective declaration for `property`: the last important one if any,
    /// otherwise the last one.
    fn effective(&self, property: &str) -> Option<&Declaration> {
        let name = normalize_property_name(property);
        let mut found: Option<&Declaration> = None;
        for decl in self.entries.iter().filter(|decl| decl.property == name) {
            if found.is_none_or(|current| decl.important || !current.important) {
                found = Some(decl);
            }
        }
        found
    }

    /// Value of `property`, `None` when the block does not set it.
    pub fn get_property_value(&self, property: &str) -> Option<&str> {
        self.effective(property).map(|decl| decl.value.as_str())
    }

    /// `"important"` or the empty string.
    /// Spec: Section 6.6.1 — `getPropertyPriority()`
    pub fn get_property_priority(&self, property: &str) -> &'static str {
        if self.effective(property).is_some_and(|decl| decl.important) {
            IMPORTANT
        } else {
            ""
        }
    }
}

impl FromIterator<Declaration> for DeclarationBlock {
    fn from_iter<I: IntoIterator<Item = Declaration>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
