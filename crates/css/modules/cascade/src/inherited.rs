//! Properties that inherit by default.
//! Spec: <https://www.w3.org/TR/css-cascade-4/#inheriting>

/// Inherited properties, sorted for binary search.
const INHERITED_PROPERTIES: &[&str] = &[
    "border-collapse",
    "border-spacing",
    "caption-side",
    "color",
    "cursor",
    "direction",
    "empty-cells",
    "font",
    "font-family",
    "font-feature-settings",
    "font-kerning",
    "font-size",
    "font-size-adjust",
    "font-stretch",
    "font-style",
    "font-variant",
    "font-weight",
    "hyphens",
    "letter-spacing",
    "line-height",
    "list-style",
    "list-style-image",
    "list-style-position",
    "list-style-type",
    "orphans",
    "quotes",
    "tab-size",
    "text-align",
    "text-align-last",
    "text-indent",
    "text-justify",
    "text-rendering",
    "text-shadow",
    "text-transform",
    "visibility",
    "white-space",
    "widows",
    "word-break",
    "word-spacing",
    "word-wrap",
    "writing-mode",
];

/// Whether a property is inherited by default. Custom properties always inherit.
/// Spec: Section 7 — Inheritance
pub fn is_inherited_property(property_name: &str) -> bool {
    if property_name.starts_with("--") {
        return true;
    }
    let name = property_name.to_ascii_lowercase();
    INHERITED_PROPERTIES.binary_search(&name.as_str()).is_ok()
}
