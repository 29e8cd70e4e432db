//! CSS selector specificity calculation.
//! Spec: <https://www.w3.org/TR/selectors-4/#specificity-rules>

use crate::{ComplexSelector, CompoundSelector, PseudoClass, SimpleSelector};

/// Bits per specificity tier in the packed representation.
const TIER_BITS: u32 = 8;
/// Largest count a single tier can hold before saturating.
const TIER_MAX: u32 = (1 << TIER_BITS) - 1;

/// Specificity (a, b, c) packed into one orderable integer.
///
/// Layout: `0x00AABBCC` where `AA` counts ids, `BB` classes, attributes and
/// pseudo-classes, `CC` types and pseudo-elements. Each tier saturates at 255 so
/// a lower tier can never carry into a higher one. The style attribute sits one
/// tier above ids (`0x01000000`).
///
/// Spec: Section 17 — Calculating a selector's specificity
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize,
)]
pub struct Specificity(pub u32);

impl Specificity {
    /// Specificity of declarations in a `style` attribute, above any selector.
    /// Spec: CSS Style Attributes, Section 3 — Syntax and Parsing
    pub const STYLE_ATTRIBUTE: Self = Self(1 << (TIER_BITS * 3));

    /// Pack the three tiers, saturating each at 255.
    #[inline]
    pub const fn new(ids: u32, classes: u32, types: u32) -> Self {
        let id_tier = if ids > TIER_MAX { TIER_MAX } else { ids };
        let class_tier = if classes > TIER_MAX {
            TIER_MAX
        } else {
            classes
        };
        let type_tier = if types > TIER_MAX { TIER_MAX } else { types };
        Self((id_tier << (TIER_BITS * 2)) | (class_tier << TIER_BITS) | type_tier)
    }

    /// Number of id selectors (tier a).
    #[inline]
    pub const fn ids(self) -> u32 {
        (self.0 >> (TIER_BITS * 2)) & TIER_MAX
    }

    /// Number of class, attribute and pseudo-class selectors (tier b).
    #[inline]
    pub const fn classes(self) -> u32 {
        (self.0 >> TIER_BITS) & TIER_MAX
    }

    /// Number of type selectors and pseudo-elements (tier c).
    #[inline]
    pub const fn types(self) -> u32 {
        self.0 & TIER_MAX
    }

    /// Tier-wise saturating sum.
    #[inline]
    #[must_use]
    pub const fn add(self, other: Self) -> Self {
        Self::new(
            self.ids() + other.ids(),
            self.classes() + other.classes(),
            self.types() + other.types(),
        )
    }
}

/// Compute the specificity of a compound selector.
/// Spec: Section 17 — Specificity (a, b, c)
pub fn specificity_of_compound(compound: &CompoundSelector) -> Specificity {
    let mut total = Specificity::default();
    for simple in &compound.simples {
        let part = match simple {
            SimpleSelector::IdSelector(_) => Specificity::new(1, 0, 0),
            SimpleSelector::Class(_)
            | SimpleSelector::AttrExists(_)
            | SimpleSelector::AttrEquals { .. } => Specificity::new(0, 1, 0),
            // `:not()` takes the specificity of its most specific argument.
            SimpleSelector::PseudoClass(PseudoClass::Not(list)) => list
                .selectors
                .iter()
                .map(specificity_of_complex)
                .max()
                .unwrap_or_default(),
            SimpleSelector::PseudoClass(_) => Specificity::new(0, 1, 0),
            SimpleSelector::Type(name) if name.as_str() != "*" => Specificity::new(0, 0, 1),
            SimpleSelector::PseudoElement(_) => Specificity::new(0, 0, 1),
            SimpleSelector::Type(_) | SimpleSelector::Universal => Specificity::default(),
        };
        total = total.add(part);
    }
    total
}

/// Compute the specificity of a complex selector (sum of its compounds).
/// Spec: Section 17 — Specificity accumulation
pub fn specificity_of_complex(sel: &ComplexSelector) -> Specificity {
    sel.rest
        .iter()
        .fold(specificity_of_compound(&sel.first), |total, pair| {
            total.add(specificity_of_compound(&pair.1))
        })
}
