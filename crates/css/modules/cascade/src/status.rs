/// How a selector relates to the highlighted element.
///
/// Ordered so that a better match compares greater.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    #[default]
    Unmatched = 0,
    /// Matched an ancestor; only inherited properties count.
    ParentMatch = 1,
    /// Matched the highlighted element itself.
    Matched = 2,
    /// Top-ranked contributor for a property. Assigned after sorting only.
    Best = 3,
}

impl MatchStatus {
    /// Numeric value used by inspector front-ends.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}
