//! Ranking of the selectors that contribute a value to one property.
//! Spec: <https://www.w3.org/TR/css-cascade-4/#cascade-sort>

use crate::rule::RuleKey;
use crate::status::MatchStatus;
use core::cmp::Ordering;
use css_selectors::Specificity;

/// One selector contributing a value for a property, with its display data.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorInfo {
    pub selector: String,
    pub property: String,
    pub value: String,
    pub important: bool,
    pub status: MatchStatus,
    /// True for the synthetic `element.style` selector.
    pub element_style: bool,
    /// False when the rule comes from a user-agent sheet.
    pub content_rule: bool,
    pub sheet_allowed: bool,
    pub specificity: Specificity,
    pub sheet_index: i64,
    pub rule_line: i64,
    pub source: String,
    pub href: String,
    /// Status before `Best` promotion.
    #[serde(skip)]
    pub(crate) base_status: MatchStatus,
    #[serde(skip)]
    pub(crate) rule: RuleKey,
}

/// Cascade comparison of two contributors; `Less` means `left` ranks first.
///
/// Precedence, highest first:
/// 1. content rules over user-agent rules
/// 2. inline style against a stylesheet rule: inline loses only when it is
///    normal and the other is `!important`
/// 3. `!important` over normal
/// 4. higher specificity
/// 5. higher sheet index
/// 6. higher rule line
///
/// Spec: Section 6 — Cascade sorting order
pub fn compare(left: &SelectorInfo, right: &SelectorInfo) -> Ordering {
    if left.content_rule != right.content_rule {
        return if left.content_rule {
            Ordering::Less
        } else {
            Ordering::Greater
        };
    }

    if left.element_style && !right.element_style {
        return if !left.important && right.important {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if !left.element_style && right.element_style {
        return if left.important && !right.important {
            Ordering::Less
        } else {
            Ordering::Greater
        };
    }

    right
        .important
        .cmp(&left.important)
        .then_with(|| right.specificity.cmp(&left.specificity))
        .then_with(|| right.sheet_index.cmp(&left.sheet_index))
        .then_with(|| right.rule_line.cmp(&left.rule_line))
}

/// Sort contributors by status, then cascade order, and promote the winner.
pub fn rank(contributors: &mut [SelectorInfo]) {
    for info in contributors.iter_mut() {
        info.status = info.base_status;
    }
    contributors.sort_by(|left, right| {
        right
            .base_status
            .cmp(&left.base_status)
            .then_with(|| compare(left, right))
    });
    if let Some(first) = contributors.first_mut()
        && first.status > MatchStatus::Unmatched
    {
        first.status = MatchStatus::Best;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(value: &str, important: bool, specificity: Specificity) -> SelectorInfo {
        SelectorInfo {
            selector: value.to_owned(),
            property: "color".to_owned(),
            value: value.to_owned(),
            important,
            status: MatchStatus::Matched,
            element_style: false,
            content_rule: true,
            sheet_allowed: true,
            specificity,
            sheet_index: 0,
            rule_line: 1,
            source: String::new(),
            href: String::new(),
            base_status: MatchStatus::Matched,
            rule: RuleKey::Sheet(0),
        }
    }

    fn inline(value: &str, important: bool) -> SelectorInfo {
        SelectorInfo {
            element_style: true,
            rule_line: -1,
            ..info(value, important, Specificity::STYLE_ATTRIBUTE)
        }
    }

    #[test]
    fn inline_style_tie_breaks() {
        let external_important = info("a", true, Specificity::new(0, 1, 0));
        let external = info("b", false, Specificity::new(9, 0, 0));
        assert_eq!(compare(&inline("c", false), &external), Ordering::Less);
        assert_eq!(compare(&inline("c", false), &external_important), Ordering::Greater);
        assert_eq!(compare(&inline("c", true), &external_important), Ordering::Less);
        assert_eq!(compare(&external_important, &inline("c", true)), Ordering::Greater);
    }

    #[test]
    fn content_beats_user_agent() {
        let mut user_agent = info("ua", true, Specificity::new(5, 0, 0));
        user_agent.content_rule = false;
        let content = info("author", false, Specificity::default());
        assert_eq!(compare(&content, &user_agent), Ordering::Less);
    }

    #[test]
    fn later_sheet_and_line_break_ties() {
        let mut early = info("early", false, Specificity::new(0, 1, 0));
        let mut late = early.clone();
        late.sheet_index = 2;
        assert_eq!(compare(&late, &early), Ordering::Less);
        early.sheet_index = 2;
        late.rule_line = 9;
        assert_eq!(compare(&late, &early), Ordering::Less);
        assert_eq!(compare(&late, &late.clone()), Ordering::Equal);
    }

    #[test]
    fn rank_promotes_first_match_and_resets_on_rerank() {
        let mut parent = info("parent", true, Specificity::new(3, 0, 0));
        parent.base_status = MatchStatus::ParentMatch;
        parent.status = MatchStatus::ParentMatch;
        let mut list = vec![parent, info("own", false, Specificity::default())];
        rank(&mut list);
        assert_eq!(list[0].value, "own");
        assert_eq!(list[0].status, MatchStatus::Best);
        assert_eq!(list[1].status, MatchStatus::ParentMatch);
        rank(&mut list);
        assert_eq!(list[0].status, MatchStatus::Best);
        assert_eq!(list[0].base_status, MatchStatus::Matched);
    }
}
