use crate::ranking::SelectorInfo;
use crate::rule::RuleKey;
use std::collections::HashSet;

/// Everything the inspector knows about one property of the highlighted element.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInfo {
    pub property: String,
    /// Computed value captured at highlight time, empty if unknown.
    pub value: String,
    /// Distinct matched rules setting the property whose sheet the filter allows.
    pub matched_rule_count: usize,
    /// Contributors in cascade order; the first one may carry `Best`.
    pub matched_selectors: Vec<SelectorInfo>,
    #[serde(skip)]
    pub(crate) need_refilter: bool,
}

impl PropertyInfo {
    pub(crate) fn new(property: &str, value: String, matched_selectors: Vec<SelectorInfo>) -> Self {
        let mut info = Self {
            property: property.to_owned(),
            value,
            matched_rule_count: 0,
            matched_selectors,
            need_refilter: false,
        };
        info.matched_rule_count = info.count_allowed_rules();
        info
    }

    /// The winning contributor, if any.
    pub fn best(&self) -> Option<&SelectorInfo> {
        self.matched_selectors.first()
    }

    /// Whether a source-filter change still has to be applied.
    #[inline]
    pub const fn needs_refilter(&self) -> bool {
        self.need_refilter
    }

    /// Re-apply the source filter without rematching: refresh each
    /// contributor's `sheet_allowed` and recount the rules.
    pub(crate) fn refilter(&mut self, sheet_allowed: impl Fn(RuleKey) -> bool) {
        for selector in &mut self.matched_selectors {
            selector.sheet_allowed = sheet_allowed(selector.rule);
        }
        self.matched_rule_count = self.count_allowed_rules();
        self.need_refilter = false;
    }

    /// Each rule counts once, judged by its first contributor.
    fn count_allowed_rules(&self) -> usize {
        let mut seen = HashSet::new();
        self.matched_selectors
            .iter()
            .filter(|selector| seen.insert(selector.rule) && selector.sheet_allowed)
            .count()
    }
}
