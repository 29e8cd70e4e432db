//! Which stylesheet origins the inspector shows.

use core::convert::Infallible;
use core::fmt;
use core::str::FromStr;

/// Source filter policy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFilter {
    /// Content (author) stylesheets only.
    #[default]
    User,
    /// Content plus user-agent stylesheets.
    Ua,
    /// Exactly the stylesheet with this href.
    Href(String),
}

impl SourceFilter {
    /// Whether a sheet with the given origin and href passes the filter.
    pub fn is_sheet_allowed(&self, content_sheet: bool, href: &str) -> bool {
        match self {
            Self::User => content_sheet,
            Self::Ua => true,
            Self::Href(filter_href) => filter_href == href,
        }
    }

    /// True when user-agent rules take part in matching.
    #[inline]
    pub const fn includes_user_agent(&self) -> bool {
        matches!(self, Self::Ua)
    }
}

impl FromStr for SourceFilter {
    type Err = Infallible;

    /// `user` and `ua` (any case) select those modes; anything else is an href.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        Ok(if trimmed.eq_ignore_ascii_case("user") {
            Self::User
        } else if trimmed.eq_ignore_ascii_case("ua") {
            Self::Ua
        } else {
            Self::Href(trimmed.to_owned())
        })
    }
}

impl fmt::Display for SourceFilter {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => formatter.write_str("user"),
            Self::Ua => formatter.write_str("ua"),
            Self::Href(href) => formatter.write_str(href),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_sheets_by_mode() {
        assert!(SourceFilter::User.is_sheet_allowed(true, "a.css"));
        assert!(!SourceFilter::User.is_sheet_allowed(false, "ua.css"));
        assert!(SourceFilter::Ua.is_sheet_allowed(false, "ua.css"));
        let href = SourceFilter::Href("http://x/a.css".to_owned());
        assert!(href.is_sheet_allowed(true, "http://x/a.css"));
        assert!(!href.is_sheet_allowed(true, "http://x/b.css"));
    }

    #[test]
    fn parses_modes_and_hrefs() {
        assert_eq!("UA".parse::<SourceFilter>(), Ok(SourceFilter::Ua));
        assert_eq!(" user ".parse::<SourceFilter>(), Ok(SourceFilter::User));
        assert_eq!(
            "http://x/a.css".parse::<SourceFilter>(),
            Ok(SourceFilter::Href("http://x/a.css".to_owned()))
        );
        assert_eq!(SourceFilter::Ua.to_string(), "ua");
    }
}
