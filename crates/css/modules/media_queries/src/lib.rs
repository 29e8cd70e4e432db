//! Media Queries Level 4 — evaluation of media query lists against a viewport.
//! Spec: <https://www.w3.org/TR/mediaqueries-4/>
//!
//! Supported subset:
//! - media types `all`, `screen`, `print` with the `not` / `only` prefixes
//! - `width`, `height` and their `min-` / `max-` forms in `px`, `em`, `rem`
//! - `orientation: portrait | landscape`
//!
//! Anything else evaluates to `not all`, as Media Queries Level 4 requires for
//! unknown or malformed queries.

#![forbid(unsafe_code)]

use cssparser::{ParseError, Parser, ParserInput, Token};

/// Font size used to resolve `em`/`rem` in media features (the initial `medium`).
/// Spec: Section 1.3 — Units in media queries are relative to the initial value.
const INITIAL_FONT_SIZE_PX: f32 = 16.0;

/// Viewport metrics media features are evaluated against.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    pub width_px: f32,
    pub height_px: f32,
}

impl Default for Viewport {
    #[inline]
    fn default() -> Self {
        Self {
            width_px: 1280.0,
            height_px: 720.0,
        }
    }
}

/// Media types (subset).
/// Spec: Section 2.3 — Media types
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaType {
    All,
    Screen,
    Print,
    /// Deprecated or unknown types never match.
    Unknown(String),
}

impl MediaType {
    fn from_ident(ident: &str) -> Self {
        match ident.to_ascii_lowercase().as_str() {
            "all" => Self::All,
            "screen" => Self::Screen,
            "print" => Self::Print,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

/// A media feature value.
/// Spec: Section 4 — Media features
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureValue {
    /// A resolved length in CSS pixels.
    Length(f32),
    /// A keyword such as `portrait`.
    Keyword(String),
}

/// One `(name[: value])` media feature.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaFeature {
    /// Lowercased feature name, including any `min-` / `max-` prefix.
    pub name: String,
    pub value: Option<FeatureValue>,
}

/// A single media query.
/// Spec: Section 3 — Syntax
#[derive(Clone, Debug, PartialEq)]
pub struct MediaQuery {
    pub negated: bool,
    pub media_type: MediaType,
    pub features: Vec<MediaFeature>,
}

/// A comma-separated media query list. `None` entries failed to parse and count as `not all`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MediaQueryList {
    pub queries: Vec<Option<MediaQuery>>,
}

impl MediaQueryList {
    /// Evaluate the list: true if any query matches, and true for an empty list.
    /// Spec: Section 2.1 — Combining media queries
    pub fn matches(&self, viewport: &Viewport) -> bool {
        self.queries.is_empty()
            || self
                .queries
                .iter()
                .flatten()
                .any(|query| query.matches(viewport))
    }
}

impl MediaQuery {
    /// Evaluate a single media query.
    /// Spec: Section 2.2 — Media query modifiers
    pub fn matches(&self, viewport: &Viewport) -> bool {
        let type_matches = matches!(self.media_type, MediaType::All | MediaType::Screen);
        let result = type_matches
            && self
                .features
                .iter()
                .all(|feature| feature.matches(viewport));
        result != self.negated
    }
}

impl MediaFeature {
    /// Evaluate a media feature in a boolean or plain context.
    /// Spec: Section 2.4 — Media features; Section 4 — Viewport/page characteristics
    pub fn matches(&self, viewport: &Viewport) -> bool {
        let (prefix, base) = if let Some(base) = self.name.strip_prefix("min-") {
            (Some(Bound::Min), base)
        } else if let Some(base) = self.name.strip_prefix("max-") {
            (Some(Bound::Max), base)
        } else {
            (None, self.name.as_str())
        };
        let actual = match base {
            "width" => viewport.width_px,
            "height" => viewport.height_px,
            "orientation" if prefix.is_none() => {
                let orientation = if viewport.height_px >= viewport.width_px {
                    "portrait"
                } else {
                    "landscape"
                };
                return match &self.value {
                    None => true,
                    Some(FeatureValue::Keyword(keyword)) => keyword == orientation,
                    Some(FeatureValue::Length(_)) => false,
                };
            }
            unknown => {
                log::trace!("unsupported media feature {unknown:?}");
                return false;
            }
        };
        match (&self.value, prefix) {
            // Boolean context: a range feature is true when it is non-zero.
            (None, None) => actual.abs() > f32::EPSILON,
            (Some(FeatureValue::Length(expected)), None) => (actual - expected).abs() < f32::EPSILON,
            (Some(FeatureValue::Length(expected)), Some(Bound::Min)) => actual >= *expected,
            (Some(FeatureValue::Length(expected)), Some(Bound::Max)) => actual <= *expected,
            // `min-`/`max-` without a value, or a keyword for a range feature, is invalid.
            (None | Some(FeatureValue::Keyword(_)), _) => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Bound {
    Min,
    Max,
}

/// Parse a feature value: a length (or unitless zero) or an identifier.
fn parse_feature_value<'input>(
    input: &mut Parser<'input, '_>,
) -> Result<FeatureValue, ParseError<'input, ()>> {
    let location = input.current_source_location();
    let token = input.next()?.clone();
    match token {
        Token::Dimension { value, unit, .. } => match unit.to_ascii_lowercase().as_str() {
            "px" => Ok(FeatureValue::Length(value)),
            "em" | "rem" => Ok(FeatureValue::Length(value * INITIAL_FONT_SIZE_PX)),
            _ => Err(location.new_custom_error(())),
        },
        Token::Number { value, .. } if value.abs() < f32::EPSILON => Ok(FeatureValue::Length(0.0)),
        Token::Ident(ident) => Ok(FeatureValue::Keyword(ident.to_ascii_lowercase())),
        _ => Err(location.new_unexpected_token_error(token)),
    }
}

/// Parse the inside of a `( ... )` media feature.
fn parse_feature<'input>(
    input: &mut Parser<'input, '_>,
) -> Result<MediaFeature, ParseError<'input, ()>> {
    let name = input.expect_ident()?.to_ascii_lowercase();
    let value = if input.try_parse(Parser::expect_colon).is_ok() {
        Some(parse_feature_value(input)?)
    } else {
        None
    };
    input.expect_exhausted()?;
    Ok(MediaFeature { name, value })
}

/// Parse one media query.
/// Spec: Section 3 — `<media-query>` grammar
fn parse_media_query<'input>(
    input: &mut Parser<'input, '_>,
) -> Result<MediaQuery, ParseError<'input, ()>> {
    let mut negated = false;
    let mut media_type: Option<MediaType> = None;
    if let Ok(ident) = input.try_parse(|parser| parser.expect_ident_cloned()) {
        let keyword = ident.to_ascii_lowercase();
        if keyword == "not" || keyword == "only" {
            negated = keyword == "not";
            let type_ident = input.expect_ident()?;
            media_type = Some(MediaType::from_ident(type_ident));
        } else {
            media_type = Some(MediaType::from_ident(&keyword));
        }
    }
    let mut features = Vec::new();
    let mut expect_and = media_type.is_some();
    while !input.is_exhausted() {
        if expect_and {
            let location = input.current_source_location();
            let ident = input.expect_ident()?;
            if !ident.eq_ignore_ascii_case("and") {
                return Err(location.new_custom_error(()));
            }
        }
        input.expect_parenthesis_block()?;
        features.push(input.parse_nested_block(parse_feature)?);
        expect_and = true;
    }
    if media_type.is_none() && features.is_empty() {
        let location = input.current_source_location();
        return Err(location.new_custom_error(()));
    }
    Ok(MediaQuery {
        negated,
        media_type: media_type.unwrap_or(MediaType::All),
        features,
    })
}

/// Parse a media query list; malformed queries are kept as `None` (`not all`).
/// Spec: Section 3.1 — Error handling
pub fn parse_media_query_list(text: &str) -> MediaQueryList {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    if parser.is_exhausted() {
        return MediaQueryList::default();
    }
    let parsed: Result<Vec<Option<MediaQuery>>, ParseError<'_, ()>> =
        parser.parse_comma_separated(|query| match parse_media_query(query) {
            Ok(parsed_query) => Ok(Some(parsed_query)),
            Err(err) => {
                log::debug!("media query in {text:?} is malformed: {err:?}");
                // Drain the rest of this query so the list parser can move on.
                while query.next().is_ok() {}
                Ok(None)
            }
        });
    MediaQueryList {
        queries: parsed.unwrap_or_else(|_| vec![None]),
    }
}

/// Evaluate media query text against a viewport. Empty text matches everything.
pub fn media_matches(text: &str, viewport: &Viewport) -> bool {
    parse_media_query_list(text).matches(viewport)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NARROW: Viewport = Viewport {
        width_px: 800.0,
        height_px: 600.0,
    };

    #[test]
    fn empty_and_all_match() {
        assert!(media_matches("", &NARROW));
        assert!(media_matches("  ", &NARROW));
        assert!(media_matches("all", &NARROW));
        assert!(media_matches("screen", &NARROW));
        assert!(!media_matches("print", &NARROW));
        assert!(media_matches("not print", &NARROW));
    }

    #[test]
    fn width_ranges() {
        assert!(!media_matches("(min-width: 2000px)", &NARROW));
        assert!(media_matches("(max-width: 50em)", &NARROW));
        assert!(media_matches("screen and (min-width: 600px) and (max-width: 900px)", &NARROW));
        assert!(!media_matches("only screen and (min-height: 601px)", &NARROW));
        assert!(media_matches("(width: 800px)", &NARROW));
    }

    #[test]
    fn lists_match_if_any_query_matches() {
        assert!(media_matches("print, (min-width: 100px)", &NARROW));
        assert!(!media_matches("print, (min-width: 2000px)", &NARROW));
    }

    #[test]
    fn orientation_and_malformed_queries() {
        assert!(media_matches("(orientation: landscape)", &NARROW));
        assert!(!media_matches("(orientation: portrait)", &NARROW));
        assert!(!media_matches("(min-width: fast)", &NARROW));
        assert!(!media_matches("screen (min-width: 1px)", &NARROW));
        assert!(media_matches("(bogus: 1px), screen", &NARROW));
    }
}
