//! Splitting selector lists into their comma-separated branches.
//! Spec: <https://www.w3.org/TR/selectors-4/#grouping>

use cssparser::{ParseError, Parser, ParserInput};

/// Split selector-list text on top-level commas.
///
/// Commas nested inside functional notation (`:not(a, b)`, `:is(...)`) or
/// brackets do not split. Each branch is trimmed and empty branches are dropped.
///
/// Spec: Section 4.1 — Selector lists
pub fn split_selector_list(text: &str) -> Vec<String> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let parsed: Result<Vec<String>, ParseError<'_, ()>> = parser.parse_comma_separated(|branch| {
        let start = branch.position();
        while branch.next_including_whitespace_and_comments().is_ok() {}
        Ok(branch.slice_from(start).trim().to_owned())
    });
    match parsed {
        Ok(branches) => branches
            .into_iter()
            .filter(|branch| !branch.is_empty())
            .collect(),
        Err(err) => {
            log::debug!("selector list {text:?} could not be split: {err:?}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_top_level_commas() {
        assert_eq!(
            split_selector_list("h1, .a > p ,#b"),
            vec!["h1".to_owned(), ".a > p".to_owned(), "#b".to_owned()]
        );
    }

    #[test]
    fn keeps_commas_inside_functions() {
        assert_eq!(
            split_selector_list("p:not(.a, .b), div"),
            vec!["p:not(.a, .b)".to_owned(), "div".to_owned()]
        );
    }

    #[test]
    fn keeps_commas_inside_attribute_values() {
        assert_eq!(
            split_selector_list("[title=\"a,b\"], em"),
            vec!["[title=\"a,b\"]".to_owned(), "em".to_owned()]
        );
    }

    #[test]
    fn drops_empty_branches() {
        assert_eq!(split_selector_list(" , a,"), vec!["a".to_owned()]);
        assert!(split_selector_list("").is_empty());
    }
}
