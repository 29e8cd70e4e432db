use crate::host::RuleId;
use core::error::Error;
use core::fmt;

/// Contract breaches by a host that the resolver cannot work around.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CascadeError {
    /// A style rule reported by the matcher has no parent stylesheet.
    MissingParentSheet(RuleId),
    /// A rule handed to the rule cache is not a style rule.
    NotAStyleRule(RuleId),
}

impl fmt::Display for CascadeError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingParentSheet(rule) => {
                write!(formatter, "style rule {} has no parent stylesheet", rule.0)
            }
            Self::NotAStyleRule(rule) => write!(formatter, "rule {} is not a style rule", rule.0),
        }
    }
}

impl Error for CascadeError {}
