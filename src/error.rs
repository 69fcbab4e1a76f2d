//! Typed failures surfaced by permission parsing, loading and assertion.

use std::fmt;

/// A permission line, group header, or priority string did not conform to the
/// save-string grammar (see `SPEC_FULL.md` §6).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty path segment in '{0}'")]
    EmptySegment(String),

    #[error("'*' is only allowed as the final path segment in '{0}'")]
    WildcardNotLast(String),

    #[error("'-' is only allowed as a leading prefix in '{0}'")]
    LeadingHyphenMisplaced(String),

    #[error("'{0}' is not a valid priority")]
    MalformedPriority(String),

    #[error("'{0}' is not a valid group or user name")]
    InvalidName(String),

    #[error("expected a reference, permission or blank line, got '{0}'")]
    MalformedLine(String),

    #[error("'{0}' could not be resolved to a user id")]
    InvalidUserId(String),
}

/// Failure while loading a whole registry save string.
///
/// Carries the 1-based line number and the name of the block being parsed so
/// that a caller can point a user at the exact offending line.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to load block '{block}' at line {line}: {source}")]
pub struct LoadError {
    pub block: String,
    pub line: usize,
    #[source]
    pub source: ParseError,
}

/// Raised by `assert_has_permission`-style calls on a [`PermissionStatus`](crate::registry::PermissionStatus).
///
/// `checked` lists every permission path considered by the assertion that
/// failed. For a single-permission assertion this has exactly one element;
/// `permission()` is the convenience accessor for that common case.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("missing permission: {}", .checked.join(", "))]
pub struct MissingPermissionError {
    pub checked: Vec<String>,
    pub multiple_were_missing: bool,
    pub any_single_would_have_satisfied: bool,
}

impl MissingPermissionError {
    pub fn single(path: impl Into<String>) -> Self {
        Self {
            checked: vec![path.into()],
            multiple_were_missing: false,
            any_single_would_have_satisfied: false,
        }
    }

    pub fn all_of(checked: Vec<String>) -> Self {
        let multiple_were_missing = checked.len() > 1;
        Self {
            checked,
            multiple_were_missing,
            any_single_would_have_satisfied: false,
        }
    }

    pub fn any_of(checked: Vec<String>) -> Self {
        let multiple_were_missing = checked.len() > 1;
        Self {
            checked,
            multiple_were_missing,
            any_single_would_have_satisfied: true,
        }
    }

    /// The single permission this assertion was about, if there was only one.
    pub fn permission(&self) -> Option<&str> {
        match self.checked.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }
}

/// Like [`MissingPermissionError`], but naming which user failed the assertion.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("user '{user}' is missing permission: {}", .source.checked.join(", "))]
pub struct UserMissingPermissionError<U>
where
    U: fmt::Debug + fmt::Display + Clone + PartialEq,
{
    pub user: U,
    #[source]
    pub source: MissingPermissionError,
}

impl<U> UserMissingPermissionError<U>
where
    U: fmt::Debug + fmt::Display + Clone + PartialEq,
{
    pub fn new(user: U, source: MissingPermissionError) -> Self {
        Self { user, source }
    }
}
