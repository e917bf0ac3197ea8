//! Glob filters over entry paths.
//!
//! Filters are matched against the path of a file relative to the directory
//! being added, with `/` separators. `*` does not cross directory
//! boundaries; use `**` for that (`**/*.png` matches PNGs at any depth).

use cassette_core::error::{CassetteError, Result};
use glob::{MatchOptions, Pattern};
use std::fmt;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A composable path predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum PathFilter {
    /// Passes paths that match (`include`) or do not match (`exclude`) a glob.
    Glob {
        /// Compiled pattern.
        pattern: Pattern,
        /// `true` for include, `false` for exclude.
        include: bool,
    },
    /// Both filters pass.
    And(Box<PathFilter>, Box<PathFilter>),
    /// Either filter passes.
    Or(Box<PathFilter>, Box<PathFilter>),
    /// The filter fails.
    Not(Box<PathFilter>),
}

impl PathFilter {
    /// Pass paths matching `glob`.
    pub fn include(glob: &str) -> Result<Self> {
        Ok(Self::Glob {
            pattern: compile(glob)?,
            include: true,
        })
    }

    /// Pass paths not matching `glob`.
    pub fn exclude(glob: &str) -> Result<Self> {
        Ok(Self::Glob {
            pattern: compile(glob)?,
            include: false,
        })
    }

    /// Pass paths both filters pass.
    pub fn and(self, other: PathFilter) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// Pass paths either filter passes.
    pub fn or(self, other: PathFilter) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Pass paths this filter rejects.
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Test a relative, `/` separated path.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Glob { pattern, include } => {
                pattern.matches_with(path, MATCH_OPTIONS) == *include
            }
            Self::And(a, b) => a.matches(path) && b.matches(path),
            Self::Or(a, b) => a.matches(path) || b.matches(path),
            Self::Not(inner) => !inner.matches(path),
        }
    }
}

fn compile(glob: &str) -> Result<Pattern> {
    Pattern::new(glob).map_err(|e| CassetteError::invalid_filter(glob, e.msg))
}

impl fmt::Display for PathFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Glob { pattern, include } => {
                write!(f, "{}:{}", if *include { "in" } else { "out" }, pattern)
            }
            Self::And(a, b) => write!(f, "{a} && {b}"),
            Self::Or(a, b) => write!(f, "{a} || {b}"),
            Self::Not(inner) => write!(f, "!({inner})"),
        }
    }
}
