//! Semantic version validation for schema assignments.
//!
//! Implements the SemVer 2.0 grammar: `MAJOR.MINOR.PATCH`, an optional
//! `-prerelease` and optional `+build` metadata.
//!
//! ```rust
//! use tallycat::version::validate;
//!
//! assert!(validate("2.0.0-beta.1").is_valid);
//! assert_eq!(validate("").message, "Version is required");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub const MSG_REQUIRED: &str = "Version is required";
pub const MSG_INVALID_FORMAT: &str =
    "Invalid semantic version format. Expected MAJOR.MINOR.PATCH (e.g. 1.2.3)";
pub const MSG_VALID: &str = "Valid semantic version";

// `[0-9]` rather than `\d`: the regex crate's `\d` is Unicode-aware.
static SEMVER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)",
        r"(?:-((?:0|[1-9][0-9]*|[0-9]*[a-zA-Z-][0-9a-zA-Z-]*)",
        r"(?:\.(?:0|[1-9][0-9]*|[0-9]*[a-zA-Z-][0-9a-zA-Z-]*))*))?",
        r"(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
    ))
    .expect("semver pattern is valid")
});

/// Verdict of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionValidation {
    pub is_valid: bool,
    pub message: String,
}

impl VersionValidation {
    fn valid() -> Self {
        Self {
            is_valid: true,
            message: MSG_VALID.to_string(),
        }
    }

    fn invalid(message: &str) -> Self {
        Self {
            is_valid: false,
            message: message.to_string(),
        }
    }
}

/// Decide whether `candidate` is a syntactically valid semantic version.
///
/// Surrounding whitespace is not stripped: `" 1.2.3"` is rejected with the
/// format message, while an all-whitespace string counts as missing.
pub fn validate(candidate: &str) -> VersionValidation {
    if candidate.trim().is_empty() {
        return VersionValidation::invalid(MSG_REQUIRED);
    }
    if !SEMVER.is_match(candidate) {
        return VersionValidation::invalid(MSG_INVALID_FORMAT);
    }
    VersionValidation::valid()
}

/// Shorthand for `validate(candidate).is_valid`.
pub fn is_valid(candidate: &str) -> bool {
    validate(candidate).is_valid
}
