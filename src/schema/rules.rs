//! Validation rules and the predefined rule library
//!
//! A rule is either a pattern paired with a human-readable description,
//! or the name of a type the value must be an instance of. Patterns are
//! compiled when the rule is built, so a bad user pattern surfaces at
//! declaration time as an `Argument` error.
//!
//! Every pattern must match the value's whole textual form.

use std::fmt;

use regex::Regex;

use super::errors::{AttrError, AttrResult};

/// Rule attached to a field
#[derive(Debug, Clone)]
pub enum ValidationRule {
    /// Value's textual form must fully match `regex`
    Pattern { regex: Regex, description: String },
    /// Value must be an instance of (or subtype of) the named type
    Type(String),
}

impl ValidationRule {
    /// Compiles a user pattern; the pattern is anchored at both ends
    pub fn pattern(pattern: &str, description: impl Into<String>) -> AttrResult<Self> {
        let anchored = format!("^(?:{})$", pattern);
        let regex = Regex::new(&anchored)
            .map_err(|e| AttrError::Argument(format!("invalid pattern '{}': {}", pattern, e)))?;
        Ok(ValidationRule::Pattern {
            regex,
            description: description.into(),
        })
    }

    /// "Must be an instance of `type_name`" rule
    pub fn isa(type_name: impl Into<String>) -> Self {
        ValidationRule::Type(type_name.into())
    }

    /// Text used after "is not" in failure messages
    pub fn description(&self) -> &str {
        match self {
            ValidationRule::Pattern { description, .. } => description,
            ValidationRule::Type(name) => name,
        }
    }

    /// Returns true if this rule checks a value's type
    pub fn is_type_rule(&self) -> bool {
        matches!(self, ValidationRule::Type(_))
    }
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationRule::Pattern { regex, description } => {
                write!(f, "like /{}/ ({})", regex.as_str(), description)
            }
            ValidationRule::Type(name) => write!(f, "isa {}", name),
        }
    }
}

/// Custom pattern with its failure description
pub fn pattern(pattern: &str, description: impl Into<String>) -> AttrResult<ValidationRule> {
    ValidationRule::pattern(pattern, description)
}

/// Signed decimal integer
pub fn integer() -> AttrResult<ValidationRule> {
    ValidationRule::pattern(r"[+-]?\d+", "an Integer")
}

/// Decimal number with optional fraction and exponent
pub fn float() -> AttrResult<ValidationRule> {
    ValidationRule::pattern(r"[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?", "a Float")
}

pub fn boolean() -> AttrResult<ValidationRule> {
    ValidationRule::pattern(r"0|1|true|false", "a Boolean")
}

pub fn email() -> AttrResult<ValidationRule> {
    ValidationRule::pattern(r"[^@\s]+@[^@\s]+\.[^@\s.]+", "an Email address")
}

/// `YYYY-M-D`
pub fn date() -> AttrResult<ValidationRule> {
    ValidationRule::pattern(r"\d{4}-\d{1,2}-\d{1,2}", "a Date (YYYY-M-D)")
}

/// `YYYY-MM-DDTHH:MM:SS`
pub fn datetime() -> AttrResult<ValidationRule> {
    ValidationRule::pattern(
        r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}",
        "a DateTime (YYYY-MM-DDTHH:MM:SS)",
    )
}

/// String of `min..=max` characters
pub fn length(min: usize, max: usize) -> AttrResult<ValidationRule> {
    if min > max {
        return Err(AttrError::Argument(format!(
            "length: min ({}) is greater than max ({})",
            min, max
        )));
    }
    ValidationRule::pattern(
        &format!("(?s).{{{},{}}}", min, max),
        format!("a string of {} to {} characters", min, max),
    )
}

/// One of an enumerated set, compared literally
pub fn is_in<S: AsRef<str>>(values: &[S], description: impl Into<String>) -> AttrResult<ValidationRule> {
    if values.is_empty() {
        return Err(AttrError::Argument("is_in requires at least one value".into()));
    }
    let alternatives: Vec<String> = values.iter().map(|v| regex::escape(v.as_ref())).collect();
    ValidationRule::pattern(&alternatives.join("|"), description)
}
