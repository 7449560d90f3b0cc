//! Path pattern grammar, validation, and matching.
//!
//! Grammar (single pass, no backtracking):
//! ```text
//! path    := ('/' segment)*
//! segment := '' | literal | '{' name '}' | '#' name
//! literal := pchar+
//! pchar   := unreserved | pct-encoded | sub-delims | ':' | '@'
//! ```

use std::fmt;

mod matcher;
mod validate;

pub use matcher::PathInfo;

/// One token of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Static(String),
    Param(String),
    Wildcard(String),
}

/// Why a pattern string failed grammar validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("unbalanced '{{' or '}}' in pattern")]
    UnbalancedBraces,
    #[error("literal segment may not contain '{{' or '}}'")]
    BraceInLiteral,
    #[error("parameter or wildcard name must not be empty")]
    EmptyName,
    #[error("duplicate parameter/wildcard name {0:?} in pattern")]
    DuplicateName(String),
    #[error("wildcard '#' must be the first character of the final segment")]
    WildcardNotFinal,
    #[error("wildcard segments are not permitted in scope prefixes")]
    WildcardInScope,
    #[error("invalid percent-encoding in literal segment")]
    InvalidPercentEncoding,
    #[error("literal segment contains a character outside pchar")]
    InvalidLiteralChar,
    #[error("pattern must be empty or start with '/'")]
    MustStartWithSlash,
}

/// A path pattern, parsed once into an ordered token sequence.
///
/// Invariants enforced by [`Pattern::parse`]: parameter/wildcard names are
/// unique within the pattern, the wildcard (if present) is the final token,
/// and percent-encoded triplets in literals use valid hex digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    tokens: Vec<Token>,
}

impl Pattern {
    /// Parse and validate a route pattern. Wildcards (`#name`) are allowed.
    pub fn parse(source: &str) -> Result<Self, PatternError> {
        let tokens = validate::tokenize(source, true)?;
        Ok(Pattern {
            source: source.to_string(),
            tokens,
        })
    }

    /// Parse and validate a scope prefix. Wildcards are rejected: a scope
    /// only ever contributes a fixed or parameterized prefix, never a
    /// catch-all tail.
    pub fn parse_scope(source: &str) -> Result<Self, PatternError> {
        let tokens = validate::tokenize(source, false)?;
        Ok(Pattern {
            source: source.to_string(),
            tokens,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Attempt to match `path` (already percent-decoded) against this
    /// pattern, producing an ordered set of parameter bindings on success.
    pub fn matches(&self, path: &str) -> Option<PathInfo> {
        matcher::match_tokens(&self.tokens, path).map(|params| PathInfo {
            pattern: self.source.clone(),
            path: path.to_string(),
            params,
        })
    }

    /// Concatenate a parent (scope) pattern with a child pattern at build
    /// time: outer prefixes always precede inner prefixes.
    pub fn join(parent: &Pattern, child: &Pattern) -> Pattern {
        let mut tokens = parent.tokens.clone();
        tokens.extend(child.tokens.iter().cloned());
        let source = format!(
            "{}{}",
            parent.source.trim_end_matches('/'),
            if child.source.is_empty() { "/" } else { &child.source }
        );
        Pattern { source, tokens }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
