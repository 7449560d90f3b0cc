use std::collections::HashSet;

use super::{PatternError, Token};

/// Parse a pattern string into tokens, enforcing the path pattern grammar.
///
/// `allow_wildcard` is false for scope prefixes and true for route patterns.
pub fn tokenize(source: &str, allow_wildcard: bool) -> Result<Vec<Token>, PatternError> {
    if source.is_empty() || source == "/" {
        return Ok(Vec::new());
    }
    if !source.starts_with('/') {
        return Err(PatternError::MustStartWithSlash);
    }

    let raw_segments: Vec<&str> = source[1..].split('/').collect();
    let last = raw_segments.len().saturating_sub(1);
    let mut tokens = Vec::with_capacity(raw_segments.len());
    let mut seen: HashSet<String> = HashSet::new();

    for (i, seg) in raw_segments.iter().enumerate() {
        if let Some(name) = seg.strip_prefix('#') {
            if !allow_wildcard {
                return Err(PatternError::WildcardInScope);
            }
            if i != last {
                return Err(PatternError::WildcardNotFinal);
            }
            if name.is_empty() {
                return Err(PatternError::EmptyName);
            }
            if !seen.insert(name.to_string()) {
                return Err(PatternError::DuplicateName(name.to_string()));
            }
            tokens.push(Token::Wildcard(name.to_string()));
            continue;
        }

        if let Some(rest) = seg.strip_prefix('{') {
            let name = rest
                .strip_suffix('}')
                .ok_or(PatternError::UnbalancedBraces)?;
            if name.contains('{') || name.contains('}') {
                return Err(PatternError::UnbalancedBraces);
            }
            if name.is_empty() {
                return Err(PatternError::EmptyName);
            }
            if !seen.insert(name.to_string()) {
                return Err(PatternError::DuplicateName(name.to_string()));
            }
            tokens.push(Token::Param(name.to_string()));
            continue;
        }

        if seg.contains('{') || seg.contains('}') {
            return Err(PatternError::BraceInLiteral);
        }
        if seg.contains('#') {
            return Err(PatternError::WildcardNotFinal);
        }
        validate_literal(seg)?;
        tokens.push(Token::Static(seg.to_string()));
    }

    Ok(tokens)
}

/// Validate a literal segment's bytes against `pchar` (RFC 3986) plus the
/// sub-delims/`:`/`@` the grammar additionally allows, checking
/// percent-encoded triplets use valid hex digits.
fn validate_literal(seg: &str) -> Result<(), PatternError> {
    let bytes = seg.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'%' {
            let h1 = bytes.get(i + 1).copied();
            let h2 = bytes.get(i + 2).copied();
            match (h1, h2) {
                (Some(a), Some(c)) if a.is_ascii_hexdigit() && c.is_ascii_hexdigit() => {
                    i += 3;
                    continue;
                }
                _ => return Err(PatternError::InvalidPercentEncoding),
            }
        }
        if !is_pchar(b) {
            return Err(PatternError::InvalidLiteralChar);
        }
        i += 1;
    }
    Ok(())
}

fn is_pchar(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'-' | b'.' | b'_' | b'~' // unreserved
                | b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+' | b',' | b';' | b'=' // sub-delims
                | b':' | b'@'
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unbalanced_braces() {
        assert_eq!(
            tokenize("/users/{id", true),
            Err(PatternError::UnbalancedBraces)
        );
    }

    #[test]
    fn rejects_duplicate_names() {
        assert_eq!(
            tokenize("/users/{id}/posts/{id}", true),
            Err(PatternError::DuplicateName("id".into()))
        );
    }

    #[test]
    fn wildcard_must_be_final() {
        assert_eq!(
            tokenize("/assets/#rest/more", true),
            Err(PatternError::WildcardNotFinal)
        );
    }

    #[test]
    fn wildcard_rejected_in_scope() {
        assert_eq!(
            tokenize("/assets/#rest", false),
            Err(PatternError::WildcardInScope)
        );
    }

    #[test]
    fn accepts_percent_encoding_either_case() {
        assert!(tokenize("/users/a%2Fb", true).is_ok());
        assert!(tokenize("/users/a%2fb", true).is_ok());
    }

    #[test]
    fn rejects_bad_percent_encoding() {
        assert_eq!(
            tokenize("/users/a%2g", true),
            Err(PatternError::InvalidPercentEncoding)
        );
    }
}
