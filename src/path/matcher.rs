use super::Token;

/// Parameter and wildcard bindings produced by a successful match, in
/// pattern order. Supports both by-name and by-position lookup since
/// extractors may ask for either. Values are owned so a `PathInfo` can
/// outlive the original path string, e.g. stored on a `Request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathInfo {
    pub(super) pattern: String,
    pub(super) path: String,
    pub(super) params: Vec<(String, String)>,
}

impl PathInfo {
    /// Build a `PathInfo` directly from its constituent parts, used by the
    /// connection task to bind a router match's params onto the request.
    pub fn from_parts(pattern: String, path: String, params: Vec<(String, String)>) -> Self {
        PathInfo {
            pattern,
            path,
            params,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_index(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Match `tokens` against `path` left to right, one segment at a time, with
/// no backtracking: a static token must match its segment exactly, a param
/// token consumes exactly one segment, and a wildcard token (always last)
/// consumes the remainder of the path verbatim including any interior
/// slashes.
pub fn match_tokens(tokens: &[Token], path: &str) -> Option<Vec<(String, String)>> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let mut params = Vec::new();
    let mut consumed = 0;

    for token in tokens {
        if let Token::Wildcard(name) = token {
            params.push((name.clone(), segments[consumed..].join("/")));
            return Some(params);
        }

        let segment = match segments.get(consumed) {
            Some(s) => *s,
            None => return None,
        };

        match token {
            Token::Static(literal) => {
                if segment != literal {
                    return None;
                }
            }
            Token::Param(name) => {
                params.push((name.clone(), segment.to_string()));
            }
            Token::Wildcard(_) => unreachable!("handled above"),
        }

        consumed += 1;
    }

    if consumed == segments.len() {
        Some(params)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Pattern;

    #[test]
    fn matches_static_exactly() {
        let p = Pattern::parse("/users/all").unwrap();
        assert!(p.matches("/users/all").is_some());
        assert!(p.matches("/users/allx").is_none());
    }

    #[test]
    fn extracts_param_in_order() {
        let p = Pattern::parse("/users/{id}/posts/{post_id}").unwrap();
        let info = p.matches("/users/42/posts/7").unwrap();
        assert_eq!(info.get("id"), Some("42"));
        assert_eq!(info.get("post_id"), Some("7"));
        assert_eq!(info.get_index(0), Some("42"));
        assert_eq!(info.get_index(1), Some("7"));
    }

    #[test]
    fn param_does_not_cross_slash() {
        let p = Pattern::parse("/users/{id}").unwrap();
        assert!(p.matches("/users/42/extra").is_none());
    }

    #[test]
    fn wildcard_consumes_remainder_with_slashes() {
        let p = Pattern::parse("/assets/#rest").unwrap();
        let info = p.matches("/assets/css/app.css").unwrap();
        assert_eq!(info.get("rest"), Some("css/app.css"));
    }

    #[test]
    fn empty_param_segment_rejected() {
        let p = Pattern::parse("/users/{id}/posts").unwrap();
        assert!(p.matches("/users//posts").is_none());
    }

    #[test]
    fn root_pattern_matches_only_root() {
        let p = Pattern::parse("/").unwrap();
        assert!(p.matches("/").is_some());
        assert!(p.matches("/x").is_none());
    }
}
