//! Query string parsing: an ordered map with last-value-wins semantics.

/// Parsed query parameters. Keys preserve first-seen order; when a key
/// repeats, the last value wins and earlier values are discarded.
#[derive(Debug, Clone, Default)]
pub struct QueryMap {
    entries: Vec<(String, String)>,
}

impl QueryMap {
    /// Parse a raw query string (without the leading `?`). Keys without a
    /// `=` are bound to an empty value; percent-encoding is decoded.
    pub fn parse(raw: &str) -> Self {
        let mut map = QueryMap {
            entries: Vec::new(),
        };
        if raw.is_empty() {
            return map;
        }
        for pair in raw.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = match pair.split_once('=') {
                Some((k, v)) => (k, v),
                None => (pair, ""),
            };
            let key = decode_form(key);
            let value = decode_form(value);
            if let Some(slot) = map.entries.iter_mut().find(|(k, _)| *k == key) {
                slot.1 = value;
            } else {
                map.entries.push((key, value));
            }
        }
        map
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn decode_form(s: &str) -> String {
    percent_encoding::percent_decode_str(&s.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_value_wins_on_duplicate_keys() {
        let q = QueryMap::parse("a=1&a=2&b=3");
        assert_eq!(q.get("a"), Some("2"));
        assert_eq!(q.get("b"), Some("3"));
    }

    #[test]
    fn key_without_equals_is_empty_value() {
        let q = QueryMap::parse("flag&name=x");
        assert_eq!(q.get("flag"), Some(""));
        assert_eq!(q.get("name"), Some("x"));
    }

    #[test]
    fn decodes_percent_and_plus() {
        let q = QueryMap::parse("q=a%20b+c");
        assert_eq!(q.get("q"), Some("a b c"));
    }

    #[test]
    fn preserves_first_seen_order() {
        let q = QueryMap::parse("b=1&a=2&b=3");
        let keys: Vec<_> = q.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
