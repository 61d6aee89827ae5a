//! Multi-value dictionary for query strings and form-encoded bodies.

use std::collections::{hash_map, HashMap};

use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};

/// A string-keyed mapping in which each key holds a list of values.
///
/// [`get`](QueryDict::get) returns the **last** value for a key, matching
/// the collapse rule the bind path applies to scalar fields, while
/// [`get_list`](QueryDict::get_list) returns every value for list-typed
/// fields.
///
/// # Examples
///
/// ```
/// use schemaform_http::QueryDict;
///
/// let qd = QueryDict::parse("color=red&color=blue&size=large");
/// assert_eq!(qd.get("color"), Some("blue"));
/// assert_eq!(
///     qd.get_list("color"),
///     Some(&vec!["red".to_string(), "blue".to_string()])
/// );
/// assert_eq!(qd.get("size"), Some("large"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryDict {
    data: HashMap<String, Vec<String>>,
}

impl QueryDict {
    /// Creates an empty `QueryDict`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a form-urlencoded string (`key1=val1&key2=val2`).
    ///
    /// Handles percent-decoding and `+`-as-space; repeated keys accumulate
    /// into value lists in submission order.
    pub fn parse(query_string: &str) -> Self {
        let mut qd = Self::new();
        for pair in query_string.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair
                .find('=')
                .map_or((pair, ""), |eq| (&pair[..eq], &pair[eq + 1..]));
            qd.append(decode(key), decode(value));
        }
        qd
    }

    /// Returns the last value for `key`, or `None`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .and_then(|v| v.last())
            .map(String::as_str)
    }

    /// Returns all values for `key`, or `None`.
    pub fn get_list(&self, key: &str) -> Option<&Vec<String>> {
        self.data.get(key)
    }

    /// Sets a single value for `key`, replacing any existing values.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), vec![value.into()]);
    }

    /// Appends a value to the list for `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.entry(key.into()).or_default().push(value.into());
    }

    /// Removes `key` and returns its values, if present.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.data.remove(key)
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> hash_map::Keys<'_, String, Vec<String>> {
        self.data.keys()
    }

    /// Returns an iterator over (key, value-list) pairs.
    pub fn iter(&self) -> hash_map::Iter<'_, String, Vec<String>> {
        self.data.iter()
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no keys are present.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Encodes this dictionary back into a form-urlencoded string, with
    /// pairs sorted for deterministic output.
    pub fn urlencode(&self) -> String {
        let mut parts: Vec<String> = self
            .data
            .iter()
            .flat_map(|(key, values)| {
                values.iter().map(move |value| {
                    format!("{}={}", encode(key), encode(value))
                })
            })
            .collect();
        parts.sort();
        parts.join("&")
    }
}

impl<'a> IntoIterator for &'a QueryDict {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = hash_map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

fn decode(raw: &str) -> String {
    let plus_decoded = raw.replace('+', " ");
    percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

fn encode(raw: &str) -> String {
    utf8_percent_encode(raw, NON_ALPHANUMERIC).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let qd = QueryDict::parse("name=huaiyu&age=40");
        assert_eq!(qd.get("name"), Some("huaiyu"));
        assert_eq!(qd.get("age"), Some("40"));
        assert_eq!(qd.len(), 2);
    }

    #[test]
    fn test_parse_repeated_keys() {
        let qd = QueryDict::parse("friends=a&friends=b");
        assert_eq!(qd.get("friends"), Some("b"));
        assert_eq!(
            qd.get_list("friends"),
            Some(&vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_parse_percent_and_plus() {
        let qd = QueryDict::parse("q=hello+world&note=a%26b");
        assert_eq!(qd.get("q"), Some("hello world"));
        assert_eq!(qd.get("note"), Some("a&b"));
    }

    #[test]
    fn test_parse_empty_value_and_missing_eq() {
        let qd = QueryDict::parse("a=&b");
        assert_eq!(qd.get("a"), Some(""));
        assert_eq!(qd.get("b"), Some(""));
    }

    #[test]
    fn test_set_replaces() {
        let mut qd = QueryDict::parse("k=a&k=b");
        qd.set("k", "c");
        assert_eq!(qd.get_list("k"), Some(&vec!["c".to_string()]));
    }

    #[test]
    fn test_remove() {
        let mut qd = QueryDict::parse("k=a");
        assert!(qd.contains_key("k"));
        assert_eq!(qd.remove("k"), Some(vec!["a".to_string()]));
        assert!(!qd.contains_key("k"));
        assert!(qd.is_empty());
    }

    #[test]
    fn test_urlencode_roundtrip() {
        let qd = QueryDict::parse("b=2&a=1&a=3");
        assert_eq!(qd.urlencode(), "a=1&a=3&b=2");
    }

    #[test]
    fn test_get_missing() {
        let qd = QueryDict::new();
        assert_eq!(qd.get("missing"), None);
        assert_eq!(qd.get_list("missing"), None);
    }
}
