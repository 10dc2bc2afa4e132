use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Serialize,
};
use std::fmt;

use crate::StdResult;

/// Characters left as-is in a query component: the RFC 3986 unreserved set.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// An insertion-ordered string map.
///
/// Setting an existing key replaces its value in place, so iteration order is
/// the order in which each key was first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
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

    /// Renders the pairs as `k=v&k=v` with every key and value percent-encoded.
    pub fn to_query_string(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, QUERY_COMPONENT),
                    utf8_percent_encode(v, QUERY_COMPONENT)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Appends the encoded pairs to `url`, keeping any `#fragment` last.
    ///
    /// The first pair is joined with `?` unless `url` already carries a query.
    pub fn append_to(&self, url: &str) -> String {
        if self.is_empty() {
            return url.to_string();
        }
        let (base, fragment) = match url.find('#') {
            Some(index) => url.split_at(index),
            None => (url, ""),
        };
        let separator = match base.find('?') {
            None => "?",
            Some(_) if base.ends_with('?') || base.ends_with('&') => "",
            Some(_) => "&",
        };
        format!("{}{}{}{}", base, separator, self.to_query_string(), fragment)
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        params.extend(iter);
        params
    }
}

impl<K, V> Extend<(K, V)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl IntoIterator for Params {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Serialized as a map, in insertion order.
impl Serialize for Params {
    fn serialize<S>(&self, serializer: S) -> StdResult<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct ParamsVisitor;

impl<'de> Visitor<'de> for ParamsVisitor {
    type Value = Params;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of strings")
    }

    fn visit_map<A>(self, mut access: A) -> StdResult<Params, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut params = Params::new();
        while let Some((key, value)) = access.next_entry::<String, String>()? {
            params.insert(key, value);
        }
        Ok(params)
    }
}

/// Keys keep the order they appear in the source document.
impl<'de> Deserialize<'de> for Params {
    fn deserialize<D>(deserializer: D) -> StdResult<Params, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(ParamsVisitor)
    }
}

/// Header store. Keys are lower-cased on every write and lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Params);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.0.insert(name.as_ref().to_lowercase(), value);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_lowercase())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(&name.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> Extend<(K, V)> for Headers
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_keep_first_seen_order() {
        let mut params = Params::new();
        params.insert("b", "1");
        params.insert("a", "2");
        params.insert("b", "3");
        assert_eq!(params.iter().collect::<Vec<_>>(), vec![("b", "3"), ("a", "2")]);
        assert_eq!(params.len(), 2);
        assert_eq!(params.remove("b"), Some("3".to_string()));
        assert_eq!(params.get("b"), None);
    }

    #[test]
    fn test_query_string_encoding() {
        let params: Params = [("q", "hello world"), ("lang", "zh-CN"), ("x&y", "a=b")]
            .into_iter()
            .collect();
        assert_eq!(
            params.to_query_string(),
            "q=hello%20world&lang=zh-CN&x%26y=a%3Db"
        );
        let params: Params = [("name", "你好")].into_iter().collect();
        assert_eq!(params.to_query_string(), "name=%E4%BD%A0%E5%A5%BD");
    }

    #[test]
    fn test_append_to() {
        let params: Params = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(params.append_to("http://x/y"), "http://x/y?a=1&b=2");
        assert_eq!(params.append_to("http://x/y?c=3"), "http://x/y?c=3&a=1&b=2");
        assert_eq!(params.append_to("http://x/y?"), "http://x/y?a=1&b=2");
        assert_eq!(params.append_to("http://x/y#top"), "http://x/y?a=1&b=2#top");
        assert_eq!(Params::new().append_to("http://x/y"), "http://x/y");
    }

    #[test]
    fn test_params_serde_keep_document_order() {
        let params: Params =
            serde_json::from_str(r#"{"zeta": "1", "alpha": "2", "mid": "3"}"#).unwrap();
        assert_eq!(
            params.iter().collect::<Vec<_>>(),
            vec![("zeta", "1"), ("alpha", "2"), ("mid", "3")]
        );
        assert_eq!(
            serde_json::to_string(&params).unwrap(),
            r#"{"zeta":"1","alpha":"2","mid":"3"}"#
        );
        assert!(serde_json::from_str::<Params>(r#"{"a": 1}"#).is_err());
    }

    #[test]
    fn test_headers_fold_case() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/plain");
        headers.insert("CONTENT-TYPE", "application/json");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("content-type"), Some("application/json"));
        assert_eq!(headers.get("Content-Type"), Some("application/json"));
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![("content-type", "application/json")]
        );
        assert_eq!(headers.remove("Content-type"), Some("application/json".to_string()));
        assert!(headers.is_empty());
    }
}
