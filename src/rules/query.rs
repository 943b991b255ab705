//! Query parameter model used for conditional matching.
//!
//! The model keeps the distinction between a parameter that is absent and one that is present
//! without a value (`?debug`), which decodes to `""`. The first occurrence of a repeated
//! parameter wins.

use std::collections::HashMap;

use url::form_urlencoded;

/// Decoded query parameters of a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: HashMap<String, String>,
}

impl QueryParams {
    /// Parse a raw query string (without the leading `?`).
    pub fn parse(query: Option<&str>) -> Self {
        let pairs = query
            .map(|query| form_urlencoded::parse(query.as_bytes()))
            .into_iter()
            .flatten();
        Self::from_pairs(pairs)
    }

    /// Build from already decoded pairs. A parameter without a value is given as `""`.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = HashMap::new();
        for (name, value) in pairs {
            params.entry(name.into()).or_insert_with(|| value.into());
        }
        Self { params }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Value used for condition matching.
    ///
    /// Present parameters without a value resolve to `""` so that patterns like `.*` still
    /// match them. Absent parameters resolve to `None` and never match.
    pub fn match_value(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
