use crate::error::FrameworkError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Flat key/value data: a submitted body or a query string
///
/// POST handlers receive this as their first argument. Nested JSON values are
/// kept as their JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(BTreeMap<String, String>);

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style insert, handy in tests
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Get a field or fail with a 400-mapped `ParamError`
    pub fn required(&self, key: &str) -> Result<&str, FrameworkError> {
        self.get(key).ok_or_else(|| FrameworkError::param(key))
    }

    /// Get a field and parse it, e.g. `form.parse::<u64>("id")?`
    pub fn parse<T: FromStr>(&self, key: &str) -> Result<T, FrameworkError> {
        let raw = self.required(key)?;
        raw.parse()
            .map_err(|_| FrameworkError::param_parse(raw, std::any::type_name::<T>()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deserialize the fields into a typed struct
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// #[derive(Deserialize)]
    /// struct CommentForm { author: String, body: String }
    ///
    /// let comment: CommentForm = form.deserialize()?;
    /// ```
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, FrameworkError> {
        let encoded = serde_urlencoded::to_string(&self.0)
            .map_err(|e| FrameworkError::Body(e.to_string()))?;
        serde_urlencoded::from_str(&encoded).map_err(|e| FrameworkError::Body(e.to_string()))
    }
}

impl FromIterator<(String, String)> for FormData {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[(&str, &str); N]> for FormData {
    fn from(pairs: [(&str, &str); N]) -> Self {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Comment {
        author: String,
        rating: u8,
    }

    #[test]
    fn test_required_and_parse() {
        let form = FormData::from([("id", "12"), ("title", "Hello")]);

        assert_eq!(form.required("title").unwrap(), "Hello");
        assert_eq!(form.parse::<u64>("id").unwrap(), 12);
        assert_eq!(form.required("body").unwrap_err().status_code(), 400);
        assert!(matches!(
            form.parse::<u64>("title"),
            Err(FrameworkError::ParamParse { .. })
        ));
    }

    #[test]
    fn test_deserialize_into_struct() {
        let form = FormData::new().with("author", "ann").with("rating", "4");
        let comment: Comment = form.deserialize().unwrap();
        assert_eq!(
            comment,
            Comment {
                author: "ann".into(),
                rating: 4
            }
        );
    }
}
