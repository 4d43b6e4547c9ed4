//! Named request parameters and the ordered path builder.
//!
//! Every endpoint in the API takes some of its parameters as `/`-separated path
//! segments and the rest as query string or form fields. [`construct_params`]
//! removes the path keys it uses from a [`Params`] map so whatever is left can be
//! forwarded as-is.

use serde::Serialize;

use crate::error::{Error, Result};

/// Insertion-ordered map of parameter names to stringified values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `key`, replacing the value in place if it is already present.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Builder form of [`Params::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    /// Removes `key` and returns its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(idx).1)
    }

    /// Moves every entry whose key is not in `keep` into a new map.
    pub fn split_off_except(&mut self, keep: &[&str]) -> Params {
        let (kept, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.0)
            .into_iter()
            .partition(|(k, _)| keep.contains(&k.as_str()));
        self.0 = kept;
        Params(rest)
    }

    /// Appends all entries of `other`, replacing keys that already exist.
    pub fn extend(&mut self, other: Params) {
        for (k, v) in other.0 {
            self.insert(k, v);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl<K: Into<String>, V: ToString, const N: usize> From<[(K, V); N]> for Params {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Builds the `/`-joined path from `required` keys followed by whichever
/// `optional` keys are present, removing each used key from `params`.
///
/// Fails with [`Error::MissingParameter`] naming the first absent required key.
/// `params` is not modified on failure.
pub fn construct_params(params: &mut Params, required: &[&str], optional: &[&str]) -> Result<String> {
    if let Some(missing) = required.iter().find(|key| !params.contains_key(key)) {
        return Err(Error::MissingParameter(missing.to_string()));
    }

    let mut segments = Vec::with_capacity(required.len() + optional.len());
    for key in required {
        if let Some(value) = params.remove(key) {
            segments.push(value);
        }
    }
    for key in optional {
        if let Some(value) = params.remove(key) {
            segments.push(value);
        }
    }

    Ok(segments.join("/"))
}
