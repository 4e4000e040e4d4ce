use crate::context::{Context, ContextKey};

use std::ops::Index;
use std::{fmt, slice};

/// A single URL parameter, consisting of a key and a value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Param {
    pub key: String,
    pub value: String,
}

impl Param {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Param {
        Param {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// The path parameters captured by a route match.
///
/// The list is ordered: the first URL parameter is also the first entry, so
/// it is safe to read values by index. Names are not deduplicated; a pattern
/// that declares the same name twice yields both entries.
///
/// ```rust
/// use ctxmux::{Param, Params};
///
/// let params: Params = vec![Param::new("id", "42")].into_iter().collect();
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(&params[0], "42");
/// ```
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: Vec<Param>,
}

static EMPTY: Params = Params { inner: Vec::new() };

impl Params {
    /// Returns an empty parameter list.
    pub fn new() -> Self {
        Self { inner: Vec::new() }
    }

    /// Returns the value of the first parameter registered under the given key.
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.inner
            .iter()
            .find(|param| param.key == key)
            .map(|param| param.value.as_str())
    }

    /// Returns an iterator over the keys and values in the list.
    pub fn iter(&self) -> ParamsIter<'_> {
        ParamsIter {
            inner: self.inner.iter(),
        }
    }

    /// Returns the number of parameters.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if there are no parameters in the list.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Appends a parameter to the end of the list.
    pub fn push(&mut self, param: Param) {
        self.inner.push(param);
    }
}

impl Index<usize> for Params {
    type Output = str;

    fn index(&self, i: usize) -> &Self::Output {
        &self.inner[i].value
    }
}

impl FromIterator<Param> for Params {
    fn from_iter<I: IntoIterator<Item = Param>>(iter: I) -> Self {
        Params {
            inner: iter.into_iter().collect(),
        }
    }
}

impl<'k, 'v> FromIterator<(&'k str, &'v str)> for Params {
    fn from_iter<I: IntoIterator<Item = (&'k str, &'v str)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(key, value)| Param::new(key, value))
            .collect()
    }
}

impl From<matchit::Params<'_, '_>> for Params {
    fn from(params: matchit::Params<'_, '_>) -> Self {
        params.iter().collect()
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// An iterator over the keys and values of a route's [parameters](crate::Params).
pub struct ParamsIter<'ps> {
    inner: slice::Iter<'ps, Param>,
}

impl<'ps> Iterator for ParamsIter<'ps> {
    type Item = (&'ps str, &'ps str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|param| (param.key.as_str(), param.value.as_str()))
    }
}

impl ExactSizeIterator for ParamsIter<'_> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

// Private so that nothing outside this module can read or shadow the binding.
struct ParamsKey;

impl ContextKey for ParamsKey {
    type Value = Params;
}

impl Context {
    /// Returns a new context carrying `params`.
    pub fn with_params(&self, params: Params) -> Context {
        self.with_value::<ParamsKey>(params)
    }

    /// Returns the path parameters bound to this context, or an empty list if
    /// none were bound.
    pub fn params(&self) -> &Params {
        self.value::<ParamsKey>().unwrap_or(&EMPTY)
    }
}
