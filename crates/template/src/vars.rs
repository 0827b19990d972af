//! Variable tables consulted during substitution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Anything that can answer "what are the values of variable `name`?".
pub trait VariableSource {
    /// Values bound to `name`, or `None` if the variable is unknown.
    fn values(&self, name: &str) -> Option<&[String]>;
}

/// Mapping from variable name to an ordered list of string values.
///
/// A variable may carry several values (multi-valued tags such as
/// `artist`). An empty list is a known variable with no values: it joins
/// to the empty string and every index into it is out of range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateVars {
    vars: BTreeMap<String, Vec<String>>,
}

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `values`, replacing any previous binding.
    pub fn set<I, S>(&mut self, name: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vars
            .insert(name.into(), values.into_iter().map(Into::into).collect());
    }

    /// Bind `name` to exactly one value.
    pub fn set_single(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), vec![value.into()]);
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.vars.get(name).map(Vec::as_slice)
    }

    /// First value of `name`; `None` when unset or bound to no values.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name)?.first().map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.vars.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Overlay `other` onto `self`; bindings in `other` win.
    pub fn merge(&mut self, other: TemplateVars) {
        self.vars.extend(other.vars);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl VariableSource for TemplateVars {
    fn values(&self, name: &str) -> Option<&[String]> {
        self.get(name)
    }
}

impl<K, V, S> FromIterator<(K, V)> for TemplateVars
where
    K: Into<String>,
    V: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut vars = TemplateVars::new();
        for (name, values) in iter {
            vars.set(name, values);
        }
        vars
    }
}
