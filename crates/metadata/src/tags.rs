//! Tag values and their string form.

use std::fmt;

use auricle_template::TemplateVars;

/// A tag value of one of the types templates can show.
///
/// Binary and structured tag payloads (cover art, dates, samples) have no
/// variant and are dropped before they get here.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Bool(bool),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("TRUE"),
            Self::Bool(false) => f.write_str("FALSE"),
            Self::I32(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            // Six fractional digits, like C's `%f`.
            Self::F32(v) => write!(f, "{v:.6}"),
            Self::F64(v) => write!(f, "{v:.6}"),
            Self::Str(v) => f.write_str(v),
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

/// Tags accumulated while a probe runs.
///
/// Tags arrive in batches; a later batch carrying a tag name replaces
/// every value previously recorded under that name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagTable {
    vars: TemplateVars,
}

impl TagTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the values of one tag, replacing earlier ones.
    ///
    /// Unsupported values are expected to be filtered out by the caller,
    /// so a tag whose values were all dropped is recorded with an empty
    /// list rather than skipped.
    pub fn update<I>(&mut self, name: &str, values: I) -> &[String]
    where
        I: IntoIterator<Item = TagValue>,
    {
        self.vars.set(name, values.into_iter().map(|v| v.to_string()));
        self.vars.get(name).unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.vars.get(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn into_vars(self) -> TemplateVars {
        self.vars
    }
}
