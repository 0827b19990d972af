//! Result-name resolution with an optional per-track override.

use crate::parse::Template;
use crate::vars::{TemplateVars, VariableSource};

/// Variable through which an override template sees the base result.
pub const DEFAULT_VARIABLE: &str = "default";

/// A variable table with one extra single-valued `default` binding layered
/// on top. The underlying table is never modified.
#[derive(Debug, Clone, Copy)]
pub struct WithDefault<'a, V: ?Sized> {
    base: &'a V,
    default: &'a [String],
}

impl<'a, V: VariableSource + ?Sized> WithDefault<'a, V> {
    pub fn new(base: &'a V, default: &'a [String]) -> Self {
        Self { base, default }
    }
}

impl<V: VariableSource + ?Sized> VariableSource for WithDefault<'_, V> {
    fn values(&self, name: &str) -> Option<&[String]> {
        if name == DEFAULT_VARIABLE {
            Some(self.default)
        } else {
            self.base.values(name)
        }
    }
}

/// Compute a track's output base name.
///
/// `template` is rendered first. When `override_template` is given, it is
/// rendered second with the first result available as `@{default}`, so an
/// override such as `@{default} (remastered)` extends the shared naming
/// scheme instead of replacing it.
pub fn resolve_result_name(
    template: &str,
    override_template: Option<&str>,
    vars: &TemplateVars,
) -> String {
    let base = Template::parse(template).render(vars);
    match override_template {
        Some(over) => {
            let default = [base];
            let layered = WithDefault::new(vars, &default);
            let resolved = Template::parse(over).render(&layered);
            tracing::debug!(template, over, %resolved, "Resolved overridden result name");
            resolved
        }
        None => base,
    }
}
