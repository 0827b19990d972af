//! Auricle Template Engine
//!
//! Computes each output file name from per-track metadata and a
//! user-supplied template string. The language is deliberately tiny:
//!
//! | Form          | Renders                                              |
//! |---------------|------------------------------------------------------|
//! | `@{name}`     | all values of `name`, joined with `", "`             |
//! | `@{name,sep}` | all values of `name`, joined with the literal `sep`  |
//! | `@{name:N}`   | the N-th (zero-based) value, or nothing if absent    |
//! | `\c`          | the character `c`, literally                         |
//!
//! Unknown variables render as nothing. Substituted text is never
//! re-scanned, so expansion is a single left-to-right pass.

pub mod parse;
pub mod resolve;
pub mod vars;

pub use parse::{Access, Segment, Template};
pub use resolve::{resolve_result_name, WithDefault, DEFAULT_VARIABLE};
pub use vars::{TemplateVars, VariableSource};

/// Substitute every variable reference in `template` using `vars`.
pub fn substitute<V: VariableSource + ?Sized>(template: &str, vars: &V) -> String {
    Template::parse(template).render(vars)
}
