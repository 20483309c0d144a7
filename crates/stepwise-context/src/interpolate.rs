//! Template-string interpolation
//!
//! `{{path}}` tokens are replaced with the string form of the value found at
//! `path`, or nothing when the path does not resolve. This is a regex scan,
//! not a parser: a `{{` without a `}}` later on the same line stays literal.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^{}\r\n]*)\}\}").expect("placeholder pattern is valid"));

/// Render a value the way it is spliced into text
///
/// Strings are inserted raw, `null` renders empty, other scalars use their
/// JSON form and containers are serialized as compact JSON.
#[must_use]
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string(value).unwrap_or_default()
        }
    }
}

/// Replace every `{{path}}` token using `lookup`
///
/// Never fails; unresolved tokens render as the empty string.
pub fn interpolate_with<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<Value>,
{
    if !template.contains("{{") {
        return template.to_string();
    }
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let token = caps.get(1).map_or("", |m| m.as_str()).trim();
            if token.is_empty() {
                return String::new();
            }
            lookup(token).as_ref().map(render_value).unwrap_or_default()
        })
        .into_owned()
}
