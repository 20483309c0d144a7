//! Loaded template implementations

use serde_json::{Map, Value};
use stepwise_model::TemplateRef;

/// A loaded, renderable template
///
/// The document is the template definition as loaded; rendering substitutes
/// context data into its string leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    reference: TemplateRef,
    document: Value,
}

impl Template {
    /// Create template from its reference and document
    #[inline]
    #[must_use]
    pub fn new(reference: TemplateRef, document: Value) -> Self {
        Self {
            reference,
            document,
        }
    }

    /// Reference this template was loaded for
    #[inline]
    #[must_use]
    pub fn reference(&self) -> &TemplateRef {
        &self.reference
    }

    /// Raw template document
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Top-level field of the document
    #[inline]
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.document.get(name)
    }

    /// Render the document, passing every string leaf through `interpolate`
    pub fn render_with<F>(&self, interpolate: F) -> Value
    where
        F: Fn(&str) -> String,
    {
        render_value(&self.document, &interpolate)
    }
}

fn render_value<F>(value: &Value, interpolate: &F) -> Value
where
    F: Fn(&str) -> String,
{
    match value {
        Value::String(text) => Value::String(interpolate(text)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| render_value(item, interpolate))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), render_value(v, interpolate)))
                .collect::<Map<String, Value>>(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_with_interpolates_string_leaves() {
        let template = Template::new(
            TemplateRef::step("default", "intro.json"),
            json!({"title": "Hi {{name}}", "items": ["{{name}}", 3], "count": 2}),
        );
        let rendered = template.render_with(|s| s.replace("{{name}}", "Ann"));
        assert_eq!(
            rendered,
            json!({"title": "Hi Ann", "items": ["Ann", 3], "count": 2})
        );
    }

    #[test]
    fn field_lookup() {
        let template = Template::new(
            TemplateRef::layout("default", "main.json"),
            json!({"regions": ["header", "body"]}),
        );
        assert!(template.field("regions").is_some());
        assert!(template.field("missing").is_none());
        assert_eq!(template.reference().identifier, "main.json");
    }
}
