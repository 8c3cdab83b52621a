//! Minimal text templates with `{{.field}}` placeholders.
//!
//! Templates are parsed once into literal and field segments. Rendering is a
//! pure lookup in the supplied map, so identical inputs always produce
//! identical output.

use std::collections::HashMap;

use thiserror::Error;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template {template}: unclosed action starting at byte {offset}")]
    Unclosed { template: String, offset: usize },

    #[error("template {template}: unsupported action {{{{{action}}}}} at byte {offset}")]
    UnsupportedAction {
        template: String,
        action: String,
        offset: usize,
    },

    #[error("template {template}: map has no entry for key \"{key}\"")]
    MissingKey { template: String, key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse `text`. Only field actions (`{{.name}}`, optional inner
    /// whitespace) are accepted.
    pub fn compile(name: impl Into<String>, text: &str) -> Result<Self, TemplateError> {
        let name = name.into();
        let mut segments = Vec::new();
        let mut rest = text;
        let mut offset = 0;

        while let Some(start) = rest.find(OPEN) {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }

            let after_open = &rest[start + OPEN.len()..];
            let end = after_open.find(CLOSE).ok_or_else(|| TemplateError::Unclosed {
                template: name.clone(),
                offset: offset + start,
            })?;

            let action = after_open[..end].trim();
            let field = action
                .strip_prefix('.')
                .filter(|f| !f.is_empty() && f.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
                .ok_or_else(|| TemplateError::UnsupportedAction {
                    template: name.clone(),
                    action: action.to_string(),
                    offset: offset + start,
                })?;
            segments.push(Segment::Field(field.to_string()));

            let consumed = start + OPEN.len() + end + CLOSE.len();
            rest = &rest[consumed..];
            offset += consumed;
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { name, segments })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field names referenced by the template, in order of appearance.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Field(f) => Some(f.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every field from `values`. A field absent from the map is
    /// an error, not an empty string.
    pub fn render(&self, values: &HashMap<String, String>) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(key) => {
                    let value = values.get(key).ok_or_else(|| TemplateError::MissingKey {
                        template: self.name.clone(),
                        key: key.clone(),
                    })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_fields() {
        let t = Template::compile("t", "Cluster {{.name}} in {{ .location }}.").unwrap();
        let out = t
            .render(&values(&[("name", "prod"), ("location", "us-central1")]))
            .unwrap();
        assert_eq!(out, "Cluster prod in us-central1.");
        assert_eq!(t.fields().collect::<Vec<_>>(), vec!["name", "location"]);
    }

    #[test]
    fn test_repeated_and_adjacent_fields() {
        let t = Template::compile("t", "{{.a}}{{.b}}-{{.a}}").unwrap();
        assert_eq!(t.render(&values(&[("a", "x"), ("b", "y")])).unwrap(), "xy-x");
    }

    #[test]
    fn test_missing_key_fails() {
        let t = Template::compile("gke-cost", "Q: {{.user_question}}").unwrap();
        let err = t.render(&HashMap::new()).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingKey {
                template: "gke-cost".to_string(),
                key: "user_question".to_string()
            }
        );
    }

    #[test]
    fn test_empty_value_renders_empty() {
        let t = Template::compile("t", "[{{.v}}]").unwrap();
        assert_eq!(t.render(&values(&[("v", "")])).unwrap(), "[]");
    }

    #[test]
    fn test_values_are_not_reinterpreted() {
        let t = Template::compile("t", "{{.v}}").unwrap();
        let out = t.render(&values(&[("v", "{{.other}}")])).unwrap();
        assert_eq!(out, "{{.other}}");
    }

    #[test]
    fn test_unclosed_action() {
        let err = Template::compile("t", "hello {{.name").unwrap_err();
        assert_eq!(
            err,
            TemplateError::Unclosed {
                template: "t".to_string(),
                offset: 6
            }
        );
    }

    #[test]
    fn test_unsupported_action() {
        let err = Template::compile("t", "ab{{if .x}}").unwrap_err();
        assert!(matches!(err, TemplateError::UnsupportedAction { offset: 2, .. }));
        assert_eq!(err.to_string(), "template t: unsupported action {{if .x}} at byte 2");

        assert!(Template::compile("t", "{{.}}").is_err());
        assert!(Template::compile("t", "{{.a-b}}").is_err());
    }

    #[test]
    fn test_plain_text() {
        let t = Template::compile("t", "no placeholders } here").unwrap();
        assert_eq!(t.render(&HashMap::new()).unwrap(), "no placeholders } here");
        assert_eq!(t.name(), "t");
    }
}
