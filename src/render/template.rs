// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Placeholder substitution for manifest templates.
//!
//! A placeholder is `{{ key }}`, optionally followed by filters:
//! `{{ key | default("value") }}` supplies a value when the key is absent and
//! `{{ key | json }}` emits the value as a JSON literal, which is also a valid
//! YAML flow scalar. Anything else between braces (Go templates embedded in
//! ConfigMaps, for instance) is left untouched.

use crate::context::RenderContext;
use crate::error::RenderError;
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*((?:\|[^}]*)?)\}\}")
        .expect("placeholder pattern is valid")
});

static DEFAULT_FILTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^default\(\s*"([^"]*)"\s*\)$"#).expect("default filter pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Filter {
    Default(String),
    Json,
}

/// A named manifest template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    source: String,
}

impl Template {
    pub fn new(name: &str, source: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            source: source.into(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, RenderError> {
        let source = std::fs::read_to_string(path).map_err(|e| RenderError::TemplateSource {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, source })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Substitute every placeholder from `context`.
    pub fn render(&self, context: &RenderContext) -> Result<String, RenderError> {
        let mut out = String::with_capacity(self.source.len());
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(&self.source) {
            let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let filters = self.parse_filters(caps.get(2).map_or("", |m| m.as_str()))?;

            out.push_str(&self.source[last..whole.start()]);
            out.push_str(&self.substitute(key.as_str(), &filters, context)?);
            last = whole.end();
        }

        out.push_str(&self.source[last..]);
        Ok(out)
    }

    fn substitute(
        &self,
        key: &str,
        filters: &[Filter],
        context: &RenderContext,
    ) -> Result<String, RenderError> {
        let fallback = filters.iter().find_map(|f| match f {
            Filter::Default(value) => Some(Value::String(value.clone())),
            Filter::Json => None,
        });

        let value = match context.lookup(key) {
            Some(Value::Null) | None => fallback.ok_or_else(|| RenderError::UnresolvedPlaceholder {
                template: self.name.clone(),
                placeholder: key.to_string(),
            })?,
            Some(value) => value.clone(),
        };

        if filters.contains(&Filter::Json) {
            return Ok(value.to_string());
        }

        Ok(match value {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    fn parse_filters(&self, raw: &str) -> Result<Vec<Filter>, RenderError> {
        raw.split('|')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(|f| {
                if f == "json" {
                    Ok(Filter::Json)
                } else if let Some(caps) = DEFAULT_FILTER.captures(f) {
                    Ok(Filter::Default(caps[1].to_string()))
                } else {
                    Err(RenderError::UnknownFilter {
                        template: self.name.clone(),
                        filter: f.to_string(),
                    })
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_substitutes_values() {
        let template = Template::new("t", "name: {{ name }}\nnamespace: {{namespace}}\n");
        let ctx = RenderContext::new()
            .with("name", "knative-operator")
            .with("namespace", "knative");

        assert_eq!(
            template.render(&ctx).unwrap(),
            "name: knative-operator\nnamespace: knative\n"
        );
    }

    #[test]
    fn test_render_unresolved_placeholder() {
        let template = Template::new("deployment.yaml.j2", "image: {{ image }}");

        assert_eq!(
            template.render(&RenderContext::new()).unwrap_err(),
            RenderError::UnresolvedPlaceholder {
                template: "deployment.yaml.j2".to_string(),
                placeholder: "image".to_string(),
            }
        );
    }

    #[test]
    fn test_render_default_filter() {
        let template = Template::new("t", r#"port: {{ otel_port | default("55678") }}"#);

        assert_eq!(template.render(&RenderContext::new()).unwrap(), "port: 55678");
        assert_eq!(
            template
                .render(&RenderContext::new().with("otel_port", "4317"))
                .unwrap(),
            "port: 4317"
        );
    }

    #[test]
    fn test_render_json_filter_and_nested_values() {
        let template = Template::new("t", "template: {{ tpl | json }}\noverride: {{ images }}");
        let ctx = RenderContext::new()
            .with("tpl", r#"{"method": "{{.Request.Method}}"}"#)
            .with("images", json!({"activator": "img:1"}));

        assert_eq!(
            template.render(&ctx).unwrap(),
            "template: \"{\\\"method\\\": \\\"{{.Request.Method}}\\\"}\"\noverride: {\"activator\":\"img:1\"}"
        );
    }

    #[test]
    fn test_render_leaves_go_templates_alone() {
        let template = Template::new("t", "fmt: '{{.Request.Method}} {{ js .Foo }}'");

        assert_eq!(
            template.render(&RenderContext::new()).unwrap(),
            "fmt: '{{.Request.Method}} {{ js .Foo }}'"
        );
    }

    #[test]
    fn test_render_unknown_filter() {
        let template = Template::new("t", "{{ name | upper }}");

        assert!(matches!(
            template.render(&RenderContext::new().with("name", "x")),
            Err(RenderError::UnknownFilter { ref filter, .. }) if filter == "upper"
        ));
    }
}
