// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::context_keys;
use crate::context::RenderContext;
use crate::error::RenderError;
use crate::render::Template;
use crate::types::{DesiredResourceSet, ResourceDescriptor};
use serde::Deserialize;
use tracing::{debug, instrument};

/// Render `templates` in order and collect every manifest document they produce.
///
/// Empty documents (a bare `---` or a comment-only section) are skipped.
/// Namespaced objects that name no namespace land in the model namespace. The
/// output is a pure function of its inputs: mapping keys are kept sorted, so
/// rendering the same context twice yields identical sets.
#[instrument(skip_all)]
pub fn render<'a>(
    context: &RenderContext,
    templates: impl IntoIterator<Item = &'a Template>,
) -> Result<DesiredResourceSet, RenderError> {
    let mut resources = DesiredResourceSet::new();
    let default_namespace = context.get_str(context_keys::MODEL_NAME);

    for template in templates {
        let text = template.render(context)?;
        let before = resources.len();

        for (index, document) in serde_yaml::Deserializer::from_str(&text).enumerate() {
            let value = serde_yaml::Value::deserialize(document).map_err(|e| {
                RenderError::InvalidYaml {
                    template: template.name().to_string(),
                    reason: e.to_string(),
                }
            })?;
            if value.is_null() {
                continue;
            }

            let invalid = |reason: String| RenderError::InvalidResource {
                template: template.name().to_string(),
                index,
                reason,
            };
            let body: serde_json::Value =
                serde_yaml::from_value(value).map_err(|e| invalid(e.to_string()))?;
            let resource = ResourceDescriptor::from_value(body).map_err(invalid)?;
            resources.push(match default_namespace {
                Some(namespace) => resource.with_default_namespace(namespace),
                None => resource,
            });
        }

        debug!(
            "Template {} produced {} resources",
            template.name(),
            resources.len() - before
        );
    }

    Ok(resources)
}
