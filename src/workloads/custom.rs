// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Workloads described in a YAML file, with templates read from disk.
//!
//! ```yaml
//! templates:
//!   - path: activator.yaml.j2
//!   - path: observability.yaml.j2
//!     when: otel-collector
//! requiredConfig: [namespace]
//! defaults:
//!   version: "1.10.2"
//! images:
//!   configKey: custom_images
//!   contextKey: images
//!   defaults:
//!     activator: gcr.io/knative-releases/knative.dev/serving/cmd/activator:v1.10.2
//! consumes: [otel-collector]
//! derive: [otel-collector]
//! preconditions:
//!   - type: leadershipRequired
//!   - type: requiredConfigMap
//!     namespace: "{{ namespace }}"
//!     name: config-istio
//! scrapeEndpoints:
//!   - relation: metrics-endpoint
//!     namespace: "{{ namespace }}"
//!     service: otel-export
//!     port: 8889
//! ```
//!
//! Template paths are relative to the definition file.

use crate::context::{Derivation, ImageOverride, RelationExpectation};
use crate::error::{ReconcilerError, Result};
use crate::reconcile::Precondition;
use crate::relations::metrics::ScrapeEndpoint;
use crate::relations::PublicationSpec;
use crate::render::Template;
use crate::workloads::{TemplateRef, WorkloadSpec};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

pub const NAME: &str = "custom";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateEntry {
    pub path: PathBuf,
    /// Only render while this relation is established
    #[serde(default)]
    pub when: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorkloadDefinition {
    #[serde(default)]
    pub name: Option<String>,
    pub templates: Vec<TemplateEntry>,
    #[serde(default)]
    pub defaults: BTreeMap<String, Value>,
    #[serde(default)]
    pub required_config: Vec<String>,
    #[serde(default)]
    pub images: Option<ImageOverride>,
    #[serde(default)]
    pub consumes: Vec<String>,
    #[serde(default)]
    pub expects: Vec<RelationExpectation>,
    #[serde(default)]
    pub derive: Vec<Derivation>,
    #[serde(default)]
    pub preconditions: Vec<Precondition>,
    #[serde(default)]
    pub publications: Vec<PublicationSpec>,
    #[serde(default)]
    pub scrape_endpoints: Vec<ScrapeEndpoint>,
    #[serde(default)]
    pub requires_local_gateway: bool,
}

impl WorkloadDefinition {
    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).map_err(|e| ReconcilerError::WorkloadDefinition(e.to_string()))
    }

    /// Read every template and assemble the workload.
    pub fn into_workload(self, base_dir: &Path, app_name: &str, model_name: &str) -> Result<WorkloadSpec> {
        if self.templates.is_empty() {
            return Err(ReconcilerError::WorkloadDefinition(
                "at least one template is required".to_string(),
            ));
        }

        let name = self.name.as_deref().unwrap_or(NAME);
        let mut workload = WorkloadSpec::new(name, app_name, model_name);

        for entry in &self.templates {
            let template = Template::from_file(&base_dir.join(&entry.path))?;
            workload.templates.push(TemplateRef {
                template,
                when: entry.when.clone(),
            });
        }

        workload.context.defaults.merge(self.defaults);
        workload.context.required_config = self.required_config;
        workload.context.images = self.images;
        workload.context.consumes = self.consumes;
        workload.context.expects = self.expects;
        workload.context.derive = self.derive;
        workload.preconditions = self.preconditions;
        workload.publications = self.publications;
        workload.scrape_endpoints = self.scrape_endpoints;
        workload.requires_local_gateway = self.requires_local_gateway;

        Ok(workload)
    }
}

pub fn load(path: &Path, app_name: &str, model_name: &str) -> Result<WorkloadSpec> {
    info!("Loading workload definition from {}", path.display());
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ReconcilerError::WorkloadDefinition(format!("{}: {}", path.display(), e))
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    WorkloadDefinition::from_yaml(&raw)?.into_workload(base_dir, app_name, model_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;

    fn manifests_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("manifests")
    }

    const DEFINITION: &str = r#"
name: knative-eventing-legacy
templates:
  - path: knative-eventing/KnativeEventing.yaml.j2
  - path: knative-operator/observability/collector.yaml.j2
    when: otel-collector
requiredConfig: [namespace]
defaults:
  version: "1.8.0"
images:
  configKey: custom_images
  contextKey: custom_images
consumes: [otel-collector]
derive: [otel-collector]
preconditions:
  - type: leadershipRequired
  - type: requiredCRD
    name: knativeeventings.operator.knative.dev
publications:
  - relation: otel-collector
    data:
      otel_collector_svc_namespace: "{{ namespace }}"
scrapeEndpoints:
  - relation: metrics-endpoint
    namespace: "{{ namespace }}"
    service: otel-export
    port: 8889
requiresLocalGateway: true
"#;

    #[test]
    fn test_definition_into_workload() {
        let workload = WorkloadDefinition::from_yaml(DEFINITION)
            .unwrap()
            .into_workload(&manifests_dir(), "eventing", "kubeflow")
            .unwrap();

        assert_eq!(workload.name, "knative-eventing-legacy");
        assert_eq!(workload.templates.len(), 2);
        assert_eq!(workload.templates[0].template.name(), "KnativeEventing.yaml.j2");
        assert_eq!(workload.templates[1].when.as_deref(), Some("otel-collector"));
        assert_eq!(workload.context.defaults.get_str("version"), Some("1.8.0"));
        assert_eq!(workload.context.defaults.get_str("app_name"), Some("eventing"));
        assert_eq!(workload.context.required_config, vec!["namespace"]);
        assert_eq!(workload.context.derive, vec![Derivation::OtelCollector]);
        assert_eq!(workload.preconditions.len(), 2);
        assert_eq!(workload.publications[0].relation, "otel-collector");
        assert_eq!(workload.scrape_endpoints[0].service, "otel-export");
        assert_eq!(workload.scrape_endpoints[0].port, 8889);
        assert!(workload.requires_local_gateway);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = WorkloadDefinition::from_yaml("templates: []\nfoo: bar\n").unwrap_err();
        assert!(matches!(err, ReconcilerError::WorkloadDefinition(_)));
    }

    #[test]
    fn test_empty_template_list_is_rejected() {
        let err = WorkloadDefinition::from_yaml("templates: []\n")
            .unwrap()
            .into_workload(&manifests_dir(), "app", "model")
            .unwrap_err();
        assert!(matches!(err, ReconcilerError::WorkloadDefinition(_)));
    }

    #[test]
    fn test_missing_template_file() {
        let err = WorkloadDefinition::from_yaml("templates:\n  - path: missing.yaml.j2\n")
            .unwrap()
            .into_workload(&manifests_dir(), "app", "model")
            .unwrap_err();
        assert!(matches!(
            err,
            ReconcilerError::Render(RenderError::TemplateSource { .. })
        ));
    }

    #[test]
    fn test_load_missing_definition() {
        let err = load(Path::new("/nonexistent/workload.yaml"), "app", "model").unwrap_err();
        assert!(matches!(err, ReconcilerError::WorkloadDefinition(_)));
    }
}
