// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Workload definitions: which templates a workload renders, from what context,
//! and what must hold before they are applied.

pub mod custom;
pub mod eventing;
pub mod operator;
pub mod serving;

use crate::constants::context_keys;
use crate::context::ContextSpec;
use crate::error::{ReconcilerError, Result};
use crate::kubernetes::field_manager;
use crate::reconcile::Precondition;
use crate::relations::metrics::ScrapeEndpoint;
use crate::relations::PublicationSpec;
use crate::render::Template;
use crate::types::Trigger;
use std::path::Path;

/// A template, optionally rendered only while a relation is established.
#[derive(Debug, Clone)]
pub struct TemplateRef {
    pub template: Template,
    pub when: Option<String>,
}

impl TemplateRef {
    pub fn always(template: Template) -> Self {
        Self {
            template,
            when: None,
        }
    }

    pub fn with_relation(template: Template, relation: &str) -> Self {
        Self {
            template,
            when: Some(relation.to_string()),
        }
    }
}

/// Everything the reconciler needs to converge one workload.
#[derive(Debug, Clone)]
pub struct WorkloadSpec {
    pub name: String,
    pub app_name: String,
    pub model_name: String,
    pub templates: Vec<TemplateRef>,
    pub preconditions: Vec<Precondition>,
    pub context: ContextSpec,
    pub publications: Vec<PublicationSpec>,
    /// Services published as Prometheus scrape targets once they exist
    pub scrape_endpoints: Vec<ScrapeEndpoint>,
    /// Read `localgateway_name`/`localgateway_namespace` from a provider
    pub requires_local_gateway: bool,
}

impl WorkloadSpec {
    /// An empty workload whose context already knows the application and model.
    pub fn new(name: &str, app_name: &str, model_name: &str) -> Self {
        let mut context = ContextSpec::default();
        context.defaults.insert(context_keys::APP_NAME, app_name);
        context.defaults.insert(context_keys::MODEL_NAME, model_name);

        Self {
            name: name.to_string(),
            app_name: app_name.to_string(),
            model_name: model_name.to_string(),
            templates: Vec::new(),
            preconditions: Vec::new(),
            context,
            publications: Vec::new(),
            scrape_endpoints: Vec::new(),
            requires_local_gateway: false,
        }
    }

    pub fn field_manager(&self) -> String {
        field_manager(&self.model_name, &self.app_name)
    }

    /// Templates to apply for `trigger`, in declaration order.
    pub fn active_templates<'a>(&'a self, trigger: &'a Trigger) -> impl Iterator<Item = &'a Template> {
        self.templates
            .iter()
            .filter(move |t| t.when.as_deref().map_or(true, |r| trigger.has_relation(r)))
            .map(|t| &t.template)
    }

    /// Every template, conditional ones included; teardown removes them all.
    pub fn all_templates(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter().map(|t| &t.template)
    }
}

/// Resolve a workload by name; `custom` reads its definition from `definition`.
pub fn load(
    workload: &str,
    app_name: &str,
    model_name: &str,
    definition: Option<&Path>,
) -> Result<WorkloadSpec> {
    match workload {
        operator::NAME => Ok(operator::workload(app_name, model_name)),
        serving::NAME => Ok(serving::workload(app_name, model_name)),
        eventing::NAME => Ok(eventing::workload(app_name, model_name)),
        custom::NAME => {
            let path = definition.ok_or_else(|| {
                ReconcilerError::WorkloadDefinition(
                    "a custom workload needs a definition file".to_string(),
                )
            })?;
            custom::load(path, app_name, model_name)
        }
        other => Err(ReconcilerError::UnknownWorkload(other.to_string())),
    }
}
