// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{config_keys, relations};
use crate::context::{Derivation, ImageMap, ImageOverride};
use crate::reconcile::Precondition;
use crate::render::Template;
use crate::workloads::{TemplateRef, WorkloadSpec};

pub const NAME: &str = "knative-eventing";

pub const DEFAULT_VERSION: &str = "1.10.2";

const KNATIVE_EVENTING_TEMPLATE: &str =
    include_str!("../../manifests/knative-eventing/KnativeEventing.yaml.j2");

/// A KnativeEventing instance managed through the Knative Operator.
pub fn workload(app_name: &str, model_name: &str) -> WorkloadSpec {
    let mut workload = WorkloadSpec::new(NAME, app_name, model_name);

    workload.templates = vec![TemplateRef::always(Template::new(
        "KnativeEventing.yaml.j2",
        KNATIVE_EVENTING_TEMPLATE,
    ))];
    workload.preconditions = vec![
        Precondition::LeadershipRequired,
        Precondition::RequiredCrd {
            name: "knativeeventings.operator.knative.dev".to_string(),
        },
    ];

    let context = &mut workload.context;
    context.defaults.insert(config_keys::VERSION, DEFAULT_VERSION);
    context.required_config = vec![config_keys::NAMESPACE.to_string()];
    context.images = Some(ImageOverride {
        config_key: config_keys::CUSTOM_IMAGES.to_string(),
        context_key: config_keys::CUSTOM_IMAGES.to_string(),
        defaults: ImageMap::new(),
    });
    context.consumes = vec![relations::OTEL_COLLECTOR.to_string()];
    context.derive = vec![Derivation::OtelCollector];

    workload
}
