// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! A KnativeServing instance managed through the Knative Operator.

use crate::constants::{config_keys, relations};
use crate::context::{Derivation, ImageMap, ImageOverride};
use crate::reconcile::Precondition;
use crate::relations::localgateway::provider_publication;
use crate::render::Template;
use crate::workloads::{TemplateRef, WorkloadSpec};

pub const NAME: &str = "knative-serving";

pub const DEFAULT_VERSION: &str = "1.10.2";
pub const LOCAL_GATEWAY_NAME: &str = "knative-local-gateway";

const KNATIVE_SERVING_TEMPLATE: &str =
    include_str!("../../manifests/knative-serving/KnativeServing.yaml.j2");

pub fn workload(app_name: &str, model_name: &str) -> WorkloadSpec {
    let mut workload = WorkloadSpec::new(NAME, app_name, model_name);

    workload.templates = vec![TemplateRef::always(Template::new(
        "KnativeServing.yaml.j2",
        KNATIVE_SERVING_TEMPLATE,
    ))];
    workload.preconditions = vec![
        Precondition::LeadershipRequired,
        Precondition::RequiredCrd {
            name: "knativeservings.operator.knative.dev".to_string(),
        },
    ];

    let context = &mut workload.context;
    context.defaults.insert(config_keys::VERSION, DEFAULT_VERSION);
    context.defaults.insert("domain.name", "10.64.140.43.nip.io");
    context.defaults.insert("istio.gateway.name", "knative-gateway");
    context.defaults.insert("istio.gateway.namespace", model_name);
    context.required_config = vec![config_keys::NAMESPACE.to_string()];
    context.images = Some(ImageOverride {
        config_key: config_keys::CUSTOM_IMAGES.to_string(),
        context_key: config_keys::CUSTOM_IMAGES.to_string(),
        defaults: ImageMap::new(),
    });
    context.consumes = vec![relations::OTEL_COLLECTOR.to_string()];
    context.derive = vec![Derivation::OtelCollector];

    workload.publications = vec![provider_publication(LOCAL_GATEWAY_NAME, "{{ namespace }}")];

    workload
}
