// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The Knative Operator itself, plus the OpenTelemetry collector it hosts for
//! the serving and eventing workloads.

use crate::constants::{config_keys, relations};
use crate::context::{ImageMap, ImageOverride};
use crate::reconcile::Precondition;
use crate::relations::metrics::collector_scrape_endpoint;
use crate::relations::otel::collector_publication;
use crate::render::Template;
use crate::workloads::{TemplateRef, WorkloadSpec};

pub const NAME: &str = "knative-operator";

pub const DEFAULT_VERSION: &str = "1.10.2";

/// Knative access log format, a Go template evaluated by the Knative queue proxy.
pub const REQUEST_LOG_TEMPLATE: &str = r#"{"httpRequest": {"requestMethod": "{{.Request.Method}}", "requestUrl": "{{js .Request.RequestURI}}", "requestSize": "{{.Request.ContentLength}}", "status": {{.Response.Code}}, "responseSize": "{{.Response.Size}}", "userAgent": "{{js .Request.UserAgent}}", "remoteIp": "{{js .Request.RemoteAddr}}", "serverIp": "{{.Revision.PodIP}}", "referer": "{{js .Request.Referer}}", "latency": "{{.Response.Latency}}s", "protocol": "{{.Request.Proto}}"}, "traceId": "{{index .Request.Header "X-B3-Traceid"}}"}"#;

const OPERATOR_TEMPLATE: &str = include_str!("../../manifests/knative-operator/operator.yaml.j2");
const COLLECTOR_TEMPLATE: &str =
    include_str!("../../manifests/knative-operator/observability/collector.yaml.j2");

fn default_images() -> ImageMap {
    [
        (
            "knative-operator",
            "gcr.io/knative-releases/knative.dev/operator/cmd/operator:v1.10.2",
        ),
        (
            "operator-webhook",
            "gcr.io/knative-releases/knative.dev/operator/cmd/webhook:v1.10.2",
        ),
        (
            "otel-collector",
            "otel/opentelemetry-collector:0.80.0",
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn workload(app_name: &str, model_name: &str) -> WorkloadSpec {
    let mut workload = WorkloadSpec::new(NAME, app_name, model_name);

    workload.templates = vec![
        TemplateRef::always(Template::new("operator.yaml.j2", OPERATOR_TEMPLATE)),
        TemplateRef::with_relation(
            Template::new("observability/collector.yaml.j2", COLLECTOR_TEMPLATE),
            relations::OTEL_COLLECTOR,
        ),
    ];
    workload.preconditions = vec![Precondition::LeadershipRequired];

    let defaults = &mut workload.context.defaults;
    defaults.insert(config_keys::NAMESPACE, model_name);
    defaults.insert(config_keys::VERSION, DEFAULT_VERSION);
    defaults.insert("request_log_template", REQUEST_LOG_TEMPLATE);
    workload.context.images = Some(ImageOverride {
        config_key: config_keys::CUSTOM_IMAGES.to_string(),
        context_key: "images".to_string(),
        defaults: default_images(),
    });
    workload.publications = vec![collector_publication()];
    workload.scrape_endpoints = vec![collector_scrape_endpoint()];

    workload
}
