// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! OpenTelemetry collector relation.

use crate::constants::{context_keys, relations};
use crate::context::RenderContext;
use crate::relations::PublicationSpec;

/// Service name of the collector deployed by the operator workload
pub const COLLECTOR_SERVICE_NAME: &str = "otel-collector";
/// OpenCensus receiver port of the collector
pub const COLLECTOR_PORT: &str = "55678";

/// Fill in `otel_collector_address` and `metrics_backend`.
///
/// Without complete collector data the address is empty and metrics fall
/// back to the Prometheus backend.
pub fn derive_collector_context(context: &mut RenderContext) {
    let name = context.get_str(relations::OTEL_COLLECTOR_SVC_NAME);
    let namespace = context.get_str(relations::OTEL_COLLECTOR_SVC_NAMESPACE);
    let port = context.get_str(relations::OTEL_COLLECTOR_PORT);

    let (address, backend) = match (name, namespace, port) {
        (Some(name), Some(namespace), Some(port))
            if !name.is_empty() && !namespace.is_empty() && !port.is_empty() =>
        {
            (
                format!("{}.{}.svc.cluster.local:{}", name, namespace, port),
                "opencensus",
            )
        }
        _ => (String::new(), "prometheus"),
    };

    context.insert(context_keys::OTEL_COLLECTOR_ADDRESS, address);
    context.insert(context_keys::METRICS_BACKEND, backend);
}

/// Collector coordinates the operator workload publishes to its consumers.
pub fn collector_publication() -> PublicationSpec {
    PublicationSpec::new(
        relations::OTEL_COLLECTOR,
        &[
            (relations::OTEL_COLLECTOR_SVC_NAMESPACE, "{{ namespace }}"),
            (relations::OTEL_COLLECTOR_SVC_NAME, COLLECTOR_SERVICE_NAME),
            (relations::OTEL_COLLECTOR_PORT, COLLECTOR_PORT),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_collector_data_falls_back_to_prometheus() {
        let mut ctx = RenderContext::new()
            .with(relations::OTEL_COLLECTOR_SVC_NAME, "otel-collector")
            .with(relations::OTEL_COLLECTOR_PORT, "55678");

        derive_collector_context(&mut ctx);

        assert_eq!(ctx.get_str(context_keys::METRICS_BACKEND), Some("prometheus"));
        assert_eq!(ctx.get_str(context_keys::OTEL_COLLECTOR_ADDRESS), Some(""));
    }

    #[test]
    fn test_collector_publication_keys() {
        let spec = collector_publication();
        assert_eq!(spec.relation, "otel-collector");
        assert_eq!(spec.data["otel_collector_port"], "55678");
        assert_eq!(spec.data["otel_collector_svc_name"], "otel-collector");
    }
}
