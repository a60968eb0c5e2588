// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// The operator name, used as a fallback field manager for server-side apply
pub const OPERATOR_NAME: &str = "knative-reconciler";

/// Well-known configuration keys
pub mod config_keys {
    /// Namespace the Knative workload is deployed into
    pub const NAMESPACE: &str = "namespace";
    /// Knative version requested from the Knative Operator
    pub const VERSION: &str = "version";
    /// YAML mapping of image overrides
    pub const CUSTOM_IMAGES: &str = "custom_images";
}

/// Keys always present in the render context
pub mod context_keys {
    pub const APP_NAME: &str = "app_name";
    pub const MODEL_NAME: &str = "model_name";
    pub const OTEL_COLLECTOR_ADDRESS: &str = "otel_collector_address";
    pub const METRICS_BACKEND: &str = "metrics_backend";
}

/// Relation names and the keys exchanged over them
pub mod relations {
    pub const OTEL_COLLECTOR: &str = "otel-collector";
    pub const OTEL_COLLECTOR_SVC_NAME: &str = "otel_collector_svc_name";
    pub const OTEL_COLLECTOR_SVC_NAMESPACE: &str = "otel_collector_svc_namespace";
    pub const OTEL_COLLECTOR_PORT: &str = "otel_collector_port";

    pub const LOCALGATEWAY_INFO: &str = "knative-serving-networking";
    pub const LOCALGATEWAY_NAME: &str = "localgateway_name";
    pub const LOCALGATEWAY_NAMESPACE: &str = "localgateway_namespace";

    pub const METRICS_ENDPOINT: &str = "metrics-endpoint";
    /// JSON list of Prometheus scrape jobs
    pub const SCRAPE_JOBS: &str = "scrape_jobs";
}

/// Unit status messages
pub mod status {
    pub const APPLYING: &str = "Configuring/deploying resources";
    pub const REMOVING: &str = "Removing k8s resources";
    pub const REMOVED: &str = "K8s resources removed";
    /// Remediation shown when the API server rejects a write with 403
    pub const TRUST_REQUIRED: &str =
        "This application needs elevated trust, run `juju trust <app> --scope=cluster`";
}

/// Precondition polling configuration
pub mod precondition {
    /// Interval between polls for a required ConfigMap or Secret
    pub const POLL_INTERVAL_SECS: u64 = 3;
    /// Overall deadline for a required ConfigMap or Secret to appear
    pub const POLL_DEADLINE_SECS: u64 = 15;
    /// Re-trigger hint when a required CRD is not registered yet
    pub const CRD_RETRY_SECS: u64 = 10;
}
