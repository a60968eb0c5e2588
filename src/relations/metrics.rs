// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Prometheus scrape jobs pointing at a live Service.

use crate::constants::relations;
use crate::context::RenderContext;
use crate::error::Result;
use crate::kubernetes::ClusterApi;
use crate::relations::Publication;
use crate::render::Template;
use crate::types::ResourceId;
use k8s_openapi::api::core::v1::Service;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Service the collector exports Prometheus metrics on
pub const EXPORT_SERVICE_NAME: &str = "otel-export";
pub const EXPORT_PORT: u16 = 8889;

/// A Service whose cluster IP is published as a scrape target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScrapeEndpoint {
    pub relation: String,
    /// May use context placeholders
    pub namespace: String,
    pub service: String,
    pub port: u16,
}

/// Scrape job for the collector's export Service.
pub fn collector_scrape_endpoint() -> ScrapeEndpoint {
    ScrapeEndpoint {
        relation: relations::METRICS_ENDPOINT.to_string(),
        namespace: "{{ namespace }}".to_string(),
        service: EXPORT_SERVICE_NAME.to_string(),
        port: EXPORT_PORT,
    }
}

/// Look up the Service and build its scrape job.
///
/// `None` while the Service does not exist or has no cluster IP yet.
#[instrument(skip_all, fields(relation = %endpoint.relation, service = %endpoint.service))]
pub async fn resolve_scrape_publication<C: ClusterApi>(
    cluster: &C,
    endpoint: &ScrapeEndpoint,
    context: &RenderContext,
) -> Result<Option<Publication>> {
    let name = format!("{}:namespace", endpoint.relation);
    let namespace = Template::new(&name, endpoint.namespace.clone()).render(context)?;
    let id = ResourceId::of::<Service>(Some(&namespace), &endpoint.service);

    let Some(service) = cluster.get(&id).await? else {
        info!("{} not found, the collector may not be deployed yet", id);
        return Ok(None);
    };

    let cluster_ip = service
        .data
        .get("spec")
        .and_then(|spec| spec.get("clusterIP"))
        .and_then(Value::as_str)
        .filter(|ip| !ip.is_empty() && *ip != "None");
    let Some(cluster_ip) = cluster_ip else {
        debug!("{} has no cluster IP yet", id);
        return Ok(None);
    };

    let jobs = json!([{
        "static_configs": [{"targets": [format!("{}:{}", cluster_ip, endpoint.port)]}]
    }]);

    Ok(Some(Publication {
        relation: endpoint.relation.clone(),
        data: BTreeMap::from([(relations::SCRAPE_JOBS.to_string(), jobs.to_string())]),
    }))
}
