// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Checks that must pass before a workload's resources are written.

use crate::constants::precondition::{CRD_RETRY_SECS, POLL_DEADLINE_SECS, POLL_INTERVAL_SECS};
use crate::context::RenderContext;
use crate::kubernetes::ClusterApi;
use crate::render::Template;
use crate::types::ResourceId;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// A condition the cluster or the unit must meet before reconciling.
///
/// Names and namespaces may use context placeholders (`{{ namespace }}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Precondition {
    /// Only the elected leader unit writes to the cluster
    LeadershipRequired,
    /// A CustomResourceDefinition, by its full name, is registered
    #[serde(rename = "requiredCRD")]
    RequiredCrd { name: String },
    RequiredConfigMap { namespace: String, name: String },
    RequiredSecret { namespace: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotReady {
    /// This unit is not the leader; nothing to report
    NotLeader,
    /// Expected to clear on its own; re-trigger after `retry_after`
    Pending {
        reason: String,
        retry_after: Duration,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateResult {
    Ready,
    NotReady(NotReady),
    Fatal(String),
}

/// Fixed-interval polling with a hard deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub deadline: Duration,
}

impl RetryPolicy {
    pub fn new(interval: Duration, deadline: Duration) -> Self {
        Self { interval, deadline }
    }

    /// Number of checks made before giving up; always at least one.
    pub fn attempts(&self) -> u32 {
        let interval = self.interval.as_nanos();
        if interval == 0 {
            return 1;
        }
        let attempts = self.deadline.as_nanos() / interval;
        u32::try_from(attempts).unwrap_or(u32::MAX).max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(POLL_INTERVAL_SECS),
            Duration::from_secs(POLL_DEADLINE_SECS),
        )
    }
}

pub struct PreconditionGate<'a, C> {
    cluster: &'a C,
    retry: RetryPolicy,
    is_leader: bool,
}

impl<'a, C: ClusterApi> PreconditionGate<'a, C> {
    pub fn new(cluster: &'a C, retry: RetryPolicy, is_leader: bool) -> Self {
        Self {
            cluster,
            retry,
            is_leader,
        }
    }

    /// Leadership only, without touching the cluster.
    pub fn check_leadership(&self, preconditions: &[Precondition]) -> GateResult {
        if !self.is_leader && preconditions.contains(&Precondition::LeadershipRequired) {
            return GateResult::NotReady(NotReady::NotLeader);
        }
        GateResult::Ready
    }

    /// Evaluate `preconditions` in order, leadership first, stopping at the
    /// first one that is not met.
    #[instrument(skip_all, fields(preconditions = preconditions.len()))]
    pub async fn check(&self, preconditions: &[Precondition], context: &RenderContext) -> GateResult {
        let leadership = self.check_leadership(preconditions);
        if leadership != GateResult::Ready {
            return leadership;
        }

        for precondition in preconditions {
            let result = match precondition {
                Precondition::LeadershipRequired => GateResult::Ready,
                Precondition::RequiredCrd { name } => match render_field(name, context) {
                    Ok(name) => self.check_crd(&name).await,
                    Err(reason) => GateResult::Fatal(reason),
                },
                Precondition::RequiredConfigMap { namespace, name } => {
                    match resolve::<ConfigMap>(namespace, name, context) {
                        Ok(id) => self.wait_for(&id).await,
                        Err(reason) => GateResult::Fatal(reason),
                    }
                }
                Precondition::RequiredSecret { namespace, name } => {
                    match resolve::<Secret>(namespace, name, context) {
                        Ok(id) => self.wait_for(&id).await,
                        Err(reason) => GateResult::Fatal(reason),
                    }
                }
            };

            if result != GateResult::Ready {
                return result;
            }
        }

        GateResult::Ready
    }

    async fn check_crd(&self, name: &str) -> GateResult {
        let id = ResourceId::of::<CustomResourceDefinition>(None, name);

        match self.cluster.get(&id).await {
            Ok(Some(_)) => {
                debug!("CRD {} is registered", name);
                GateResult::Ready
            }
            Ok(None) => {
                info!("CRD {} not yet registered", name);
                GateResult::NotReady(NotReady::Pending {
                    reason: format!("Waiting for CRD {} to be registered", name),
                    retry_after: Duration::from_secs(CRD_RETRY_SECS),
                })
            }
            Err(e) => GateResult::Fatal(format!("Failed to look up CRD {}: {}", name, e)),
        }
    }

    /// Poll for an object until it exists or the deadline passes.
    async fn wait_for(&self, id: &ResourceId) -> GateResult {
        let attempts = self.retry.attempts();

        for attempt in 1..=attempts {
            match self.cluster.get(id).await {
                Ok(Some(_)) => return GateResult::Ready,
                Ok(None) => info!("{} not found, attempt {}/{}", id, attempt, attempts),
                Err(e) => return GateResult::Fatal(format!("Failed to look up {}: {}", id, e)),
            }

            if attempt < attempts {
                sleep(self.retry.interval).await;
            }
        }

        warn!("Gave up waiting for {}", id);
        GateResult::Fatal(format!(
            "{} not found after {} seconds",
            id,
            self.retry.deadline.as_secs()
        ))
    }
}

fn render_field(value: &str, context: &RenderContext) -> Result<String, String> {
    Template::new("precondition", value)
        .render(context)
        .map_err(|e| e.to_string())
}

fn resolve<K: k8s_openapi::Resource>(
    namespace: &str,
    name: &str,
    context: &RenderContext,
) -> Result<ResourceId, String> {
    let namespace = render_field(namespace, context)?;
    let name = render_field(name, context)?;
    Ok(ResourceId::of::<K>(Some(&namespace), &name))
}
