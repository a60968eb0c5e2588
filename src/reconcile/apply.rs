// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Sequential server-side apply of a desired resource set.

use crate::error::ClusterError;
use crate::kubernetes::ClusterApi;
use crate::types::{
    DesiredResourceSet, Disposition, Failure, ReconcileOutcome, ResourceDescriptor, ResourceId,
    ResourceOutcome, Severity,
};
use kube::api::DynamicObject;
use tracing::{debug, info, instrument, warn};

/// Apply every resource in set order and record what happened to each.
///
/// A 403 on a prerequisite (RBAC, CRDs, anything cluster-scoped) stops the
/// batch; the remaining resources are reported as skipped. Other failures
/// are recorded and the batch carries on.
#[instrument(skip_all, fields(resources = resources.len()))]
pub async fn apply<C: ClusterApi>(cluster: &C, resources: &DesiredResourceSet) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();
    let mut blocked_by: Option<ResourceId> = None;

    for resource in resources {
        let id = resource.id();
        let disposition = match &blocked_by {
            Some(blocker) => Disposition::Failed(Failure::skipped(blocker)),
            None => match apply_one(cluster, resource).await {
                Ok(disposition) => {
                    debug!("{} {:?}", id, disposition);
                    disposition
                }
                Err(err) => {
                    let failure = Failure::from(err);
                    if failure.severity == Severity::Forbidden && resource.is_prerequisite() {
                        warn!("Forbidden to apply {}, skipping the remaining resources", id);
                        blocked_by = Some(id.clone());
                    } else {
                        warn!("Failed to apply {}: {}", id, failure.reason);
                    }
                    Disposition::Failed(failure)
                }
            },
        };

        outcome.resources.push(ResourceOutcome {
            id: id.clone(),
            disposition,
        });
    }

    info!(
        "Applied {} resources, {} failed",
        outcome.resources.len(),
        outcome.failures().count()
    );
    outcome
}

async fn apply_one<C: ClusterApi>(
    cluster: &C,
    resource: &ResourceDescriptor,
) -> Result<Disposition, ClusterError> {
    let before = cluster
        .get(resource.id())
        .await?
        .and_then(|live| live.metadata.resource_version);

    match cluster.apply(resource).await {
        Ok(applied) => Ok(compare_versions(before.as_deref(), &applied)),
        Err(ClusterError::Conflict { message }) => {
            debug!("Conflict applying {}: {}", resource.id(), message);
            Ok(Disposition::Unchanged)
        }
        Err(ClusterError::UnsupportedMediaType { .. }) => {
            info!("Server-side apply unavailable, creating {}", resource.id());
            create_or_patch(cluster, resource, before.as_deref()).await
        }
        Err(err) => Err(err),
    }
}

async fn create_or_patch<C: ClusterApi>(
    cluster: &C,
    resource: &ResourceDescriptor,
    before: Option<&str>,
) -> Result<Disposition, ClusterError> {
    match cluster.create(resource).await {
        Ok(_) => Ok(Disposition::Applied),
        Err(ClusterError::Conflict { .. }) => match cluster.patch(resource).await {
            Ok(patched) => Ok(compare_versions(before, &patched)),
            Err(ClusterError::Conflict { .. }) => Ok(Disposition::Unchanged),
            Err(err) => Err(err),
        },
        Err(err) => Err(err),
    }
}

fn compare_versions(before: Option<&str>, after: &DynamicObject) -> Disposition {
    match (before, after.metadata.resource_version.as_deref()) {
        (Some(before), Some(after)) if before == after => Disposition::Unchanged,
        _ => Disposition::Applied,
    }
}
