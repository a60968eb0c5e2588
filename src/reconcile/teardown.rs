// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::kubernetes::ClusterApi;
use crate::types::{DesiredResourceSet, TeardownFailure, TeardownOutcome};
use tracing::{debug, info, instrument, warn};

/// Delete every resource of the set, dependents first.
///
/// Resources are deleted in reverse set order so that, for instance, a
/// Deployment goes before the ServiceAccount it runs as. Already-absent
/// objects count as removed; other failures are collected and do not stop
/// the remaining deletions.
#[instrument(skip_all, fields(resources = resources.len()))]
pub async fn teardown<C: ClusterApi>(cluster: &C, resources: &DesiredResourceSet) -> TeardownOutcome {
    let mut outcome = TeardownOutcome::default();

    for resource in resources.iter().rev() {
        let id = resource.id();
        match cluster.delete(id).await {
            Ok(()) => {
                debug!("Deleted {}", id);
                outcome.deleted.push(id.clone());
            }
            Err(err) if err.is_not_found() => {
                debug!("{} already absent", id);
                outcome.absent.push(id.clone());
            }
            Err(error) => {
                warn!("Failed to delete {}: {}", id, error);
                outcome.failed.push(TeardownFailure {
                    id: id.clone(),
                    error,
                });
            }
        }
    }

    info!(
        "Deleted {}, {} already absent, {} failed",
        outcome.deleted.len(),
        outcome.absent.len(),
        outcome.failed.len()
    );
    outcome
}
