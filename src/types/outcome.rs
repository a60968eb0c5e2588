// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Results of one apply or teardown pass over a desired resource set.

use crate::error::ClusterError;
use crate::types::resource::ResourceId;
use serde::Serialize;

/// Why a single resource failed to converge, ordered by how actionable it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    /// Not attempted because an earlier prerequisite failed
    Skipped,
    Transport,
    Serialization,
    Api,
    /// 403: the application lacks the permissions to manage the resource
    Forbidden,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    pub severity: Severity,
    pub code: Option<u16>,
    pub reason: String,
}

impl Failure {
    pub fn skipped(blocked_by: &ResourceId) -> Self {
        Self {
            severity: Severity::Skipped,
            code: None,
            reason: format!("not attempted, {} could not be applied", blocked_by),
        }
    }
}

impl From<ClusterError> for Failure {
    fn from(err: ClusterError) -> Self {
        let severity = match &err {
            ClusterError::Forbidden { .. } => Severity::Forbidden,
            ClusterError::Transport { .. } => Severity::Transport,
            ClusterError::Serialization { .. } => Severity::Serialization,
            _ => Severity::Api,
        };
        Self {
            severity,
            code: err.code(),
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "disposition", rename_all = "camelCase")]
pub enum Disposition {
    /// The object was created or changed
    Applied,
    /// The object already matched the desired state
    Unchanged,
    Failed(Failure),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceOutcome {
    pub id: ResourceId,
    #[serde(flatten)]
    pub disposition: Disposition,
}

/// Aggregate view of a [`ReconcileOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Classification {
    Converged,
    Failed,
    PermissionDenied,
}

/// Per-resource dispositions for every resource of one apply pass, in set order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub resources: Vec<ResourceOutcome>,
}

impl ReconcileOutcome {
    pub fn failures(&self) -> impl Iterator<Item = (&ResourceId, &Failure)> {
        self.resources.iter().filter_map(|r| match &r.disposition {
            Disposition::Failed(failure) => Some((&r.id, failure)),
            _ => None,
        })
    }

    /// The single most actionable failure; ties go to the earliest resource.
    pub fn worst_failure(&self) -> Option<(&ResourceId, &Failure)> {
        self.failures().fold(None, |worst, candidate| match worst {
            Some((_, current)) if current.severity >= candidate.1.severity => worst,
            _ => Some(candidate),
        })
    }

    pub fn classification(&self) -> Classification {
        match self.worst_failure() {
            None => Classification::Converged,
            Some((_, failure)) if failure.severity == Severity::Forbidden => {
                Classification::PermissionDenied
            }
            Some(_) => Classification::Failed,
        }
    }

    pub fn is_converged(&self) -> bool {
        self.classification() == Classification::Converged
    }

    pub fn all_unchanged(&self) -> bool {
        self.resources
            .iter()
            .all(|r| r.disposition == Disposition::Unchanged)
    }
}

/// Whether a teardown removed what it was asked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TeardownState {
    Removed,
    PartiallyRemoved,
    NothingToRemove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeardownFailure {
    pub id: ResourceId,
    pub error: ClusterError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeardownOutcome {
    /// Deleted by this pass
    pub deleted: Vec<ResourceId>,
    /// Already gone before this pass
    pub absent: Vec<ResourceId>,
    pub failed: Vec<TeardownFailure>,
}

impl TeardownOutcome {
    pub fn state(&self) -> TeardownState {
        if !self.failed.is_empty() {
            TeardownState::PartiallyRemoved
        } else if self.deleted.is_empty() && self.absent.is_empty() {
            TeardownState::NothingToRemove
        } else {
            TeardownState::Removed
        }
    }

    pub fn first_error(&self) -> Option<&TeardownFailure> {
        self.failed.first()
    }
}
