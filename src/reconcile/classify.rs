// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Maps reconcile results onto the status a unit displays.

use crate::constants::status::TRUST_REQUIRED;
use crate::error::{ConfigurationError, RelationError};
use crate::reconcile::gate::{GateResult, NotReady};
use crate::types::{ReconcileOutcome, Severity, UnitStatus};

/// Status for a finished apply pass.
pub fn classify(outcome: &ReconcileOutcome) -> UnitStatus {
    let Some((id, failure)) = outcome.worst_failure() else {
        return UnitStatus::active();
    };

    match (failure.severity, failure.code) {
        (Severity::Forbidden, _) => {
            UnitStatus::blocked(format!("{} (forbidden to apply {})", TRUST_REQUIRED, id))
        }
        (_, Some(code)) => UnitStatus::blocked(format!("ApiError: {} on {}", code, id)),
        (_, None) => UnitStatus::blocked(format!("Failed to apply {}: {}", id, failure.reason)),
    }
}

/// Status for a gate that did not pass; `None` means leave the status alone.
pub fn gate_status(result: &GateResult) -> Option<UnitStatus> {
    match result {
        GateResult::Ready | GateResult::NotReady(NotReady::NotLeader) => None,
        GateResult::NotReady(NotReady::Pending { reason, .. }) => {
            Some(UnitStatus::waiting(reason.clone()))
        }
        GateResult::Fatal(reason) => Some(UnitStatus::blocked(reason.clone())),
    }
}

/// Status for configuration that cannot be rendered.
///
/// Relation data a peer has not published yet is Waiting; everything else
/// needs the operator.
pub fn configuration_status(err: &ConfigurationError) -> UnitStatus {
    match err {
        ConfigurationError::Relation(RelationError::DataMissing { .. }) => {
            UnitStatus::waiting(err.to_string())
        }
        _ => UnitStatus::blocked(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClusterError;
    use crate::types::{Disposition, Failure, ResourceId, ResourceOutcome};
    use std::time::Duration;

    fn make_outcome(dispositions: Vec<Disposition>) -> ReconcileOutcome {
        ReconcileOutcome {
            resources: dispositions
                .into_iter()
                .enumerate()
                .map(|(i, disposition)| ResourceOutcome {
                    id: ResourceId::new("v1", "ConfigMap", Some("ns1"), &format!("cm-{}", i)),
                    disposition,
                })
                .collect(),
        }
    }

    fn failed(code: u16) -> Disposition {
        Disposition::Failed(Failure::from(ClusterError::from_status(
            code,
            "Reason".to_string(),
            "message".to_string(),
        )))
    }

    #[test]
    fn test_converged_is_active() {
        let outcome = make_outcome(vec![Disposition::Applied, Disposition::Unchanged]);
        assert_eq!(classify(&outcome), UnitStatus::active());
    }

    #[test]
    fn test_forbidden_wins_regardless_of_successes() {
        let outcome = make_outcome(vec![
            Disposition::Applied,
            failed(500),
            Disposition::Applied,
            failed(403),
        ]);

        let status = classify(&outcome);

        assert!(matches!(status, UnitStatus::Blocked(_)));
        assert!(status.message().starts_with(TRUST_REQUIRED));
        assert!(status.message().contains("cm-3"));
    }

    #[test]
    fn test_api_error_echoes_code_of_first_worst_failure() {
        let outcome = make_outcome(vec![Disposition::Applied, failed(422), failed(500)]);

        assert_eq!(
            classify(&outcome),
            UnitStatus::blocked("ApiError: 422 on ConfigMap/ns1/cm-1")
        );
    }

    #[test]
    fn test_transport_failure_without_code() {
        let outcome = make_outcome(vec![Disposition::Failed(Failure::from(
            ClusterError::Transport {
                message: "connection refused".to_string(),
            },
        ))]);

        assert_eq!(
            classify(&outcome),
            UnitStatus::blocked(
                "Failed to apply ConfigMap/ns1/cm-0: transport error: connection refused"
            )
        );
    }

    #[test]
    fn test_gate_status() {
        assert_eq!(gate_status(&GateResult::Ready), None);
        assert_eq!(gate_status(&GateResult::NotReady(NotReady::NotLeader)), None);
        assert_eq!(
            gate_status(&GateResult::NotReady(NotReady::Pending {
                reason: "Waiting for CRD".to_string(),
                retry_after: Duration::from_secs(10),
            })),
            Some(UnitStatus::waiting("Waiting for CRD"))
        );
        assert_eq!(
            gate_status(&GateResult::Fatal("timed out".to_string())),
            Some(UnitStatus::blocked("timed out"))
        );
    }

    #[test]
    fn test_configuration_status() {
        assert_eq!(
            configuration_status(&ConfigurationError::MissingConfig("namespace".to_string())),
            UnitStatus::blocked("Config item `namespace` must be set")
        );

        let missing = ConfigurationError::from(RelationError::DataMissing {
            relation: "knative-serving-networking".to_string(),
            missing: vec!["localgateway_name".to_string()],
        });
        assert!(matches!(configuration_status(&missing), UnitStatus::Waiting(_)));

        let absent = ConfigurationError::from(RelationError::Missing(
            "knative-serving-networking".to_string(),
        ));
        assert!(matches!(configuration_status(&absent), UnitStatus::Blocked(_)));
    }
}
