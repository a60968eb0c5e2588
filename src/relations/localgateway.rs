// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Local gateway information shared by knative-serving with its requirers.

use crate::constants::relations;
use crate::context::RenderContext;
use crate::error::RelationError;
use crate::relations::PublicationSpec;
use crate::types::RelationSnapshot;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalGatewayInfo {
    pub name: String,
    pub namespace: String,
}

impl LocalGatewayInfo {
    /// Read the gateway a provider published.
    ///
    /// Non-leader units take no action and get `Ok(None)`. Only the first
    /// remote application is read: the relation is limited to one provider.
    pub fn from_relations(
        snapshots: &[RelationSnapshot],
        is_leader: bool,
    ) -> Result<Option<Self>, RelationError> {
        if !is_leader {
            info!("This unit is not leader, no action will be taken.");
            return Ok(None);
        }

        let snapshot = snapshots
            .iter()
            .find(|r| r.relation == relations::LOCALGATEWAY_INFO)
            .ok_or_else(|| RelationError::Missing(relations::LOCALGATEWAY_INFO.to_string()))?;

        match (
            snapshot.data.get(relations::LOCALGATEWAY_NAME),
            snapshot.data.get(relations::LOCALGATEWAY_NAMESPACE),
        ) {
            (Some(name), Some(namespace)) => Ok(Some(Self {
                name: name.clone(),
                namespace: namespace.clone(),
            })),
            (name, namespace) => Err(RelationError::DataMissing {
                relation: relations::LOCALGATEWAY_INFO.to_string(),
                missing: [
                    (relations::LOCALGATEWAY_NAME, name.is_none()),
                    (relations::LOCALGATEWAY_NAMESPACE, namespace.is_none()),
                ]
                .into_iter()
                .filter(|(_, missing)| *missing)
                .map(|(key, _)| key.to_string())
                .collect(),
            }),
        }
    }

    /// Expose the gateway to templates as `localgateway_name` and `localgateway_namespace`.
    pub fn insert_into(&self, context: &mut RenderContext) {
        context.insert(relations::LOCALGATEWAY_NAME, self.name.clone());
        context.insert(relations::LOCALGATEWAY_NAMESPACE, self.namespace.clone());
    }
}

/// Publication for the provider side; values are placeholder templates.
pub fn provider_publication(name: &str, namespace: &str) -> PublicationSpec {
    PublicationSpec::new(
        relations::LOCALGATEWAY_INFO,
        &[
            (relations::LOCALGATEWAY_NAME, name),
            (relations::LOCALGATEWAY_NAMESPACE, namespace),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn make_snapshot(entries: &[(&str, &str)]) -> RelationSnapshot {
        RelationSnapshot::new(
            relations::LOCALGATEWAY_INFO,
            "knative-serving",
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn test_from_relations_reads_gateway() {
        let relations = [make_snapshot(&[
            ("localgateway_name", "knative-local-gateway"),
            ("localgateway_namespace", "kubeflow"),
        ])];

        let info = LocalGatewayInfo::from_relations(&relations, true)
            .unwrap()
            .unwrap();

        assert_eq!(info.name, "knative-local-gateway");
        assert_eq!(info.namespace, "kubeflow");

        let mut ctx = RenderContext::new();
        info.insert_into(&mut ctx);
        assert_eq!(ctx.get_str("localgateway_namespace"), Some("kubeflow"));
    }

    #[test]
    fn test_from_relations_non_leader_does_nothing() {
        assert_eq!(LocalGatewayInfo::from_relations(&[], false).unwrap(), None);
    }

    #[test]
    fn test_from_relations_missing_relation() {
        assert_eq!(
            LocalGatewayInfo::from_relations(&[], true).unwrap_err(),
            RelationError::Missing("knative-serving-networking".to_string())
        );
    }

    #[test]
    fn test_from_relations_missing_data() {
        let relations = [make_snapshot(&[("localgateway_name", "knative-local-gateway")])];

        assert_eq!(
            LocalGatewayInfo::from_relations(&relations, true).unwrap_err(),
            RelationError::DataMissing {
                relation: "knative-serving-networking".to_string(),
                missing: vec!["localgateway_namespace".to_string()],
            }
        );
    }
}
