// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Identity and desired state of the Kubernetes objects a workload converges.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kinds whose creation other objects in the same set depend on.
const PREREQUISITE_KINDS: &[&str] = &[
    "CustomResourceDefinition",
    "Namespace",
    "ServiceAccount",
    "ClusterRole",
    "ClusterRoleBinding",
    "Role",
    "RoleBinding",
];

/// Kinds served without a namespace. Any other kind is namespaced.
const CLUSTER_SCOPED_KINDS: &[&str] = &[
    "APIService",
    "CSIDriver",
    "CSINode",
    "CertificateSigningRequest",
    "ClusterDomainClaim",
    "ClusterIssuer",
    "ClusterRole",
    "ClusterRoleBinding",
    "ComponentStatus",
    "CustomResourceDefinition",
    "FlowSchema",
    "IngressClass",
    "MutatingWebhookConfiguration",
    "Namespace",
    "Node",
    "PersistentVolume",
    "PriorityClass",
    "PriorityLevelConfiguration",
    "RuntimeClass",
    "StorageClass",
    "ValidatingAdmissionPolicy",
    "ValidatingAdmissionPolicyBinding",
    "ValidatingWebhookConfiguration",
    "VolumeAttachment",
];

/// Whether objects of `kind` live outside any namespace.
pub fn is_cluster_scoped_kind(kind: &str) -> bool {
    CLUSTER_SCOPED_KINDS.contains(&kind)
}

/// Enough identity to get, patch or delete an object on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    pub api_version: String,
    pub kind: String,
    /// `None` for cluster-scoped kinds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
}

impl ResourceId {
    pub fn new(api_version: &str, kind: &str, namespace: Option<&str>, name: &str) -> Self {
        Self {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        }
    }

    /// Identity of a typed `k8s-openapi` resource.
    pub fn of<K: k8s_openapi::Resource>(namespace: Option<&str>, name: &str) -> Self {
        Self::new(K::API_VERSION, K::KIND, namespace, name)
    }

    /// Split `apiVersion` into group and version; the core group is `""`.
    pub fn group_version(&self) -> (&str, &str) {
        match self.api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", self.api_version.as_str()),
        }
    }

    /// Scope of the kind, whatever the manifest said about a namespace.
    pub fn is_cluster_scoped(&self) -> bool {
        is_cluster_scoped_kind(&self.kind)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}/{}", self.kind, ns, self.name),
            None => write!(f, "{}/{}", self.kind, self.name),
        }
    }
}

/// One object to converge: its identity plus the full desired body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceDescriptor {
    id: ResourceId,
    body: Value,
}

impl ResourceDescriptor {
    /// Build a descriptor from a parsed manifest document.
    pub fn from_value(body: Value) -> Result<Self, String> {
        let field = |path: &[&str]| -> Option<String> {
            let mut cursor = &body;
            for key in path {
                cursor = cursor.get(key)?;
            }
            cursor.as_str().filter(|s| !s.is_empty()).map(str::to_string)
        };

        if !body.is_object() {
            return Err("document is not a mapping".to_string());
        }
        let api_version = field(&["apiVersion"]).ok_or("missing apiVersion")?;
        let kind = field(&["kind"]).ok_or("missing kind")?;
        let name = field(&["metadata", "name"]).ok_or("missing metadata.name")?;
        let namespace =
            field(&["metadata", "namespace"]).filter(|_| !is_cluster_scoped_kind(&kind));

        Ok(Self {
            id: ResourceId {
                api_version,
                kind,
                namespace,
                name,
            },
            body,
        })
    }

    /// Place a namespaced object that names no namespace into `namespace`.
    pub fn with_default_namespace(mut self, namespace: &str) -> Self {
        if self.id.namespace.is_some() || self.id.is_cluster_scoped() {
            return self;
        }
        self.id.namespace = Some(namespace.to_string());
        if let Some(metadata) = self.body.get_mut("metadata").and_then(Value::as_object_mut) {
            metadata.insert("namespace".to_string(), Value::from(namespace));
        }
        self
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Whether later objects in the set are likely to need this one to exist first.
    pub fn is_prerequisite(&self) -> bool {
        self.id.is_cluster_scoped() || PREREQUISITE_KINDS.contains(&self.id.kind.as_str())
    }
}

/// Ordered result of rendering every template of a workload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DesiredResourceSet(Vec<ResourceDescriptor>);

impl DesiredResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, resource: ResourceDescriptor) {
        self.0.push(resource);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResourceDescriptor> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ids(&self) -> Vec<&ResourceId> {
        self.0.iter().map(ResourceDescriptor::id).collect()
    }

    /// Multi-document YAML of the whole set, in set order.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        let mut out = String::new();
        for resource in &self.0 {
            out.push_str("---\n");
            out.push_str(&serde_yaml::to_string(resource.body())?);
        }
        Ok(out)
    }
}

impl FromIterator<ResourceDescriptor> for DesiredResourceSet {
    fn from_iter<I: IntoIterator<Item = ResourceDescriptor>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DesiredResourceSet {
    type Item = &'a ResourceDescriptor;
    type IntoIter = std::slice::Iter<'a, ResourceDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
