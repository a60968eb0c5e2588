// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster API operations the reconciler needs, over any apiVersion and kind.

use crate::error::ClusterError;
use crate::types::{ResourceDescriptor, ResourceId};
use kube::{
    api::{
        ApiResource, DeleteParams, DynamicObject, GroupVersionKind, Patch, PatchParams,
        PostParams,
    },
    Api, Client,
};
use tracing::{debug, instrument};

/// Field manager recorded on every object this application writes.
pub fn field_manager(model_name: &str, app_name: &str) -> String {
    format!("{}-{}", model_name, app_name)
}

/// The five operations a reconcile or teardown performs against the cluster.
///
/// Errors are already classified into [`ClusterError`], so callers never see
/// a raw HTTP status.
#[allow(async_fn_in_trait)]
pub trait ClusterApi {
    /// Read the live object, `None` when it does not exist.
    async fn get(&self, id: &ResourceId) -> Result<Option<DynamicObject>, ClusterError>;

    /// Server-side apply with forced ownership.
    async fn apply(&self, resource: &ResourceDescriptor) -> Result<DynamicObject, ClusterError>;

    async fn create(&self, resource: &ResourceDescriptor) -> Result<DynamicObject, ClusterError>;

    /// JSON merge patch of the full desired body.
    async fn patch(&self, resource: &ResourceDescriptor) -> Result<DynamicObject, ClusterError>;

    async fn delete(&self, id: &ResourceId) -> Result<(), ClusterError>;
}

/// [`ClusterApi`] backed by a kube [`Client`].
#[derive(Clone)]
pub struct KubeClusterApi {
    client: Client,
    field_manager: String,
}

impl KubeClusterApi {
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    fn api(&self, id: &ResourceId) -> Api<DynamicObject> {
        let (group, version) = id.group_version();
        let resource = ApiResource::from_gvk(&GroupVersionKind::gvk(group, version, &id.kind));

        if id.is_cluster_scoped() {
            return Api::all_with(self.client.clone(), &resource);
        }
        match &id.namespace {
            Some(namespace) => Api::namespaced_with(self.client.clone(), namespace, &resource),
            None => Api::default_namespaced_with(self.client.clone(), &resource),
        }
    }

    fn object(resource: &ResourceDescriptor) -> Result<DynamicObject, ClusterError> {
        serde_json::from_value(resource.body().clone()).map_err(|e| ClusterError::Serialization {
            message: e.to_string(),
        })
    }
}

impl ClusterApi for KubeClusterApi {
    #[instrument(skip(self), fields(resource = %id))]
    async fn get(&self, id: &ResourceId) -> Result<Option<DynamicObject>, ClusterError> {
        Ok(self.api(id).get_opt(&id.name).await?)
    }

    #[instrument(skip_all, fields(resource = %resource.id()))]
    async fn apply(&self, resource: &ResourceDescriptor) -> Result<DynamicObject, ClusterError> {
        let id = resource.id();
        let params = PatchParams::apply(&self.field_manager).force();

        debug!("Applying {}", id);
        Ok(self
            .api(id)
            .patch(&id.name, &params, &Patch::Apply(resource.body()))
            .await?)
    }

    #[instrument(skip_all, fields(resource = %resource.id()))]
    async fn create(&self, resource: &ResourceDescriptor) -> Result<DynamicObject, ClusterError> {
        let id = resource.id();
        let params = PostParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        };

        debug!("Creating {}", id);
        Ok(self.api(id).create(&params, &Self::object(resource)?).await?)
    }

    #[instrument(skip_all, fields(resource = %resource.id()))]
    async fn patch(&self, resource: &ResourceDescriptor) -> Result<DynamicObject, ClusterError> {
        let id = resource.id();
        let params = PatchParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        };

        debug!("Merge patching {}", id);
        Ok(self
            .api(id)
            .patch(&id.name, &params, &Patch::Merge(resource.body()))
            .await?)
    }

    #[instrument(skip(self), fields(resource = %id))]
    async fn delete(&self, id: &ResourceId) -> Result<(), ClusterError> {
        debug!("Deleting {}", id);
        self.api(id)
            .delete(&id.name, &DeleteParams::default())
            .await?;
        Ok(())
    }
}
