// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses.

use crate::error::ClusterError;
use crate::kubernetes::ClusterApi;
use crate::types::{ResourceDescriptor, ResourceId};
use http::{Request, Response};
use http_body_util::BodyExt;
use kube::api::DynamicObject;
use kube::client::Body;
use kube::Client;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A request the mock API server received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

/// A mock HTTP service that returns predefined responses based on request paths.
///
/// Registering the same method and path more than once queues the responses;
/// the last one keeps being returned once the queue is drained.
#[derive(Clone, Default)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), VecDeque<(u16, String)>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back((status, body.to_string()));
        self
    }

    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    /// Build a kube Client backed by this mock, with `default` as its namespace.
    pub fn client(&self) -> Client {
        Client::new(self.clone(), "default")
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests that were not reads.
    pub fn writes(&self) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method != "GET")
            .count()
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let mut responses = self.responses.lock().unwrap();
        let exact = (method.to_string(), path.to_string());

        // Try exact match first, then prefix match for paths like /api/v1/namespaces/foo
        let key = if responses.contains_key(&exact) {
            exact
        } else {
            responses
                .keys()
                .find(|(m, p)| m == method && path.starts_with(p.as_str()))
                .cloned()?
        };
        let queue = responses.get_mut(&key)?;

        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mock = self.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let body = body.collect().await?.to_bytes();
            let method = parts.method.to_string();
            let path = parts.uri.path().to_string();

            mock.requests.lock().unwrap().push(RecordedRequest {
                method: method.clone(),
                path: path.clone(),
                query: parts.uri.query().unwrap_or_default().to_string(),
                content_type: parts
                    .headers
                    .get(http::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
                body: String::from_utf8_lossy(&body).into_owned(),
            });

            let (status, body) = mock
                .find_response(&method, &path)
                .unwrap_or_else(|| (404, status_json(404, "NotFound", "not found")));

            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))?)
        })
    }
}

/// A `Status` body as returned by the API server for failed requests.
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// A ConfigMap as returned by the API server.
pub fn config_map_json(namespace: &str, name: &str, resource_version: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "resourceVersion": resource_version,
            "uid": "test-uid"
        },
        "data": {}
    })
    .to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Get,
    Apply,
    Create,
    Patch,
    Delete,
}

#[derive(Default)]
struct FakeState {
    objects: BTreeMap<ResourceId, (Value, u64)>,
    next_version: u64,
    failures: HashMap<(Op, Option<ResourceId>), ClusterError>,
    calls: Vec<(Op, ResourceId)>,
    ssa_unsupported: bool,
}

/// In-memory [`ClusterApi`] with per-operation error injection.
///
/// Applying an identical body keeps the stored resourceVersion, anything else
/// bumps it, which is what the API server does for server-side apply.
#[derive(Default)]
pub struct FakeCluster {
    state: Mutex<FakeState>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every server-side apply with 415.
    pub fn without_server_side_apply(self) -> Self {
        self.state.lock().unwrap().ssa_unsupported = true;
        self
    }

    /// Fail `op` on `id` with `err`.
    pub fn fail(self, op: Op, id: &ResourceId, err: ClusterError) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert((op, Some(id.clone())), err);
        self
    }

    /// Fail `op` on every resource with `err`.
    pub fn fail_all(self, op: Op, err: ClusterError) -> Self {
        self.state.lock().unwrap().failures.insert((op, None), err);
        self
    }

    /// Store an object as if it had been created earlier.
    pub fn with_object(self, body: Value) -> Self {
        let resource = ResourceDescriptor::from_value(body).unwrap();
        {
            let mut state = self.state.lock().unwrap();
            state.next_version += 1;
            let version = state.next_version;
            state
                .objects
                .insert(resource.id().clone(), (resource.body().clone(), version));
        }
        self
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.state.lock().unwrap().objects.contains_key(id)
    }

    pub fn object_ids(&self) -> Vec<ResourceId> {
        self.state.lock().unwrap().objects.keys().cloned().collect()
    }

    pub fn body(&self, id: &ResourceId) -> Option<Value> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(id)
            .map(|(body, _)| body.clone())
    }

    pub fn calls(&self) -> Vec<(Op, ResourceId)> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_of(&self, op: Op) -> Vec<ResourceId> {
        self.calls()
            .into_iter()
            .filter(|(o, _)| *o == op)
            .map(|(_, id)| id)
            .collect()
    }

    pub fn writes(&self) -> usize {
        self.calls().iter().filter(|(op, _)| *op != Op::Get).count()
    }

    fn begin(&self, op: Op, id: &ResourceId) -> Result<std::sync::MutexGuard<'_, FakeState>, ClusterError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((op, id.clone()));
        let injected = state
            .failures
            .get(&(op, Some(id.clone())))
            .or_else(|| state.failures.get(&(op, None)))
            .cloned();
        match injected {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }

    fn store(state: &mut FakeState, resource: &ResourceDescriptor) -> Result<DynamicObject, ClusterError> {
        let id = resource.id().clone();
        let version = match state.objects.get(&id) {
            Some((body, version)) if body == resource.body() => *version,
            _ => {
                state.next_version += 1;
                state.next_version
            }
        };
        state.objects.insert(id, (resource.body().clone(), version));
        Self::to_object(resource.body(), version)
    }

    fn to_object(body: &Value, version: u64) -> Result<DynamicObject, ClusterError> {
        let mut body = body.clone();
        body["metadata"]["resourceVersion"] = Value::String(version.to_string());
        serde_json::from_value(body).map_err(|e| ClusterError::Serialization {
            message: e.to_string(),
        })
    }
}

impl ClusterApi for FakeCluster {
    async fn get(&self, id: &ResourceId) -> Result<Option<DynamicObject>, ClusterError> {
        let state = self.begin(Op::Get, id)?;
        state
            .objects
            .get(id)
            .map(|(body, version)| Self::to_object(body, *version))
            .transpose()
    }

    async fn apply(&self, resource: &ResourceDescriptor) -> Result<DynamicObject, ClusterError> {
        let mut state = self.begin(Op::Apply, resource.id())?;
        if state.ssa_unsupported {
            return Err(ClusterError::UnsupportedMediaType {
                message: "the body of the request was in an unknown format".to_string(),
            });
        }
        Self::store(&mut state, resource)
    }

    async fn create(&self, resource: &ResourceDescriptor) -> Result<DynamicObject, ClusterError> {
        let mut state = self.begin(Op::Create, resource.id())?;
        if state.objects.contains_key(resource.id()) {
            return Err(ClusterError::Conflict {
                message: format!("{} already exists", resource.id()),
            });
        }
        Self::store(&mut state, resource)
    }

    async fn patch(&self, resource: &ResourceDescriptor) -> Result<DynamicObject, ClusterError> {
        let mut state = self.begin(Op::Patch, resource.id())?;
        if !state.objects.contains_key(resource.id()) {
            return Err(ClusterError::NotFound);
        }
        Self::store(&mut state, resource)
    }

    async fn delete(&self, id: &ResourceId) -> Result<(), ClusterError> {
        let mut state = self.begin(Op::Delete, id)?;
        state
            .objects
            .remove(id)
            .map(|_| ())
            .ok_or(ClusterError::NotFound)
    }
}
