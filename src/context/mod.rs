// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Render context assembly from defaults, configuration and relation data.

pub mod builder;
pub mod images;

pub use builder::{build_context, ContextSpec, Derivation, ImageOverride, RelationExpectation};
pub use images::{parse_image_config, remove_empty_images, update_images, ImageMap};

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Parameters available to manifest templates, keyed by name in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RenderContext(BTreeMap<String, Value>);

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Resolve a placeholder path.
    ///
    /// Keys may themselves contain dots (`istio.gateway.name`), so an exact
    /// key match wins before the path is walked through nested mappings.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.0.get(path) {
            return Some(value);
        }

        let mut segments = path.split('.');
        let mut cursor = self.0.get(segments.next()?)?;
        for segment in segments {
            cursor = cursor.get(segment)?;
        }
        Some(cursor)
    }

    /// Overlay `layer` on this context, key by key.
    pub fn merge(&mut self, layer: impl IntoIterator<Item = (String, Value)>) {
        self.0.extend(layer);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<BTreeMap<String, Value>> for RenderContext {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for RenderContext {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
