// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Builds the render context for one reconcile.
//!
//! Three layers are merged, lowest precedence first: the workload's
//! hard-coded defaults, operator configuration, then relation data from the
//! relations the workload consumes. The merge is per key; only image
//! overrides are merged as a map.

use crate::context::images::{parse_image_config, update_images, ImageMap};
use crate::context::RenderContext;
use crate::error::{ConfigurationError, RelationError};
use crate::relations::otel;
use crate::types::RelationSnapshot;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Image overrides read from a YAML-encoded config item.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOverride {
    /// Config item holding the YAML override mapping
    pub config_key: String,
    /// Context key the merged image map is published under
    pub context_key: String,
    #[serde(default)]
    pub defaults: ImageMap,
}

/// Keys a present relation must carry before its data is usable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RelationExpectation {
    pub relation: String,
    pub keys: Vec<String>,
}

/// Values computed from the merged context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Derivation {
    /// `otel_collector_address` and `metrics_backend` from collector relation data
    OtelCollector,
}

/// How a workload assembles its render context.
#[derive(Debug, Clone, Default)]
pub struct ContextSpec {
    pub defaults: RenderContext,
    /// Config items that must be set to a non-empty value
    pub required_config: Vec<String>,
    pub images: Option<ImageOverride>,
    /// Relations whose data is merged into the context
    pub consumes: Vec<String>,
    pub expects: Vec<RelationExpectation>,
    pub derive: Vec<Derivation>,
}

/// Assemble the render context from the workload's defaults, the operator's
/// configuration and any relation data.
pub fn build_context(
    spec: &ContextSpec,
    config: &BTreeMap<String, String>,
    relations: &[RelationSnapshot],
) -> Result<RenderContext, ConfigurationError> {
    for key in &spec.required_config {
        if config.get(key).map_or(true, |v| v.trim().is_empty()) {
            return Err(ConfigurationError::MissingConfig(key.clone()));
        }
    }

    for expectation in &spec.expects {
        check_expectation(expectation, relations)?;
    }

    let mut context = spec.defaults.clone();
    context.merge(config_layer(spec, config)?);

    for snapshot in relations
        .iter()
        .filter(|s| spec.consumes.iter().any(|r| r == &s.relation))
    {
        debug!(
            "Merging {} keys from relation {} ({})",
            snapshot.data.len(),
            snapshot.relation,
            snapshot.app
        );
        context.merge(
            snapshot
                .data
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone()))),
        );
    }

    for derivation in &spec.derive {
        match derivation {
            Derivation::OtelCollector => otel::derive_collector_context(&mut context),
        }
    }

    Ok(context)
}

fn config_layer(
    spec: &ContextSpec,
    config: &BTreeMap<String, String>,
) -> Result<Vec<(String, Value)>, ConfigurationError> {
    let mut layer: Vec<(String, Value)> = config
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();

    if let Some(images) = &spec.images {
        let custom = match config.get(&images.config_key) {
            Some(raw) => parse_image_config(raw)?,
            None => ImageMap::new(),
        };
        let merged = update_images(&images.defaults, &custom);
        layer.push((
            images.context_key.clone(),
            Value::Object(
                merged
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect(),
            ),
        ));
    }

    Ok(layer)
}

fn check_expectation(
    expectation: &RelationExpectation,
    relations: &[RelationSnapshot],
) -> Result<(), RelationError> {
    for snapshot in relations
        .iter()
        .filter(|s| s.relation == expectation.relation)
    {
        let missing: Vec<String> = expectation
            .keys
            .iter()
            .filter(|k| !snapshot.data.contains_key(*k))
            .cloned()
            .collect();

        if !missing.is_empty() {
            return Err(RelationError::DataMissing {
                relation: expectation.relation.clone(),
                missing,
            });
        }
    }
    Ok(())
}
