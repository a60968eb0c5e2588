// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Relation data the reconciler publishes to, and reads from, peer applications.
//!
//! The reconciler never writes relation data itself: publications are returned
//! to the trigger source, which writes them to this application's bucket on
//! every instance of the named relation.

pub mod localgateway;
pub mod metrics;
pub mod otel;

use crate::context::RenderContext;
use crate::error::RenderError;
use crate::render::Template;
use crate::types::Trigger;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key/value pairs to publish on a relation, with values rendered from the context.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublicationSpec {
    pub relation: String,
    /// Value templates, using the same placeholder syntax as manifests
    pub data: BTreeMap<String, String>,
}

impl PublicationSpec {
    pub fn new(relation: &str, data: &[(&str, &str)]) -> Self {
        Self {
            relation: relation.to_string(),
            data: data
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Rendered data for the trigger source to write to our application bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Publication {
    pub relation: String,
    pub data: BTreeMap<String, String>,
}

/// Render the publications whose relation is currently established.
pub fn render_publications(
    specs: &[PublicationSpec],
    context: &RenderContext,
    trigger: &Trigger,
) -> Result<Vec<Publication>, RenderError> {
    specs
        .iter()
        .filter(|spec| trigger.has_relation(&spec.relation))
        .map(|spec| {
            let data = spec
                .data
                .iter()
                .map(|(key, value)| {
                    let name = format!("{}:{}", spec.relation, key);
                    Template::new(&name, value.clone())
                        .render(context)
                        .map(|rendered| (key.clone(), rendered))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()?;
            Ok(Publication {
                relation: spec.relation.clone(),
                data,
            })
        })
        .collect()
}
