// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::types::{RelationSnapshot, Trigger, TriggerKind};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

/// Process configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Built-in workload name, or `custom`
    pub workload: String,
    /// YAML definition of a custom workload
    pub workload_file: Option<PathBuf>,
    pub trigger: TriggerKind,
    /// YAML or JSON document with config, relation data and leadership
    pub trigger_input: Option<PathBuf>,
    pub app_name: String,
    pub model_name: String,
}

/// Input the trigger source hands over for one invocation.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct TriggerInput {
    config: BTreeMap<String, String>,
    relations: Vec<RelationSnapshot>,
    is_leader: bool,
}

impl Default for TriggerInput {
    fn default() -> Self {
        Self {
            config: BTreeMap::new(),
            relations: Vec::new(),
            is_leader: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key).with_context(|| format!("{} environment variable not set", key))
        };

        let trigger = required("TRIGGER")?;
        let trigger = trigger
            .parse::<TriggerKind>()
            .map_err(|e| anyhow!("Invalid TRIGGER '{}': {}", trigger, e))?;

        Ok(Config {
            workload: required("WORKLOAD")?,
            workload_file: lookup("WORKLOAD_FILE").map(PathBuf::from),
            trigger,
            trigger_input: lookup("TRIGGER_INPUT").map(PathBuf::from),
            app_name: required("APP_NAME")?,
            model_name: required("MODEL_NAME")?,
        })
    }

    /// Assemble the trigger from `TRIGGER` and the optional input document.
    pub fn load_trigger(&self) -> Result<Trigger> {
        let input = match &self.trigger_input {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read trigger input {}", path.display()))?;
                parse_trigger_input(&raw)
                    .with_context(|| format!("Invalid trigger input {}", path.display()))?
            }
            None => TriggerInput::default(),
        };

        Ok(Trigger {
            kind: self.trigger,
            config: input.config,
            relations: input.relations,
            is_leader: input.is_leader,
        })
    }
}

fn parse_trigger_input(raw: &str) -> Result<TriggerInput> {
    if raw.trim().is_empty() {
        return Ok(TriggerInput::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}
