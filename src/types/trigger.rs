// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The lifecycle event that caused this invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerKind {
    Install,
    ConfigChanged,
    UpgradeCharm,
    LeaderElected,
    UpdateStatus,
    RelationChanged,
    Remove,
}

impl TriggerKind {
    pub fn is_removal(&self) -> bool {
        matches!(self, TriggerKind::Remove)
    }
}

impl FromStr for TriggerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "install" => Ok(TriggerKind::Install),
            "config-changed" => Ok(TriggerKind::ConfigChanged),
            "upgrade-charm" => Ok(TriggerKind::UpgradeCharm),
            "leader-elected" => Ok(TriggerKind::LeaderElected),
            "update-status" => Ok(TriggerKind::UpdateStatus),
            "relation-changed" => Ok(TriggerKind::RelationChanged),
            "remove" => Ok(TriggerKind::Remove),
            other => Err(format!("unknown trigger '{}'", other)),
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TriggerKind::Install => "install",
            TriggerKind::ConfigChanged => "config-changed",
            TriggerKind::UpgradeCharm => "upgrade-charm",
            TriggerKind::LeaderElected => "leader-elected",
            TriggerKind::UpdateStatus => "update-status",
            TriggerKind::RelationChanged => "relation-changed",
            TriggerKind::Remove => "remove",
        };
        f.write_str(s)
    }
}

/// Data a peer application published on one relation instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSnapshot {
    /// Relation endpoint name, e.g. `otel-collector`
    pub relation: String,
    /// Remote application name
    #[serde(default)]
    pub app: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl RelationSnapshot {
    pub fn new(relation: &str, app: &str, data: BTreeMap<String, String>) -> Self {
        Self {
            relation: relation.to_string(),
            app: app.to_string(),
            data,
        }
    }
}

/// Everything the trigger source hands the reconciler for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub kind: TriggerKind,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
    #[serde(default)]
    pub relations: Vec<RelationSnapshot>,
    #[serde(default = "default_is_leader")]
    pub is_leader: bool,
}

fn default_is_leader() -> bool {
    true
}

impl Trigger {
    pub fn new(kind: TriggerKind) -> Self {
        Self {
            kind,
            config: BTreeMap::new(),
            relations: Vec::new(),
            is_leader: true,
        }
    }

    pub fn with_config(mut self, key: &str, value: &str) -> Self {
        self.config.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_relation(mut self, snapshot: RelationSnapshot) -> Self {
        self.relations.push(snapshot);
        self
    }

    pub fn with_leader(mut self, is_leader: bool) -> Self {
        self.is_leader = is_leader;
        self
    }

    pub fn has_relation(&self, relation: &str) -> bool {
        self.relations.iter().any(|r| r.relation == relation)
    }
}
