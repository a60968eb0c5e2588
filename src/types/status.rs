// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};
use std::fmt;

/// The status a unit displays for its workload.
///
/// `Blocked` needs an operator to change configuration or permissions,
/// `Waiting` is expected to clear on a later trigger without new input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum UnitStatus {
    Active(String),
    Maintenance(String),
    Waiting(String),
    Blocked(String),
}

impl UnitStatus {
    pub fn active() -> Self {
        UnitStatus::Active(String::new())
    }

    pub fn maintenance(message: impl Into<String>) -> Self {
        UnitStatus::Maintenance(message.into())
    }

    pub fn waiting(message: impl Into<String>) -> Self {
        UnitStatus::Waiting(message.into())
    }

    pub fn blocked(message: impl Into<String>) -> Self {
        UnitStatus::Blocked(message.into())
    }

    pub fn name(&self) -> &'static str {
        match self {
            UnitStatus::Active(_) => "active",
            UnitStatus::Maintenance(_) => "maintenance",
            UnitStatus::Waiting(_) => "waiting",
            UnitStatus::Blocked(_) => "blocked",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            UnitStatus::Active(m)
            | UnitStatus::Maintenance(m)
            | UnitStatus::Waiting(m)
            | UnitStatus::Blocked(m) => m,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, UnitStatus::Active(_))
    }
}

impl Default for UnitStatus {
    fn default() -> Self {
        UnitStatus::Maintenance(String::new())
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message().is_empty() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "{}: {}", self.name(), self.message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(UnitStatus::active().to_string(), "active");
        assert_eq!(
            UnitStatus::blocked("ApiError: 400").to_string(),
            "blocked: ApiError: 400"
        );
    }

    #[test]
    fn test_serialize_tagged() {
        let json = serde_json::to_value(UnitStatus::waiting("CRD not registered")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "waiting", "message": "CRD not registered"})
        );
    }
}
