// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use serde::Serialize;
use thiserror::Error;

/// Operator-supplied configuration or relation data that cannot be turned into a render context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Config item `{0}` must be set")]
    MissingConfig(String),

    #[error("Encountered error while parsing image config with value '{value}': {reason}")]
    InvalidImageConfig { value: String, reason: String },

    #[error("Relation data error: {0}")]
    Relation(#[from] RelationError),
}

/// Errors raised while reading peer-supplied relation data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelationError {
    #[error("Missing {0} relation")]
    Missing(String),

    #[error("Relation {relation} is missing data: {}", missing.join(", "))]
    DataMissing {
        relation: String,
        missing: Vec<String>,
    },
}

/// A mismatch between the templates and the context they are rendered with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Template '{template}' references unresolved placeholder '{placeholder}'")]
    UnresolvedPlaceholder {
        template: String,
        placeholder: String,
    },

    #[error("Template '{template}' uses unknown filter '{filter}'")]
    UnknownFilter { template: String, filter: String },

    #[error("Template '{template}' rendered invalid YAML: {reason}")]
    InvalidYaml { template: String, reason: String },

    #[error("Document {index} of template '{template}' is not a Kubernetes object: {reason}")]
    InvalidResource {
        template: String,
        index: usize,
        reason: String,
    },

    #[error("Failed to read template '{path}': {reason}")]
    TemplateSource { path: String, reason: String },
}

/// A Kubernetes API failure, classified by what the reconciler needs to know about it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ClusterError {
    #[error("not found")]
    NotFound,

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("forbidden: {message}")]
    Forbidden { message: String },

    #[error("server-side apply is not supported: {message}")]
    UnsupportedMediaType { message: String },

    #[error("API error {code} ({reason}): {message}")]
    Api {
        code: u16,
        reason: String,
        message: String,
    },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("serialization error: {message}")]
    Serialization { message: String },
}

impl ClusterError {
    /// Classify an HTTP status returned by the API server.
    pub fn from_status(code: u16, reason: String, message: String) -> Self {
        match code {
            403 => ClusterError::Forbidden { message },
            404 => ClusterError::NotFound,
            409 => ClusterError::Conflict { message },
            415 => ClusterError::UnsupportedMediaType { message },
            _ => ClusterError::Api {
                code,
                reason,
                message,
            },
        }
    }

    /// The HTTP status code behind this error, when there is one.
    pub fn code(&self) -> Option<u16> {
        match self {
            ClusterError::NotFound => Some(404),
            ClusterError::Conflict { .. } => Some(409),
            ClusterError::Forbidden { .. } => Some(403),
            ClusterError::UnsupportedMediaType { .. } => Some(415),
            ClusterError::Api { code, .. } => Some(*code),
            ClusterError::Transport { .. } | ClusterError::Serialization { .. } => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound)
    }
}

impl From<kube::Error> for ClusterError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(resp) => ClusterError::from_status(resp.code, resp.reason, resp.message),
            kube::Error::SerdeError(e) => ClusterError::Serialization {
                message: e.to_string(),
            },
            other => ClusterError::Transport {
                message: other.to_string(),
            },
        }
    }
}

#[derive(Error, Debug)]
pub enum ReconcilerError {
    #[error("Kubernetes API error: {0}")]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Invalid workload definition: {0}")]
    WorkloadDefinition(String),

    #[error("Unknown workload: {0}")]
    UnknownWorkload(String),
}

pub type Result<T> = std::result::Result<T, ReconcilerError>;
