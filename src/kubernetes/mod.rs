// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Access to the Kubernetes API for untyped manifest objects.

pub mod client;

pub use client::{field_manager, ClusterApi, KubeClusterApi};
