// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod kubernetes;
pub mod reconcile;
pub mod relations;
pub mod render;
pub mod types;
pub mod workloads;

#[cfg(test)]
pub mod test_utils;
