// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reconcile and teardown of a workload against the cluster.

pub mod apply;
pub mod classify;
pub mod gate;
pub mod reconciler;
pub mod teardown;

pub use apply::apply;
pub use classify::{classify, configuration_status, gate_status};
pub use gate::{GateResult, NotReady, Precondition, PreconditionGate, RetryPolicy};
pub use reconciler::{ReconcileReport, Reconciler, TeardownReport};
pub use teardown::teardown;
