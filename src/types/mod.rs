// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Data model shared by every stage of a reconcile.

pub mod outcome;
pub mod resource;
pub mod status;
pub mod trigger;

pub use outcome::{
    Classification, Disposition, Failure, ReconcileOutcome, ResourceOutcome, Severity,
    TeardownFailure, TeardownOutcome, TeardownState,
};
pub use resource::{DesiredResourceSet, ResourceDescriptor, ResourceId};
pub use status::UnitStatus;
pub use trigger::{RelationSnapshot, Trigger, TriggerKind};
