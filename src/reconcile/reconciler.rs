// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The two entry points a trigger source calls: [`Reconciler::reconcile`] and
//! [`Reconciler::teardown`].

use crate::constants::status::{APPLYING, REMOVED, REMOVING};
use crate::context::{build_context, RenderContext};
use crate::error::{ConfigurationError, ReconcilerError, Result};
use crate::kubernetes::ClusterApi;
use crate::reconcile::apply::apply;
use crate::reconcile::classify::{classify, configuration_status, gate_status};
use crate::reconcile::gate::{GateResult, NotReady, PreconditionGate, RetryPolicy};
use crate::reconcile::teardown::teardown;
use crate::relations::localgateway::LocalGatewayInfo;
use crate::relations::metrics::resolve_scrape_publication;
use crate::relations::{render_publications, Publication};
use crate::render::render;
use crate::types::{
    ReconcileOutcome, TeardownOutcome, TeardownState, Trigger, UnitStatus,
};
use crate::workloads::WorkloadSpec;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

/// What one reconcile did, for the trigger source to act on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub status: UnitStatus,
    pub status_changed: bool,
    /// Every status set during the call, in order
    pub transitions: Vec<UnitStatus>,
    /// Re-trigger after this many seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requeue_after_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ReconcileOutcome>,
    /// Relation data to write to this application's bucket
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub publications: Vec<Publication>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeardownReport {
    pub status: UnitStatus,
    pub status_changed: bool,
    pub transitions: Vec<UnitStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<TeardownState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TeardownOutcome>,
    #[serde(skip)]
    error: Option<ReconcilerError>,
}

impl TeardownReport {
    pub fn error(&self) -> Option<&ReconcilerError> {
        self.error.as_ref()
    }

    /// Surface the first failure, after every deletion has been attempted.
    pub fn into_result(self) -> Result<TeardownOutcome> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let outcome = self.outcome.unwrap_or_default();
        match outcome.first_error() {
            Some(failure) => Err(ReconcilerError::Cluster(failure.error.clone())),
            None => Ok(outcome),
        }
    }
}

/// Status bookkeeping for a single call.
struct Transitions {
    initial: UnitStatus,
    statuses: Vec<UnitStatus>,
}

impl Transitions {
    fn new(initial: &UnitStatus) -> Self {
        Self {
            initial: initial.clone(),
            statuses: Vec::new(),
        }
    }

    fn changed(&self, current: &UnitStatus) -> bool {
        !self.statuses.is_empty() && *current != self.initial
    }
}

/// Converges one workload; generic over the cluster so tests can run it in memory.
pub struct Reconciler<C> {
    workload: WorkloadSpec,
    cluster: C,
    status: UnitStatus,
    retry: RetryPolicy,
}

impl<C: ClusterApi> Reconciler<C> {
    pub fn new(workload: WorkloadSpec, cluster: C) -> Self {
        Self {
            workload,
            cluster,
            status: UnitStatus::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Start from the status the unit currently displays.
    pub fn with_status(mut self, status: UnitStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn status(&self) -> &UnitStatus {
        &self.status
    }

    pub fn workload(&self) -> &WorkloadSpec {
        &self.workload
    }

    pub fn cluster(&self) -> &C {
        &self.cluster
    }

    /// Render the workload and converge the cluster to it.
    ///
    /// Never fails: every problem ends up in the returned status. A unit that
    /// is not the leader returns immediately without touching the cluster or
    /// its status.
    #[instrument(skip_all, fields(workload = %self.workload.name, trigger = %trigger.kind))]
    pub async fn reconcile(&mut self, trigger: &Trigger) -> ReconcileReport {
        let mut transitions = Transitions::new(&self.status);
        let mut report = ReconcileReport {
            status: self.status.clone(),
            status_changed: false,
            transitions: Vec::new(),
            requeue_after_secs: None,
            outcome: None,
            publications: Vec::new(),
        };

        if !self.is_writer(trigger) {
            info!("This unit is not leader, no action will be taken");
            return report;
        }

        let context = match self.render_context(trigger) {
            Ok(context) => context,
            Err(err) => {
                warn!("Cannot build render context: {}", err);
                self.set_status(&mut transitions, configuration_status(&err));
                return self.finish(report, transitions);
            }
        };

        let resources = match render(&context, self.workload.active_templates(trigger)) {
            Ok(resources) => resources,
            Err(err) => {
                error!("Failed to render manifests: {}", err);
                self.set_status(&mut transitions, UnitStatus::blocked(err.to_string()));
                return self.finish(report, transitions);
            }
        };

        let gate = PreconditionGate::new(&self.cluster, self.retry, trigger.is_leader)
            .check(&self.workload.preconditions, &context)
            .await;
        if let GateResult::NotReady(NotReady::Pending { retry_after, .. }) = &gate {
            report.requeue_after_secs = Some(retry_after.as_secs());
        }
        if let Some(status) = gate_status(&gate) {
            self.set_status(&mut transitions, status);
            return self.finish(report, transitions);
        }

        let mut publications = match render_publications(&self.workload.publications, &context, trigger)
        {
            Ok(publications) => publications,
            Err(err) => {
                error!("Failed to render relation data: {}", err);
                self.set_status(&mut transitions, UnitStatus::blocked(err.to_string()));
                return self.finish(report, transitions);
            }
        };

        self.set_status(&mut transitions, UnitStatus::maintenance(APPLYING));
        let outcome = apply(&self.cluster, &resources).await;
        let mut status = classify(&outcome);

        match self.scrape_publications(trigger, &context).await {
            Ok(scraped) => publications.extend(scraped),
            Err(err) if status.is_active() => {
                error!("Failed to resolve scrape targets: {}", err);
                status = UnitStatus::blocked(err.to_string());
            }
            Err(err) => warn!("Failed to resolve scrape targets: {}", err),
        }
        self.set_status(&mut transitions, status);

        report.outcome = Some(outcome);
        report.publications = publications;
        self.finish(report, transitions)
    }

    /// Delete everything the workload may have created, conditional templates included.
    #[instrument(skip_all, fields(workload = %self.workload.name))]
    pub async fn teardown(&mut self, trigger: &Trigger) -> TeardownReport {
        let mut transitions = Transitions::new(&self.status);
        let mut report = TeardownReport {
            status: self.status.clone(),
            status_changed: false,
            transitions: Vec::new(),
            state: None,
            outcome: None,
            error: None,
        };

        if !self.is_writer(trigger) {
            info!("This unit is not leader, no action will be taken");
            return report;
        }

        self.set_status(&mut transitions, UnitStatus::maintenance(REMOVING));

        let rendered = build_context(&self.workload.context, &trigger.config, &trigger.relations)
            .map(|mut context| {
                self.insert_local_gateway(&mut context, trigger);
                context
            })
            .map_err(ReconcilerError::from)
            .and_then(|context| Ok(render(&context, self.workload.all_templates())?));

        let resources = match rendered {
            Ok(resources) => resources,
            Err(err) => {
                warn!("Cannot render manifests to remove: {}", err);
                self.set_status(&mut transitions, UnitStatus::blocked(err.to_string()));
                report.error = Some(err);
                return self.finish_teardown(report, transitions);
            }
        };

        let outcome = teardown(&self.cluster, &resources).await;
        let state = outcome.state();
        let status = match outcome.first_error() {
            Some(failure) => UnitStatus::blocked(format!(
                "Failed to remove {}: {}",
                failure.id, failure.error
            )),
            None => UnitStatus::maintenance(REMOVED),
        };
        self.set_status(&mut transitions, status);

        report.state = Some(state);
        report.outcome = Some(outcome);
        self.finish_teardown(report, transitions)
    }

    fn is_writer(&self, trigger: &Trigger) -> bool {
        PreconditionGate::new(&self.cluster, self.retry, trigger.is_leader)
            .check_leadership(&self.workload.preconditions)
            == GateResult::Ready
    }

    /// Scrape jobs for established relations whose Service already exists.
    async fn scrape_publications(
        &self,
        trigger: &Trigger,
        context: &RenderContext,
    ) -> Result<Vec<Publication>> {
        let mut publications = Vec::new();
        for endpoint in &self.workload.scrape_endpoints {
            if !trigger.has_relation(&endpoint.relation) {
                continue;
            }
            if let Some(publication) =
                resolve_scrape_publication(&self.cluster, endpoint, context).await?
            {
                publications.push(publication);
            }
        }
        Ok(publications)
    }

    fn render_context(&self, trigger: &Trigger) -> std::result::Result<RenderContext, ConfigurationError> {
        let mut context =
            build_context(&self.workload.context, &trigger.config, &trigger.relations)?;

        if self.workload.requires_local_gateway {
            if let Some(gateway) =
                LocalGatewayInfo::from_relations(&trigger.relations, trigger.is_leader)?
            {
                gateway.insert_into(&mut context);
            }
        }
        Ok(context)
    }

    /// Best effort: a removed relation must not prevent removal.
    fn insert_local_gateway(&self, context: &mut RenderContext, trigger: &Trigger) {
        if !self.workload.requires_local_gateway {
            return;
        }
        if let Ok(Some(gateway)) = LocalGatewayInfo::from_relations(&trigger.relations, trigger.is_leader) {
            gateway.insert_into(context);
        }
    }

    fn set_status(&mut self, transitions: &mut Transitions, status: UnitStatus) {
        info!("Setting status to {}", status);
        transitions.statuses.push(status.clone());
        self.status = status;
    }

    fn finish(&self, mut report: ReconcileReport, transitions: Transitions) -> ReconcileReport {
        report.status = self.status.clone();
        report.status_changed = transitions.changed(&self.status);
        report.transitions = transitions.statuses;
        report
    }

    fn finish_teardown(&self, mut report: TeardownReport, transitions: Transitions) -> TeardownReport {
        report.status = self.status.clone();
        report.status_changed = transitions.changed(&self.status);
        report.transitions = transitions.statuses;
        report
    }
}
