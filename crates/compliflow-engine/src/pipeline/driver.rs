use chrono::Utc;
use compliflow_core::config::DEFAULT_WORKFLOW_NAME;
use compliflow_core::errors::{PromotionError, PromotionOutcome};
use compliflow_core::record::DeploymentRecord;
use compliflow_core::traits::{DeployNotifier, DeploymentRepository};
use compliflow_core::types::ChecklistItem;
use tracing::{debug, info, warn};

use super::state::{reduce, PromotionEvent, PromotionState};

/// Drives [`reduce`] and performs the side effects of a promotion:
/// record construction, repository write, and the deploy notification.
///
/// Only one attempt is in flight at a time; `submit` runs the whole
/// Validating → Deploying → Deployed → Idle tail before returning.
pub struct PromotionPipeline<R: DeploymentRepository, N: DeployNotifier> {
    repository: R,
    notifier: N,
    state: PromotionState,
    default_workflow_name: String,
}

impl<R: DeploymentRepository, N: DeployNotifier> PromotionPipeline<R, N> {
    pub fn new(repository: R, notifier: N) -> Self {
        Self {
            repository,
            notifier,
            state: PromotionState::Idle,
            default_workflow_name: DEFAULT_WORKFLOW_NAME.to_string(),
        }
    }

    /// Name used when the editor hands over no (or a blank) workflow name.
    /// A blank placeholder falls back to [`DEFAULT_WORKFLOW_NAME`].
    pub fn with_default_workflow_name(mut self, name: impl Into<String>) -> Self {
        self.default_workflow_name = name.into();
        self
    }

    pub fn state(&self) -> &PromotionState {
        &self.state
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn into_parts(self) -> (R, N) {
        (self.repository, self.notifier)
    }

    pub fn open_dialog(&mut self, workflow_name: Option<&str>) {
        let workflow_name = [workflow_name, Some(self.default_workflow_name.as_str())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|n| !n.is_empty())
            .unwrap_or(DEFAULT_WORKFLOW_NAME)
            .to_string();
        self.apply(PromotionEvent::OpenDialog { workflow_name });
    }

    pub fn toggle(&mut self, item: ChecklistItem) {
        self.apply(PromotionEvent::Toggle(item));
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.apply(PromotionEvent::SetVersion(version.into()));
    }

    /// Close the dialog, discarding its state. Nothing is written.
    pub fn cancel(&mut self) {
        self.apply(PromotionEvent::Cancel);
        self.apply(PromotionEvent::Settled);
    }

    /// Submit the checklist.
    ///
    /// An unmet gate is not an error: the dialog stays open and the outcome is
    /// [`PromotionOutcome::Blocked`]. A failed write returns the error, skips
    /// the notification, and reopens the dialog ready to retry.
    pub fn submit(&mut self) -> Result<PromotionOutcome, PromotionError> {
        self.apply(PromotionEvent::Submit);
        if !matches!(self.state, PromotionState::Validating(_)) {
            return Ok(PromotionOutcome::Blocked);
        }

        self.apply(PromotionEvent::Validated);
        let PromotionState::Deploying(request) = &self.state else {
            return Ok(PromotionOutcome::Blocked);
        };

        let record = DeploymentRecord::new(
            request.workflow_name.clone(),
            request.version.clone(),
            Utc::now(),
        );
        if let Err(e) = self.repository.append(record.clone()) {
            warn!(name = %record.name, version = %record.version, error = %e, "deployment write failed");
            self.apply(PromotionEvent::PersistFailed);
            return Err(e.into());
        }

        self.apply(PromotionEvent::Persisted(record.clone()));
        info!(name = %record.name, version = %record.version, "workflow promoted");
        self.notifier.on_deploy(&record);
        self.apply(PromotionEvent::Settled);
        Ok(PromotionOutcome::Deployed(record))
    }

    fn apply(&mut self, event: PromotionEvent) {
        let from = self.state.name();
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, event);
        if from != self.state.name() {
            debug!(from, to = self.state.name(), "promotion state");
        }
    }
}
