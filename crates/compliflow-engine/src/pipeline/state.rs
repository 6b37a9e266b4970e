use compliflow_core::record::DeploymentRecord;
use compliflow_core::types::ChecklistItem;

use crate::gates::checklist::ChecklistDialog;

/// A workflow name and version that passed the checklist gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionRequest {
    pub workflow_name: String,
    pub version: String,
}

/// One deployment attempt.
///
/// ```text
/// Idle -> ChecklistOpen -> Validating -> Deploying -> Deployed -> Idle
///              \-> Cancelled -> Idle
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PromotionState {
    #[default]
    Idle,
    ChecklistOpen {
        workflow_name: String,
        dialog: ChecklistDialog,
    },
    Validating(PromotionRequest),
    Deploying(PromotionRequest),
    Deployed(DeploymentRecord),
    Cancelled,
}

impl PromotionState {
    pub fn name(&self) -> &'static str {
        match self {
            PromotionState::Idle => "idle",
            PromotionState::ChecklistOpen { .. } => "checklist_open",
            PromotionState::Validating(_) => "validating",
            PromotionState::Deploying(_) => "deploying",
            PromotionState::Deployed(_) => "deployed",
            PromotionState::Cancelled => "cancelled",
        }
    }

    /// Idle and Cancelled both accept a fresh `OpenDialog`.
    pub fn is_resting(&self) -> bool {
        matches!(self, PromotionState::Idle | PromotionState::Cancelled)
    }

    pub fn dialog(&self) -> Option<&ChecklistDialog> {
        match self {
            PromotionState::ChecklistOpen { dialog, .. } => Some(dialog),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PromotionEvent {
    OpenDialog { workflow_name: String },
    Toggle(ChecklistItem),
    SetVersion(String),
    Submit,
    Cancel,
    Validated,
    Persisted(DeploymentRecord),
    PersistFailed,
    Settled,
}

/// Pure transition function. Pairs not listed below leave the state unchanged.
pub fn reduce(state: PromotionState, event: PromotionEvent) -> PromotionState {
    use PromotionEvent as E;
    use PromotionState as S;

    match (state, event) {
        (s, E::OpenDialog { workflow_name }) if s.is_resting() => S::ChecklistOpen {
            workflow_name,
            dialog: ChecklistDialog::new(),
        },
        (
            S::ChecklistOpen {
                workflow_name,
                mut dialog,
            },
            E::Toggle(item),
        ) => {
            dialog.toggle(item);
            S::ChecklistOpen {
                workflow_name,
                dialog,
            }
        }
        (
            S::ChecklistOpen {
                workflow_name,
                mut dialog,
            },
            E::SetVersion(version),
        ) => {
            dialog.set_version(version);
            S::ChecklistOpen {
                workflow_name,
                dialog,
            }
        }
        (
            S::ChecklistOpen {
                workflow_name,
                mut dialog,
            },
            E::Submit,
        ) => {
            let mut request = None;
            dialog.submit(|version| {
                request = Some(PromotionRequest {
                    workflow_name: workflow_name.clone(),
                    version: version.to_string(),
                })
            });
            match request {
                Some(request) => S::Validating(request),
                None => S::ChecklistOpen {
                    workflow_name,
                    dialog,
                },
            }
        }
        (S::ChecklistOpen { .. }, E::Cancel) => S::Cancelled,
        (S::Validating(request), E::Validated) => S::Deploying(request),
        (S::Deploying(_), E::Persisted(record)) => S::Deployed(record),
        (S::Deploying(request), E::PersistFailed) => S::ChecklistOpen {
            dialog: ChecklistDialog::satisfied(request.version),
            workflow_name: request.workflow_name,
        },
        (S::Deployed(_) | S::Cancelled, E::Settled) => S::Idle,
        (state, _) => state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn open(name: &str) -> PromotionState {
        reduce(
            PromotionState::Idle,
            PromotionEvent::OpenDialog {
                workflow_name: name.into(),
            },
        )
    }

    fn fill(mut state: PromotionState, items: &[ChecklistItem], version: &str) -> PromotionState {
        for item in items {
            state = reduce(state, PromotionEvent::Toggle(*item));
        }
        reduce(state, PromotionEvent::SetVersion(version.into()))
    }

    #[test]
    fn open_starts_with_fresh_checklist() {
        let state = open("Claims Detection v2");
        let dialog = state.dialog().unwrap();
        assert_eq!(dialog, &ChecklistDialog::new());
    }

    #[test]
    fn submit_with_missing_approval_stays_open() {
        let state = fill(
            open("Claims Detection v2"),
            &[ChecklistItem::EvaluationPassed, ChecklistItem::NodesValidated],
            "2.0.0",
        );
        let after = reduce(state.clone(), PromotionEvent::Submit);
        assert_eq!(after, state);
    }

    #[test]
    fn full_happy_path() {
        let state = fill(open("Claims Detection v2"), &ChecklistItem::ALL, " 2.0.0 ");
        let state = reduce(state, PromotionEvent::Submit);
        assert_eq!(
            state,
            PromotionState::Validating(PromotionRequest {
                workflow_name: "Claims Detection v2".into(),
                version: "2.0.0".into(),
            })
        );

        let state = reduce(state, PromotionEvent::Validated);
        assert_eq!(state.name(), "deploying");

        let record = DeploymentRecord::new("Claims Detection v2", "2.0.0", Utc::now());
        let state = reduce(state, PromotionEvent::Persisted(record.clone()));
        assert_eq!(state, PromotionState::Deployed(record));

        assert_eq!(reduce(state, PromotionEvent::Settled), PromotionState::Idle);
    }

    #[test]
    fn cancel_collapses_to_idle_and_forgets_checklist() {
        let state = fill(
            open("Claims Detection v2"),
            &[ChecklistItem::EvaluationPassed, ChecklistItem::ApprovalObtained],
            "2.0.0",
        );
        let state = reduce(state, PromotionEvent::Cancel);
        assert_eq!(state, PromotionState::Cancelled);
        let state = reduce(state, PromotionEvent::Settled);
        assert_eq!(state, PromotionState::Idle);

        let reopened = reduce(
            state,
            PromotionEvent::OpenDialog {
                workflow_name: "Claims Detection v2".into(),
            },
        );
        let dialog = reopened.dialog().unwrap();
        assert_eq!(dialog.checklist().outstanding(), ChecklistItem::ALL.to_vec());
        assert_eq!(dialog.version(), "");
    }

    #[test]
    fn persist_failure_reopens_satisfied_checklist() {
        let state = PromotionState::Deploying(PromotionRequest {
            workflow_name: "A".into(),
            version: "1".into(),
        });
        let state = reduce(state, PromotionEvent::PersistFailed);
        let dialog = state.dialog().unwrap();
        assert!(dialog.can_submit());
        assert_eq!(dialog.version(), "1");
    }

    #[test]
    fn unrelated_events_are_ignored() {
        assert_eq!(
            reduce(PromotionState::Idle, PromotionEvent::Submit),
            PromotionState::Idle
        );
        assert_eq!(
            reduce(PromotionState::Idle, PromotionEvent::Cancel),
            PromotionState::Idle
        );
        let open = open("A");
        let again = reduce(
            open.clone(),
            PromotionEvent::OpenDialog {
                workflow_name: "B".into(),
            },
        );
        assert_eq!(again, open, "an open dialog is not replaced");
    }
}
