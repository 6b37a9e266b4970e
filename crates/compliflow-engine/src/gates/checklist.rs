use compliflow_core::types::ChecklistItem;
use serde::Serialize;

/// The three pre-deployment gates. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentChecklist {
    pub evaluation_passed: bool,
    pub approval_obtained: bool,
    pub nodes_validated: bool,
}

impl DeploymentChecklist {
    /// All three gates satisfied.
    pub fn all_checked() -> Self {
        Self {
            evaluation_passed: true,
            approval_obtained: true,
            nodes_validated: true,
        }
    }

    pub fn get(&self, item: ChecklistItem) -> bool {
        match item {
            ChecklistItem::EvaluationPassed => self.evaluation_passed,
            ChecklistItem::ApprovalObtained => self.approval_obtained,
            ChecklistItem::NodesValidated => self.nodes_validated,
        }
    }

    /// Flip exactly one gate.
    pub fn toggle(&mut self, item: ChecklistItem) {
        let slot = match item {
            ChecklistItem::EvaluationPassed => &mut self.evaluation_passed,
            ChecklistItem::ApprovalObtained => &mut self.approval_obtained,
            ChecklistItem::NodesValidated => &mut self.nodes_validated,
        };
        *slot = !*slot;
    }

    pub fn is_complete(&self) -> bool {
        self.evaluation_passed && self.approval_obtained && self.nodes_validated
    }

    /// Unchecked items, in display order.
    pub fn outstanding(&self) -> Vec<ChecklistItem> {
        ChecklistItem::ALL
            .into_iter()
            .filter(|item| !self.get(*item))
            .collect()
    }
}

/// Promotion is allowed only with every gate checked and a non-blank version.
pub fn can_deploy(checklist: &DeploymentChecklist, version: &str) -> bool {
    checklist.is_complete() && !version.trim().is_empty()
}

/// Scoped state of the checklist dialog: the gates plus the version being entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecklistDialog {
    checklist: DeploymentChecklist,
    version: String,
}

impl ChecklistDialog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dialog that already satisfies the gate, used to reopen after a failed write.
    pub fn satisfied(version: impl Into<String>) -> Self {
        Self {
            checklist: DeploymentChecklist::all_checked(),
            version: version.into(),
        }
    }

    pub fn checklist(&self) -> &DeploymentChecklist {
        &self.checklist
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn toggle(&mut self, item: ChecklistItem) {
        self.checklist.toggle(item);
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    pub fn can_submit(&self) -> bool {
        can_deploy(&self.checklist, &self.version)
    }

    /// Items still blocking submission; a blank version is reported separately.
    pub fn outstanding(&self) -> Vec<ChecklistItem> {
        self.checklist.outstanding()
    }

    /// Invoke `on_promote` with the trimmed version, exactly once, if the gate passes.
    ///
    /// On success the dialog resets itself for the next use. Returns whether
    /// the callback ran.
    pub fn submit<F: FnOnce(&str)>(&mut self, on_promote: F) -> bool {
        if !self.can_submit() {
            return false;
        }
        let dialog = std::mem::take(self);
        on_promote(dialog.version.trim());
        true
    }
}
