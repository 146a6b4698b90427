use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::actions::ActionKind;

/// A triggerable control on a report row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Strike,
    Action(ActionKind),
}

impl Control {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Strike => "Issue Strike",
            Self::Action(kind) => kind.label(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct RowState {
    pub expanded: bool,
    pub reason: Option<String>,
    pending: HashSet<Control>,
}

/// Per-row view state keyed by report row key.
#[derive(Debug, Default)]
pub struct PanelState {
    default_reason: String,
    rows: HashMap<String, RowState>,
}

impl PanelState {
    pub fn new(default_reason: impl Into<String>) -> Self {
        Self {
            default_reason: default_reason.into(),
            rows: HashMap::new(),
        }
    }

    fn row_mut(&mut self, key: &str) -> &mut RowState {
        self.rows.entry(key.to_string()).or_default()
    }

    /// Drops state for rows that are no longer listed. Rows with a control
    /// in flight stay until their guard releases them.
    pub fn retain_rows(&mut self, listed: &HashSet<String>) {
        self.rows
            .retain(|key, row| listed.contains(key) || !row.pending.is_empty());
    }

    // --- Raw JSON inspection ---

    /// Opens the row and closes every other one, or closes it if it was open.
    /// Returns whether the row is now expanded.
    pub fn toggle_expanded(&mut self, key: &str) -> bool {
        let now_expanded = !self.is_expanded(key);
        for (row_key, row) in self.rows.iter_mut() {
            if row_key != key {
                row.expanded = false;
            }
        }
        self.row_mut(key).expanded = now_expanded;
        now_expanded
    }

    pub fn is_expanded(&self, key: &str) -> bool {
        self.rows.get(key).map(|r| r.expanded).unwrap_or(false)
    }

    pub fn expanded_key(&self) -> Option<&str> {
        self.rows
            .iter()
            .find(|(_, row)| row.expanded)
            .map(|(key, _)| key.as_str())
    }

    // --- Strike reasons ---

    pub fn set_default_reason(&mut self, reason: &str) {
        self.default_reason = reason.trim().to_string();
    }

    pub fn default_reason(&self) -> &str {
        &self.default_reason
    }

    /// A blank reason removes the row's override.
    pub fn set_row_reason(&mut self, key: &str, reason: &str) {
        let reason = reason.trim();
        self.row_mut(key).reason = (!reason.is_empty()).then(|| reason.to_string());
    }

    pub fn reason_for(&self, key: &str) -> &str {
        self.rows
            .get(key)
            .and_then(|r| r.reason.as_deref())
            .unwrap_or(&self.default_reason)
    }

    // --- In-flight controls ---

    /// Marks the control pending. Returns false if it already was.
    pub fn try_begin(&mut self, key: &str, control: Control) -> bool {
        self.row_mut(key).pending.insert(control)
    }

    pub fn finish(&mut self, key: &str, control: Control) {
        if let Some(row) = self.rows.get_mut(key) {
            row.pending.remove(&control);
        }
    }

    pub fn is_pending(&self, key: &str, control: Control) -> bool {
        self.rows
            .get(key)
            .map(|r| r.pending.contains(&control))
            .unwrap_or(false)
    }
}

/// Clears a pending control when dropped, whether the call succeeded,
/// failed or was abandoned.
pub struct PendingGuard<'a> {
    panel: &'a Mutex<PanelState>,
    key: String,
    control: Control,
}

impl<'a> PendingGuard<'a> {
    /// Returns `None` if the control is already in flight.
    pub fn begin(panel: &'a Mutex<PanelState>, key: &str, control: Control) -> Option<Self> {
        let started = panel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .try_begin(key, control);

        started.then(|| Self {
            panel,
            key: key.to_string(),
            control,
        })
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.panel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .finish(&self.key, self.control);
    }
}
