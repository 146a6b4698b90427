use std::sync::{Mutex, MutexGuard};

use modpanel_shared::clients::ModerationApi;
use modpanel_shared::errors::{AppError, AppResult, ErrorCode};

use crate::actions::{derive_actions, Action, DerivationPolicy};
use crate::models::{Report, Strike};
use crate::mutations::{create_strike, run_action, ActionRequest, CreateStrikeRequest};
use crate::notify::Notifier;
use crate::panel::{Control, PanelState, PendingGuard};
use crate::queries::{ListQuery, REPORTS_PATH, STRIKES_PATH};
use crate::render::PanelView;

/// The moderator panel: two cached lists, per-row state and the flows that
/// turn button presses into backend calls.
///
/// Every flow reports its outcome through the notifier before returning, so
/// callers only need the returned result for control flow.
pub struct Dashboard<A, N> {
    api: A,
    notifier: N,
    policy: DerivationPolicy,
    reports: ListQuery<Report>,
    strikes: ListQuery<Strike>,
    panel: Mutex<PanelState>,
}

impl<A: ModerationApi, N: Notifier> Dashboard<A, N> {
    pub fn new(api: A, notifier: N, policy: DerivationPolicy, default_reason: &str) -> Self {
        Self {
            api,
            notifier,
            policy,
            reports: ListQuery::new("reports", REPORTS_PATH),
            strikes: ListQuery::new("strikes", STRIKES_PATH),
            panel: Mutex::new(PanelState::new(default_reason.trim())),
        }
    }

    fn panel(&self) -> MutexGuard<'_, PanelState> {
        self.panel.lock().unwrap_or_else(|e| e.into_inner())
    }

    // --- Queries ---

    /// Refetches both lists, then drops row state of reports that left the
    /// list.
    pub async fn refresh(&self) {
        let (reports, strikes) = tokio::join!(self.reports.fetch(&self.api), self.strikes.fetch(&self.api));
        self.panel().retain_rows(&self.reports.keys());
        tracing::debug!(reports, strikes, "dashboard refreshed");
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.items()
    }

    pub fn strikes(&self) -> Vec<Strike> {
        self.strikes.items()
    }

    /// Looks a report up by row key, else by 1-based position. An id made of
    /// digits therefore beats the row at that position.
    pub fn find_report(&self, selector: &str) -> AppResult<Report> {
        let reports = self.reports.items();
        let by_position = || {
            selector
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| reports.get(i))
        };

        reports
            .iter()
            .find(|r| r.key == selector)
            .or_else(by_position)
            .cloned()
            .ok_or_else(|| AppError::new(ErrorCode::ReportNotFound, format!("no report '{selector}'")))
    }

    pub fn actions_for(&self, report: &Report) -> Vec<Action> {
        derive_actions(report, &self.policy)
    }

    // --- View state ---

    pub fn toggle_expanded(&self, key: &str) -> bool {
        self.panel().toggle_expanded(key)
    }

    pub fn expanded_key(&self) -> Option<String> {
        self.panel().expanded_key().map(str::to_string)
    }

    pub fn set_default_reason(&self, reason: &str) {
        self.panel().set_default_reason(reason);
    }

    pub fn set_row_reason(&self, key: &str, reason: &str) {
        self.panel().set_row_reason(key, reason);
    }

    pub fn render(&self) -> String {
        let reports = self.reports.items();
        let strikes = self.strikes.items();
        let panel = self.panel();
        PanelView {
            reports: &reports,
            reports_loaded: self.reports.is_loaded(),
            strikes: &strikes,
            strikes_loaded: self.strikes.is_loaded(),
            panel: &panel,
            policy: &self.policy,
        }
        .to_string()
    }

    // --- Flows ---

    fn fail(&self, error: AppError) -> AppError {
        self.notifier.show_error(&error);
        error
    }

    fn begin(&self, key: &str, control: Control) -> AppResult<PendingGuard<'_>> {
        PendingGuard::begin(&self.panel, key, control).ok_or_else(|| {
            tracing::warn!(report = %key, control = control.label(), "trigger ignored, already in flight");
            self.fail(AppError::new(
                ErrorCode::ActionPending,
                format!("{} already in progress", control.label()),
            ))
        })
    }

    /// Issues a strike against the report's user with the row's reason.
    pub async fn issue_strike(&self, report: &Report) -> AppResult<()> {
        let Some(user_id) = report.strike_target() else {
            return Err(self.fail(AppError::new(ErrorCode::NoUserId, "no user id found")));
        };

        let guard = self.begin(&report.key, Control::Strike)?;
        let reason = self.panel().reason_for(&report.key).to_string();
        let request = CreateStrikeRequest::new(user_id, &reason);

        let result = create_strike(&self.api, &request).await;
        drop(guard);

        match result {
            Ok(_) => {
                self.notifier.show_success("Strike issued");
                self.refresh().await;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Runs a derived action. Disabled actions are rejected without a call.
    pub async fn execute_action(&self, report: &Report, action: &Action) -> AppResult<()> {
        let (Some(method), Some(path), true) = (action.method, action.path.as_deref(), action.enabled) else {
            return Err(self.fail(AppError::new(ErrorCode::ActionUnavailable, "action not available")));
        };

        let guard = self.begin(&report.key, Control::Action(action.kind))?;
        let request = ActionRequest {
            method: method.as_str().to_string(),
            path: path.to_string(),
            body: None,
        };

        let result = run_action(&self.api, &request).await;
        drop(guard);

        match result {
            Ok(_) => {
                self.notifier.show_success(&format!("{} done", action.label()));
                self.refresh().await;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Runs the `index`th (1-based) derived action of a report.
    pub async fn execute_nth_action(&self, report: &Report, index: usize) -> AppResult<()> {
        let actions = self.actions_for(report);
        let Some(action) = index.checked_sub(1).and_then(|i| actions.get(i)) else {
            return Err(self.fail(AppError::bad_request(format!(
                "no action {index}, choose 1-{}",
                actions.len()
            ))));
        };
        self.execute_action(report, action).await
    }
}
