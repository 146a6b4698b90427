use std::fmt;

use chrono::{DateTime, Utc};

use crate::actions::{derive_actions, DerivationPolicy};
use crate::models::{Report, Strike};
use crate::panel::{Control, PanelState};

/// Snapshot of everything the panel shows, formatted through `Display`.
pub struct PanelView<'a> {
    pub reports: &'a [Report],
    pub reports_loaded: bool,
    pub strikes: &'a [Strike],
    pub strikes_loaded: bool,
    pub panel: &'a PanelState,
    pub policy: &'a DerivationPolicy,
}

/// RFC 3339 timestamps are shown in UTC to the minute; anything else as sent.
pub fn format_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn control_line(f: &mut fmt::Formatter<'_>, slot: &str, label: &str, enabled: bool, pending: bool) -> fmt::Result {
    if pending {
        writeln!(f, "     [{slot}] {label} …")
    } else if enabled {
        writeln!(f, "     [{slot}] {label}")
    } else {
        writeln!(f, "     [{slot}] {label} (unavailable)")
    }
}

impl PanelView<'_> {
    fn write_report(&self, f: &mut fmt::Formatter<'_>, position: usize, report: &Report) -> fmt::Result {
        let mut summary = vec![report.key.clone()];
        summary.push(report.kind.clone().unwrap_or_else(|| "unknown".to_string()));
        if let Some(display) = &report.target_display {
            summary.push(display.clone());
        } else if let Some(target) = &report.target_id {
            summary.push(target.clone());
        }
        if let Some(created) = &report.created_at {
            summary.push(format_timestamp(created));
        }
        writeln!(f, "  {position}. {}", summary.join(" · "))?;

        if let Some(reason) = &report.reason {
            writeln!(f, "     reason: {reason}")?;
        }

        let strike_reason = self.panel.reason_for(&report.key);
        if strike_reason.is_empty() {
            writeln!(f, "     strike reason: (none)")?;
        } else {
            writeln!(f, "     strike reason: \"{strike_reason}\"")?;
        }

        let strike_pending = self.panel.is_pending(&report.key, Control::Strike);
        control_line(f, "s", Control::Strike.label(), report.strike_target().is_some(), strike_pending)?;

        for (index, action) in derive_actions(report, self.policy).iter().enumerate() {
            let pending = self.panel.is_pending(&report.key, Control::Action(action.kind));
            control_line(f, &(index + 1).to_string(), action.label(), action.enabled, pending)?;
        }

        if self.panel.is_expanded(&report.key) {
            let pretty = serde_json::to_string_pretty(&report.raw).unwrap_or_else(|_| report.raw.to_string());
            for line in pretty.lines() {
                writeln!(f, "       {line}")?;
            }
        }

        Ok(())
    }

    fn write_strike(&self, f: &mut fmt::Formatter<'_>, strike: &Strike) -> fmt::Result {
        let user = strike.user_id.as_deref().unwrap_or("unknown user");
        let reason = strike.reason.as_deref().unwrap_or("—");
        match &strike.created_at {
            Some(created) => writeln!(f, "  - {user}: {reason} ({})", format_timestamp(created)),
            None => writeln!(f, "  - {user}: {reason}"),
        }
    }
}

impl fmt::Display for PanelView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reports ({})", self.reports.len())?;
        if !self.reports_loaded {
            writeln!(f, "  Loading reports…")?;
        } else if self.reports.is_empty() {
            writeln!(f, "  No reports available")?;
        }
        for (index, report) in self.reports.iter().enumerate() {
            self.write_report(f, index + 1, report)?;
        }

        writeln!(f)?;
        writeln!(f, "Strikes ({})", self.strikes.len())?;
        if !self.strikes_loaded {
            writeln!(f, "  Loading strikes…")?;
        } else if self.strikes.is_empty() {
            writeln!(f, "  No strikes recorded")?;
        }
        for strike in self.strikes {
            self.write_strike(f, strike)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionKind;
    use crate::models::FromListItem;
    use serde_json::json;

    fn render(reports: &[Report], strikes: &[Strike], panel: &PanelState) -> String {
        PanelView {
            reports,
            reports_loaded: true,
            strikes,
            strikes_loaded: true,
            panel,
            policy: &DerivationPolicy::default(),
        }
        .to_string()
    }

    #[test]
    fn empty_lists_show_fallbacks() {
        let out = render(&[], &[], &PanelState::default());
        assert!(out.contains("Reports (0)"));
        assert!(out.contains("No reports available"));
        assert!(out.contains("No strikes recorded"));
    }

    #[test]
    fn unloaded_lists_show_loading() {
        let panel = PanelState::default();
        let out = PanelView {
            reports: &[],
            reports_loaded: false,
            strikes: &[],
            strikes_loaded: false,
            panel: &panel,
            policy: &DerivationPolicy::default(),
        }
        .to_string();
        assert!(out.contains("Loading reports…"));
        assert!(!out.contains("No reports available"));
    }

    #[test]
    fn report_row_lists_every_action() {
        let report = Report::from_item(json!({
            "_id": "r1",
            "type": "message",
            "target_display": "reported in channel:abc",
            "created_at": "2024-05-01T10:00:00+02:00",
            "additional_context": "spam links",
            "content": {"Message": {"id": "m1"}}
        }));
        let out = render(&[report], &[], &PanelState::new("spam"));

        assert!(out.contains("1. r1 · message · reported in channel:abc · 2024-05-01 08:00 UTC"));
        assert!(out.contains("reason: spam links"));
        assert!(out.contains("strike reason: \"spam\""));
        assert!(out.contains("[s] Issue Strike (unavailable)"));
        assert!(out.contains("[1] Remove Message\n"));
        assert!(out.contains("[2] Remove Server (unavailable)"));
        assert!(out.contains("[3] Kick from Server (unavailable)"));
        assert!(out.contains("[4] Ban from Server (unavailable)"));
    }

    #[test]
    fn pending_controls_are_marked() {
        let report = Report::from_item(json!({"_id": "r1", "content": {"Server": {"id": "s1"}}}));
        let mut panel = PanelState::default();
        panel.try_begin("r1", Control::Action(ActionKind::RemoveServer));
        let out = render(&[report], &[], &panel);
        assert!(out.contains("[2] Remove Server …"));
    }

    #[test]
    fn only_expanded_row_shows_json() {
        let a = Report::from_item(json!({"_id": "a", "marker": "alpha"}));
        let b = Report::from_item(json!({"_id": "b", "marker": "beta"}));
        let mut panel = PanelState::default();
        panel.toggle_expanded("b");

        let out = render(&[a, b], &[], &panel);
        assert!(out.contains("\"marker\": \"beta\""));
        assert!(!out.contains("alpha"));
    }

    #[test]
    fn strikes_are_listed() {
        let strikes = vec![
            Strike::from_item(json!({"user_id": "u1", "reason": "spam", "created_at": "2024-05-01T10:00:00Z"})),
            Strike::from_item(json!({"target": "u2"})),
        ];
        let out = render(&[], &strikes, &PanelState::default());
        assert!(out.contains("Strikes (2)"));
        assert!(out.contains("- u1: spam (2024-05-01 10:00 UTC)"));
        assert!(out.contains("- u2: —"));
    }

    #[test]
    fn unparsable_timestamps_pass_through() {
        assert_eq!(format_timestamp("yesterday"), "yesterday");
        assert_eq!(format_timestamp("2024-01-02T03:04:05Z"), "2024-01-02 03:04 UTC");
    }
}
