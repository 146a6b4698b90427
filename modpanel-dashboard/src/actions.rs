use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use modpanel_shared::errors::{AppError, ErrorCode};

use crate::models::Report;

lazy_static! {
    static ref CHANNEL_REF: Regex = Regex::new(r"(?i)channel[:/]?((?-u:[\w-]+))").unwrap();
}

// --- Scan policy ---

/// Which snapshot wins when several carry the id being looked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPolicy {
    FirstMatch,
    LastMatch,
}

impl ScanPolicy {
    pub fn pick<'a>(self, mut candidates: impl Iterator<Item = &'a str>) -> Option<String> {
        let picked = match self {
            Self::FirstMatch => candidates.next(),
            Self::LastMatch => candidates.last(),
        };
        picked.map(str::to_string)
    }
}

impl FromStr for ScanPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "first_match" => Ok(Self::FirstMatch),
            "last" | "last_match" => Ok(Self::LastMatch),
            other => Err(AppError::Validation(format!(
                "unknown scan policy '{other}', expected 'first' or 'last'"
            ))),
        }
    }
}

/// Snapshot scan policies used by [`derive_actions`].
///
/// Channel and message ids take the first snapshot that has one. The context
/// server id takes the last, which is what moderators have been running
/// against; `MODPANEL__CONTEXT_SERVER_SCAN=first` switches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivationPolicy {
    pub channel: ScanPolicy,
    pub message: ScanPolicy,
    pub context_server: ScanPolicy,
}

impl Default for DerivationPolicy {
    fn default() -> Self {
        Self {
            channel: ScanPolicy::FirstMatch,
            message: ScanPolicy::FirstMatch,
            context_server: ScanPolicy::LastMatch,
        }
    }
}

// --- HTTP verbs ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVerb {
    Delete,
    Put,
    Post,
}

impl HttpVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Put => "PUT",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpVerb {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DELETE" => Ok(Self::Delete),
            "PUT" => Ok(Self::Put),
            "POST" => Ok(Self::Post),
            _ => Err(AppError::new(
                ErrorCode::UnsupportedMethod,
                format!("unsupported method '{s}'"),
            )),
        }
    }
}

// --- Actions ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    RemoveMessage,
    RemoveServer,
    KickMember,
    BanMember,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::RemoveMessage,
        ActionKind::RemoveServer,
        ActionKind::KickMember,
        ActionKind::BanMember,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::RemoveMessage => "Remove Message",
            Self::RemoveServer => "Remove Server",
            Self::KickMember => "Kick from Server",
            Self::BanMember => "Ban from Server",
        }
    }

    pub fn verb(&self) -> HttpVerb {
        match self {
            Self::BanMember => HttpVerb::Put,
            _ => HttpVerb::Delete,
        }
    }
}

/// A candidate moderation call. `path` is only set when every id the call
/// needs was resolved, and `enabled` mirrors that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub enabled: bool,
    pub method: Option<HttpVerb>,
    pub path: Option<String>,
}

impl Action {
    fn new(kind: ActionKind, path: Option<String>) -> Self {
        Self {
            kind,
            enabled: path.is_some(),
            method: Some(kind.verb()),
            path,
        }
    }

    pub fn label(&self) -> &'static str {
        self.kind.label()
    }
}

/// Ids scraped out of a report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Targets {
    pub message_id: Option<String>,
    pub channel_id: Option<String>,
    pub server_id: Option<String>,
    pub user_id: Option<String>,
    pub context_server_id: Option<String>,
}

pub fn resolve_targets(report: &Report, policy: &DerivationPolicy) -> Targets {
    let snapshots = &report.snapshots;

    let channel_id = policy
        .channel
        .pick(snapshots.iter().filter_map(|s| s.channel_id.as_deref()))
        .or_else(|| report.target_display.as_deref().and_then(channel_from_display));

    let message_id = report
        .content
        .message_id()
        .map(str::to_string)
        .or_else(|| policy.message.pick(snapshots.iter().filter_map(|s| s.message_id.as_deref())));

    let server_id = report
        .content
        .server_id()
        .or_else(|| report.target_if_kind("server"))
        .map(str::to_string);

    let user_id = report
        .content
        .user_id()
        .or_else(|| report.target_if_kind("user"))
        .map(str::to_string);

    let context_server_id = policy
        .context_server
        .pick(snapshots.iter().filter_map(|s| s.server_id.as_deref()));

    Targets {
        message_id,
        channel_id,
        server_id,
        user_id,
        context_server_id,
    }
}

/// Extracts `abc123` from display strings like `reported in channel:abc123`.
pub fn channel_from_display(display: &str) -> Option<String> {
    CHANNEL_REF
        .captures(display)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Every action, in display order, enabled or not.
pub fn derive_actions(report: &Report, policy: &DerivationPolicy) -> Vec<Action> {
    let targets = resolve_targets(report, policy);

    let remove_message = match (&targets.message_id, &targets.channel_id) {
        (Some(message), Some(channel)) => Some(format!("/channels/{channel}/messages/{message}")),
        _ => None,
    };

    let remove_server = targets.server_id.as_ref().map(|server| format!("/servers/{server}"));

    let (kick, ban) = match (&targets.user_id, &targets.context_server_id) {
        (Some(user), Some(server)) => (
            Some(format!("/servers/{server}/members/{user}")),
            Some(format!("/servers/{server}/bans/{user}")),
        ),
        _ => (None, None),
    };

    vec![
        Action::new(ActionKind::RemoveMessage, remove_message),
        Action::new(ActionKind::RemoveServer, remove_server),
        Action::new(ActionKind::KickMember, kick),
        Action::new(ActionKind::BanMember, ban),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FromListItem;
    use serde_json::{json, Value};

    fn report(raw: Value) -> Report {
        Report::from_item(raw)
    }

    fn action(actions: &[Action], kind: ActionKind) -> &Action {
        actions.iter().find(|a| a.kind == kind).unwrap()
    }

    #[test]
    fn always_four_actions_in_order() {
        let actions = derive_actions(&report(json!({})), &DerivationPolicy::default());
        let kinds: Vec<_> = actions.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, ActionKind::ALL.to_vec());
        assert!(actions.iter().all(|a| !a.enabled && a.path.is_none()));
    }

    #[test]
    fn message_with_snapshot_channel_enables_remove_message() {
        let r = report(json!({
            "content": {"Message": {"id": "m1"}},
            "snapshots": [{"content": {"channel_id": "c1"}}]
        }));
        let actions = derive_actions(&r, &DerivationPolicy::default());
        let remove = action(&actions, ActionKind::RemoveMessage);
        assert!(remove.enabled);
        assert_eq!(remove.method, Some(HttpVerb::Delete));
        assert_eq!(remove.path.as_deref(), Some("/channels/c1/messages/m1"));
    }

    #[test]
    fn message_without_channel_stays_disabled() {
        let r = report(json!({"content": {"message": {"id": "m1"}}}));
        let actions = derive_actions(&r, &DerivationPolicy::default());
        let remove = action(&actions, ActionKind::RemoveMessage);
        assert!(!remove.enabled);
        assert_eq!(remove.path, None);
    }

    #[test]
    fn channel_falls_back_to_target_display() {
        let r = report(json!({
            "content": {"Message": {"id": "m1"}},
            "target_display": "reported in channel:abc123"
        }));
        let targets = resolve_targets(&r, &DerivationPolicy::default());
        assert_eq!(targets.channel_id.as_deref(), Some("abc123"));

        let actions = derive_actions(&r, &DerivationPolicy::default());
        assert_eq!(
            action(&actions, ActionKind::RemoveMessage).path.as_deref(),
            Some("/channels/abc123/messages/m1")
        );
    }

    #[test]
    fn channel_regex_variants() {
        assert_eq!(channel_from_display("Channel/general-2").as_deref(), Some("general-2"));
        assert_eq!(channel_from_display("in CHANNELxyz").as_deref(), Some("xyz"));
        assert_eq!(channel_from_display("a direct message"), None);
    }

    #[test]
    fn message_content_disables_kick_without_user_target() {
        let r = report(json!({
            "type": "message",
            "target_id": "t1",
            "content": {"Message": {"id": "m1"}, "User": {"id": "u1"}},
            "snapshots": [{"content": {"server_id": "s1"}}]
        }));
        let actions = derive_actions(&r, &DerivationPolicy::default());
        assert!(!actions[2].enabled);
        assert!(!actions[3].enabled);
    }

    #[test]
    fn channel_names_stop_at_non_ascii() {
        assert_eq!(channel_from_display("channel:café").as_deref(), Some("caf"));
        assert_eq!(channel_from_display("channel:éclair"), None);
        assert_eq!(channel_from_display("channel:\u{212A}9"), None);
    }

    #[test]
    fn snapshot_channel_beats_display() {
        let r = report(json!({
            "target_display": "channel:from-display",
            "snapshots": [{"content": {"channel_id": "from-snapshot"}}]
        }));
        let targets = resolve_targets(&r, &DerivationPolicy::default());
        assert_eq!(targets.channel_id.as_deref(), Some("from-snapshot"));
    }

    #[test]
    fn message_id_falls_back_to_snapshots() {
        let r = report(json!({
            "snapshots": [
                {"content": {"channel_id": "c1"}},
                {"content": {"message_id": "m-first"}},
                {"content": {"message_id": "m-second"}}
            ]
        }));
        let actions = derive_actions(&r, &DerivationPolicy::default());
        assert_eq!(
            action(&actions, ActionKind::RemoveMessage).path.as_deref(),
            Some("/channels/c1/messages/m-first")
        );
    }

    #[test]
    fn content_message_id_beats_snapshots() {
        let r = report(json!({
            "content": {"Message": {"id": "m-content"}},
            "snapshots": [{"content": {"channel_id": "c1", "message_id": "m-snap"}}]
        }));
        let targets = resolve_targets(&r, &DerivationPolicy::default());
        assert_eq!(targets.message_id.as_deref(), Some("m-content"));
    }

    // Pins the asymmetry: channel/message take the first snapshot, the
    // context server takes the last.
    #[test]
    fn default_scans_first_for_channel_and_last_for_context_server() {
        let r = report(json!({
            "content": {"User": {"id": "u1"}},
            "snapshots": [
                {"content": {"channel_id": "c-first", "message_id": "m-first", "server_id": "s-first"}},
                {"content": {"channel_id": "c-last", "message_id": "m-last", "server_id": "s-last"}}
            ]
        }));
        let targets = resolve_targets(&r, &DerivationPolicy::default());
        assert_eq!(targets.channel_id.as_deref(), Some("c-first"));
        assert_eq!(targets.message_id.as_deref(), Some("m-first"));
        assert_eq!(targets.context_server_id.as_deref(), Some("s-last"));

        let actions = derive_actions(&r, &DerivationPolicy::default());
        assert_eq!(
            action(&actions, ActionKind::KickMember).path.as_deref(),
            Some("/servers/s-last/members/u1")
        );
    }

    #[test]
    fn context_server_scan_can_take_first() {
        let r = report(json!({
            "snapshots": [
                {"content": {"server_id": "s-first"}},
                {"content": {}},
                {"content": {"server_id": "s-last"}}
            ]
        }));
        let policy = DerivationPolicy {
            context_server: ScanPolicy::FirstMatch,
            ..DerivationPolicy::default()
        };
        let targets = resolve_targets(&r, &policy);
        assert_eq!(targets.context_server_id.as_deref(), Some("s-first"));
    }

    #[test]
    fn server_report_enables_remove_server() {
        let r = report(json!({"content": {"Server": {"id": "s1"}}}));
        let actions = derive_actions(&r, &DerivationPolicy::default());
        let remove = action(&actions, ActionKind::RemoveServer);
        assert!(remove.enabled);
        assert_eq!(remove.path.as_deref(), Some("/servers/s1"));
    }

    #[test]
    fn server_id_from_typed_target() {
        let typed = report(json!({"type": "server", "target_id": "s2"}));
        let targets = resolve_targets(&typed, &DerivationPolicy::default());
        assert_eq!(targets.server_id.as_deref(), Some("s2"));

        let untyped = report(json!({"type": "message", "target_id": "s2"}));
        let targets = resolve_targets(&untyped, &DerivationPolicy::default());
        assert_eq!(targets.server_id, None);
    }

    #[test]
    fn kick_and_ban_need_user_and_context_server() {
        let user_only = report(json!({"type": "user", "target_id": "u1"}));
        let actions = derive_actions(&user_only, &DerivationPolicy::default());
        assert!(!action(&actions, ActionKind::KickMember).enabled);
        assert!(!action(&actions, ActionKind::BanMember).enabled);

        let both = report(json!({
            "type": "user",
            "target_id": "u1",
            "snapshots": [{"content": {"server_id": "s1"}}]
        }));
        let actions = derive_actions(&both, &DerivationPolicy::default());
        let kick = action(&actions, ActionKind::KickMember);
        let ban = action(&actions, ActionKind::BanMember);
        assert_eq!(kick.method, Some(HttpVerb::Delete));
        assert_eq!(kick.path.as_deref(), Some("/servers/s1/members/u1"));
        assert_eq!(ban.method, Some(HttpVerb::Put));
        assert_eq!(ban.path.as_deref(), Some("/servers/s1/bans/u1"));
    }

    #[test]
    fn verbs_parse_case_insensitively() {
        assert_eq!("delete".parse::<HttpVerb>().unwrap(), HttpVerb::Delete);
        assert_eq!("Put".parse::<HttpVerb>().unwrap(), HttpVerb::Put);
        assert_eq!("POST".parse::<HttpVerb>().unwrap(), HttpVerb::Post);

        let err = "patch".parse::<HttpVerb>().unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedMethod);
        assert!(err.to_string().contains("unsupported method"));
    }

    #[test]
    fn scan_policy_parses() {
        assert_eq!("first".parse::<ScanPolicy>().unwrap(), ScanPolicy::FirstMatch);
        assert_eq!(" LAST ".parse::<ScanPolicy>().unwrap(), ScanPolicy::LastMatch);
        assert!("middle".parse::<ScanPolicy>().is_err());
    }
}
