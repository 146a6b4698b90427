use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Builds a model from one element of a list endpoint body.
///
/// Every item carries a row key that stays the same across refetches, so
/// per-row state follows the item rather than its position.
pub trait FromListItem {
    fn from_item(raw: Value) -> Self;
    fn key(&self) -> &str;
    fn key_mut(&mut self) -> &mut String;
}

// --- Report content ---

/// What a report points at, taken from the single nested key of `content`
/// (`{"Message": {"id": ...}}`). Keys are accepted capitalised or lower case.
/// When several keys are present the first of Message, Server, User wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportContent {
    Message { id: Option<String> },
    Server { id: Option<String> },
    User { id: Option<String> },
    Unknown,
}

impl ReportContent {
    pub fn from_value(content: Option<&Value>) -> Self {
        let Some(content) = content.and_then(Value::as_object) else {
            return Self::Unknown;
        };

        if let Some(inner) = variant(content, "Message", "message") {
            return Self::Message { id: string_field(inner, "id") };
        }
        if let Some(inner) = variant(content, "Server", "server") {
            return Self::Server { id: string_field(inner, "id") };
        }
        if let Some(inner) = variant(content, "User", "user") {
            return Self::User { id: string_field(inner, "id") };
        }

        Self::Unknown
    }

    pub fn message_id(&self) -> Option<&str> {
        match self {
            Self::Message { id } => id.as_deref(),
            _ => None,
        }
    }

    pub fn server_id(&self) -> Option<&str> {
        match self {
            Self::Server { id } => id.as_deref(),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::User { id } => id.as_deref(),
            _ => None,
        }
    }
}

fn variant<'a>(content: &'a Map<String, Value>, upper: &str, lower: &str) -> Option<&'a Value> {
    content
        .get(upper)
        .or_else(|| content.get(lower))
        .filter(|v| !v.is_null())
}

/// Non-empty string field. Numbers and other shapes do not count as ids.
fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// --- Snapshot ---

/// Context captured alongside a report. Ids live under the entry's
/// `content` object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub channel_id: Option<String>,
    pub message_id: Option<String>,
    pub server_id: Option<String>,
}

impl Snapshot {
    pub fn from_value(raw: &Value) -> Self {
        let Some(content) = raw.get("content") else {
            return Self::default();
        };
        Self {
            channel_id: string_field(content, "channel_id"),
            message_id: string_field(content, "message_id"),
            server_id: string_field(content, "server_id"),
        }
    }
}

// --- Report ---

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Row key: `_id`, else `id`, else a hash of the raw item.
    pub key: String,
    pub content: ReportContent,
    pub target_id: Option<String>,
    pub target_display: Option<String>,
    pub kind: Option<String>,
    pub created_at: Option<String>,
    /// `additional_context`, else `reason`.
    pub reason: Option<String>,
    pub snapshots: Vec<Snapshot>,
    pub raw: Value,
}

impl Report {
    /// `target_id`, but only when the report's `type` is exactly `kind`.
    pub fn target_if_kind(&self, kind: &str) -> Option<&str> {
        match self.kind.as_deref() {
            Some(k) if k == kind => self.target_id.as_deref(),
            _ => None,
        }
    }

    /// The user a strike would be issued against: the reported user, else
    /// the report target regardless of its type.
    pub fn strike_target(&self) -> Option<&str> {
        self.content.user_id().or(self.target_id.as_deref())
    }
}

impl FromListItem for Report {
    fn from_item(raw: Value) -> Self {
        let snapshots = raw
            .get("snapshots")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().map(Snapshot::from_value).collect())
            .unwrap_or_default();

        Self {
            key: row_key(&raw),
            content: ReportContent::from_value(raw.get("content")),
            target_id: string_field(&raw, "target_id"),
            target_display: string_field(&raw, "target_display"),
            kind: string_field(&raw, "type"),
            created_at: string_field(&raw, "created_at"),
            reason: string_field(&raw, "additional_context").or_else(|| string_field(&raw, "reason")),
            snapshots,
            raw,
        }
    }

    fn key(&self) -> &str {
        &self.key
    }

    fn key_mut(&mut self) -> &mut String {
        &mut self.key
    }
}

// --- Strike ---

#[derive(Debug, Clone, PartialEq)]
pub struct Strike {
    pub key: String,
    /// `user_id`, else `target`.
    pub user_id: Option<String>,
    pub reason: Option<String>,
    pub created_at: Option<String>,
    pub raw: Value,
}

impl FromListItem for Strike {
    fn from_item(raw: Value) -> Self {
        Self {
            key: row_key(&raw),
            user_id: string_field(&raw, "user_id").or_else(|| string_field(&raw, "target")),
            reason: string_field(&raw, "reason"),
            created_at: string_field(&raw, "created_at"),
            raw,
        }
    }

    fn key(&self) -> &str {
        &self.key
    }

    fn key_mut(&mut self) -> &mut String {
        &mut self.key
    }
}

/// `_id`, else `id`, else `#` and the first 12 hex digits of the SHA-256 of
/// the item's JSON.
fn row_key(raw: &Value) -> String {
    string_field(raw, "_id")
        .or_else(|| string_field(raw, "id"))
        .unwrap_or_else(|| content_key(raw))
}

fn content_key(raw: &Value) -> String {
    let digest = Sha256::digest(raw.to_string().as_bytes());
    format!("#{}", &hex::encode(digest)[..12])
}
