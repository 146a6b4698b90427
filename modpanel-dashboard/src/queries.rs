use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use metrics::counter;

use modpanel_shared::clients::ModerationApi;
use modpanel_shared::types::list_items;

use crate::models::FromListItem;

pub const REPORTS_PATH: &str = "/safety/reports";
pub const STRIKES_PATH: &str = "/safety/strikes";

/// A refetchable list backed by one GET endpoint.
///
/// Fetch failures never escape: a missing endpoint, an error status or an
/// unexpected body all leave the list empty.
pub struct ListQuery<T> {
    resource: &'static str,
    path: &'static str,
    items: RwLock<Vec<T>>,
    loaded: AtomicBool,
}

impl<T: FromListItem + Clone> ListQuery<T> {
    pub fn new(resource: &'static str, path: &'static str) -> Self {
        Self {
            resource,
            path,
            items: RwLock::new(Vec::new()),
            loaded: AtomicBool::new(false),
        }
    }

    pub async fn fetch<A: ModerationApi + ?Sized>(&self, api: &A) -> usize {
        let (raw, outcome) = match api.get(self.path).await {
            Ok(body) => match list_items(body) {
                Some(items) => (items, "ok"),
                None => {
                    tracing::warn!(resource = self.resource, path = self.path, "unexpected list body, treating as empty");
                    (Vec::new(), "malformed")
                }
            },
            Err(e) if e.is_not_found() => {
                tracing::debug!(resource = self.resource, path = self.path, "endpoint not available");
                (Vec::new(), "missing")
            }
            Err(e) => {
                tracing::warn!(resource = self.resource, error = %e, "fetch failed, showing empty list");
                (Vec::new(), "error")
            }
        };

        counter!("modpanel_fetch_total", "resource" => self.resource, "outcome" => outcome).increment(1);

        let mut parsed: Vec<T> = raw.into_iter().map(T::from_item).collect();
        disambiguate_keys(&mut parsed);
        let count = parsed.len();

        *self.items.write().unwrap_or_else(|e| e.into_inner()) = parsed;
        self.loaded.store(true, Ordering::Release);

        tracing::debug!(resource = self.resource, count, "list refreshed");
        count
    }

    pub fn items(&self) -> Vec<T> {
        self.items.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn keys(&self) -> HashSet<String> {
        self.items
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|item| item.key().to_string())
            .collect()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }
}

/// Identical id-less items hash to the same key; later copies get `~2`,
/// `~3` and so on.
fn disambiguate_keys<T: FromListItem>(items: &mut [T]) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for item in items.iter_mut() {
        let count = seen.entry(item.key().to_string()).or_insert(0);
        *count += 1;
        if *count > 1 {
            let suffix = format!("~{count}");
            item.key_mut().push_str(&suffix);
        }
    }
}
