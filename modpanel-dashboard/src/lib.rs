pub mod actions;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod mutations;
pub mod notify;
pub mod panel;
pub mod queries;
pub mod render;

#[cfg(test)]
mod test_support;

pub use actions::{derive_actions, Action, ActionKind, DerivationPolicy, ScanPolicy};
pub use dashboard::Dashboard;
pub use models::{Report, ReportContent, Snapshot, Strike};
