use std::str::FromStr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::AppError;

/// How log lines are written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines with file and line number.
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// `MODPANEL_LOG_FORMAT` when it is set and valid, else JSON when
    /// `MODPANEL_ENV=production`, else pretty.
    pub fn from_env() -> Self {
        let format = std::env::var("MODPANEL_LOG_FORMAT").ok();
        let env = std::env::var("MODPANEL_ENV").ok();
        Self::resolve(format.as_deref(), env.as_deref())
    }

    fn resolve(format: Option<&str>, env: Option<&str>) -> Self {
        if let Some(parsed) = format.and_then(|f| f.parse().ok()) {
            return parsed;
        }
        match env {
            Some("production") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(AppError::Validation(format!("unknown log format '{other}'"))),
        }
    }
}

/// Filter used when `RUST_LOG` is unset: the binary's own crate and the
/// shared crate at debug, everything else at info.
pub fn default_directives(service_name: &str) -> String {
    let crate_target = service_name.replace('-', "_");
    format!("info,{crate_target}=debug,modpanel_shared=debug")
}

/// Installs the global subscriber. Output goes to stderr so that whatever the
/// binary renders on stdout stays readable.
pub fn init_tracing(service_name: &str) {
    let format = LogFormat::from_env();
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(service_name)));

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init(),
    }

    tracing::info!(service = service_name, ?format, "tracing initialized");
}
