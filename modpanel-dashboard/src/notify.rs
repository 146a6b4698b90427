use modpanel_shared::errors::AppError;

/// Where user-facing outcomes go.
pub trait Notifier: Send + Sync {
    fn show_error(&self, error: &AppError);
    fn show_success(&self, message: &str);
}

/// Prints outcomes to stdout next to the rendered panel.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn show_error(&self, error: &AppError) {
        tracing::debug!(code = error.code().code(), error = %error, "error shown");
        println!("✖ {error}");
    }

    fn show_success(&self, message: &str) {
        println!("✔ {message}");
    }
}
