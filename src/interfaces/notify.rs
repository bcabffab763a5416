use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// Explicit event/error reporting capability injected into the session.
/// Replaces the original's global console-error interception: failures are
/// reported through this seam instead of a process-wide logging hook.
pub trait Notifier: Send + Sync {
    fn notify(&self, severity: Severity, title: &str, message: &str);
}

/// Default notifier that forwards to the tracing subscriber.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, severity: Severity, title: &str, message: &str) {
        match severity {
            Severity::Error => error!(%title, "{message}"),
            Severity::Info | Severity::Success => info!(%title, "{message}"),
        }
    }
}
