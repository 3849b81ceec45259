//! Delivery of finished exports.
//!
//! Every user action maps to an ordered [`DeliveryPlan`]: the preferred
//! strategy first, then its fallback. Strategies are tried in order until
//! one succeeds, and the [`DeliveryReport`] records each attempt plus the
//! status line shown to the user.
//!
//! | Action  | Strategies                                   |
//! |---------|----------------------------------------------|
//! | Save    | save dialog, then direct download            |
//! | Copy    | clipboard, then manual selection             |
//! | Preview | preview window (HTML exports only)           |

#[cfg(target_arch = "wasm32")]
mod browser;
#[cfg(not(target_arch = "wasm32"))]
mod native;

#[cfg(target_arch = "wasm32")]
pub use browser::{BrowserDelivery, deliver_in_browser};
#[cfg(not(target_arch = "wasm32"))]
pub use native::NativeDelivery;

use thiserror::Error;

use crate::format::ExportOutput;

/// Errors from a single delivery attempt.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The user dismissed the dialog
    #[error("Cancelled")]
    Cancelled,

    /// The platform lacks this capability
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// The platform refused the request
    #[error("Blocked: {0}")]
    Blocked(String),

    /// Writing the file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryAction {
    /// Store the export as a file
    Save,
    /// Put the export text on the clipboard
    Copy,
    /// Show the export in a new window
    Preview,
}

/// One way of delivering an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStrategy {
    /// Platform save dialog
    SavePicker,
    /// Write the file without asking
    Download,
    /// Asynchronous clipboard write
    Clipboard,
    /// Present the text for the user to copy by hand
    ManualCopy,
    /// Open the export in a new window
    Preview,
}

impl DeliveryStrategy {
    /// Status line after this strategy succeeded. `location` names the file.
    pub fn success_status(self, location: &str) -> String {
        match self {
            DeliveryStrategy::SavePicker => format!("Saved {}", location),
            DeliveryStrategy::Download => format!("Downloaded {}", location),
            DeliveryStrategy::Clipboard => "Copied to clipboard".to_string(),
            DeliveryStrategy::ManualCopy => "Copy blocked: select the text manually".to_string(),
            DeliveryStrategy::Preview => "Preview opened".to_string(),
        }
    }
}

/// Status when preview is requested for a non-HTML export.
pub const PREVIEW_UNSUPPORTED: &str = "Preview is only available for HTML exports";

/// Ordered strategies for one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryPlan {
    /// The requested action.
    pub action: DeliveryAction,
    /// Strategies in the order they are tried.
    pub strategies: Vec<DeliveryStrategy>,
}

impl DeliveryPlan {
    /// Plan for `action` on an export of `content_type`.
    ///
    /// Preview of anything but HTML yields an empty plan.
    pub fn for_action(action: DeliveryAction, content_type: &str) -> Self {
        let strategies = match action {
            DeliveryAction::Save => vec![DeliveryStrategy::SavePicker, DeliveryStrategy::Download],
            DeliveryAction::Copy => vec![DeliveryStrategy::Clipboard, DeliveryStrategy::ManualCopy],
            DeliveryAction::Preview if content_type == "text/html" => {
                vec![DeliveryStrategy::Preview]
            }
            DeliveryAction::Preview => Vec::new(),
        };
        Self { action, strategies }
    }

    /// Drop `strategy` from the plan.
    pub fn without(mut self, strategy: DeliveryStrategy) -> Self {
        self.strategies.retain(|&s| s != strategy);
        self
    }
}

/// Outcome of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryAttempt {
    /// Strategy tried.
    pub strategy: DeliveryStrategy,
    /// `None` on success, otherwise the failure.
    pub error: Option<String>,
}

/// Result of running a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// The requested action.
    pub action: DeliveryAction,
    /// Attempts in order.
    pub attempts: Vec<DeliveryAttempt>,
    /// Strategy that succeeded, if any.
    pub delivered_by: Option<DeliveryStrategy>,
    /// Where the export went (file name or path), if applicable.
    pub location: Option<String>,
    /// Status line for the user.
    pub status: String,
}

impl DeliveryReport {
    /// Start a report for `plan`.
    pub fn new(plan: &DeliveryPlan) -> Self {
        let status = if plan.strategies.is_empty() && plan.action == DeliveryAction::Preview {
            PREVIEW_UNSUPPORTED.to_string()
        } else {
            "Export not delivered".to_string()
        };
        Self {
            action: plan.action,
            attempts: Vec::new(),
            delivered_by: None,
            location: None,
            status,
        }
    }

    /// Record a successful attempt.
    pub fn succeeded(&mut self, strategy: DeliveryStrategy, location: String) {
        self.attempts.push(DeliveryAttempt {
            strategy,
            error: None,
        });
        self.status = strategy.success_status(&location);
        self.delivered_by = Some(strategy);
        self.location = Some(location);
    }

    /// Record a failed attempt.
    pub fn failed(&mut self, strategy: DeliveryStrategy, error: &DeliveryError) {
        log::debug!("Delivery via {:?} failed: {}", strategy, error);
        self.attempts.push(DeliveryAttempt {
            strategy,
            error: Some(error.to_string()),
        });
        self.status = match error {
            DeliveryError::Cancelled => "Export cancelled".to_string(),
            other => format!("Export not delivered: {}", other),
        };
    }

    /// Whether any strategy succeeded.
    pub fn is_delivered(&self) -> bool {
        self.delivered_by.is_some()
    }
}

/// A platform able to carry out delivery strategies synchronously.
pub trait DeliveryTarget {
    /// Try one strategy. On success returns the location to report.
    fn attempt(
        &mut self,
        strategy: DeliveryStrategy,
        output: &ExportOutput,
    ) -> Result<String, DeliveryError>;
}

/// Run `plan` against `target`, stopping at the first success.
///
/// A cancelled dialog stops the plan; other failures fall through to the
/// next strategy.
pub fn deliver<T: DeliveryTarget + ?Sized>(
    target: &mut T,
    plan: &DeliveryPlan,
    output: &ExportOutput,
) -> DeliveryReport {
    let mut report = DeliveryReport::new(plan);
    for &strategy in &plan.strategies {
        match target.attempt(strategy, output) {
            Ok(location) => {
                report.succeeded(strategy, location);
                break;
            }
            Err(DeliveryError::Cancelled) => {
                report.failed(strategy, &DeliveryError::Cancelled);
                break;
            }
            Err(e) => report.failed(strategy, &e),
        }
    }
    log::info!("{}", report.status);
    report
}
