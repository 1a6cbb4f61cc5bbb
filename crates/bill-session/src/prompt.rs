//! User prompt seam
//!
//! The UI host renders toasts and confirm dialogs; the session layer only
//! decides when they appear and what happens on each choice.

use std::future::Future;
use std::pin::Pin;

/// Implemented by the UI host.
pub trait UiPrompt: Send + Sync {
    /// Show a transient notice.
    fn toast(&self, message: &str);

    /// Show a confirm/cancel dialog; resolves with the user's choice.
    fn confirm(
        &self,
        title: &str,
        content: &str,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Options for the login prompt flow.
pub struct PromptOptions {
    pub title: String,
    pub content: String,
    /// Runs after the guarded navigation to login settles successfully
    pub on_confirm: Option<Box<dyn FnOnce() + Send>>,
    /// Runs when the user declines the prompt
    pub on_cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            title: "Notice".to_string(),
            content: "Please log in to use this feature".to_string(),
            on_confirm: None,
            on_cancel: None,
        }
    }
}

impl PromptOptions {
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn on_confirm(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_confirm = Some(Box::new(callback));
        self
    }

    pub fn on_cancel(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_cancel = Some(Box::new(callback));
        self
    }
}
