//! Navigation seam between the session layer and the UI host
//!
//! The host owns the page stack; this layer only describes transitions. Uses
//! `Pin<Box<dyn Future>>` return types for dyn-compatibility
//! (`Arc<dyn Navigator>`).

use std::future::Future;
use std::pin::Pin;

/// A navigable screen: path plus query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl Destination {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(path: impl Into<String>, params: Vec<(String, String)>) -> Self {
        Self {
            path: path.into(),
            params,
        }
    }

    /// Render as a route URL: `path` or `path?name=value&...`.
    pub fn to_url(&self) -> String {
        if self.params.is_empty() {
            return self.path.clone();
        }
        let query: Vec<String> = self
            .params
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        format!("{}?{}", self.path, query.join("&"))
    }
}

/// How a transition manipulates the page stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// Stack a new screen on top
    Push,
    /// Replace the current screen
    Replace,
    /// Switch to a top-level tab screen
    SwitchTab,
    /// Replace the entire stack
    Relaunch,
}

/// Implemented by the UI host.
pub trait Navigator: Send + Sync {
    /// The screen currently on top of the stack, if any.
    fn current_route(&self) -> Option<Destination>;

    /// Whether `path` is a top-level tab destination.
    fn is_tab_route(&self, path: &str) -> bool;

    /// Perform a transition. The error string is the host's failure message.
    fn transition(
        &self,
        kind: TransitionKind,
        destination: &Destination,
    ) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + '_>>;
}
