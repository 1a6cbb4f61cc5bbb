//! Test doubles for the UI host seams

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::prompt::UiPrompt;
use crate::router::{Destination, Navigator, TransitionKind};

/// Navigator double: counts transitions, records the last one, and can be
/// slowed down or made to fail once.
pub(crate) struct TestNavigator {
    transitions: AtomicUsize,
    last: Mutex<Option<(TransitionKind, Destination)>>,
    current: Mutex<Option<Destination>>,
    tabs: Vec<String>,
    delay: Duration,
    fail_once: Mutex<Option<String>>,
}

impl TestNavigator {
    pub fn new() -> Arc<Self> {
        Self::build(Duration::ZERO, Vec::new())
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Self::build(delay, Vec::new())
    }

    pub fn with_tabs(tabs: &[&str]) -> Arc<Self> {
        Self::build(Duration::ZERO, tabs.iter().map(|t| t.to_string()).collect())
    }

    fn build(delay: Duration, tabs: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            transitions: AtomicUsize::new(0),
            last: Mutex::new(None),
            current: Mutex::new(None),
            tabs,
            delay,
            fail_once: Mutex::new(None),
        })
    }

    pub fn set_current(&self, destination: Destination) {
        *self.current.lock().unwrap() = Some(destination);
    }

    pub fn fail_next(&self, message: &str) {
        *self.fail_once.lock().unwrap() = Some(message.to_string());
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.load(Ordering::SeqCst)
    }

    pub fn last_transition(&self) -> Option<(TransitionKind, Destination)> {
        self.last.lock().unwrap().clone()
    }
}

impl Navigator for TestNavigator {
    fn current_route(&self) -> Option<Destination> {
        self.current.lock().unwrap().clone()
    }

    fn is_tab_route(&self, path: &str) -> bool {
        self.tabs.iter().any(|tab| tab == path)
    }

    fn transition(
        &self,
        kind: TransitionKind,
        destination: &Destination,
    ) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + '_>> {
        let destination = destination.clone();
        Box::pin(async move {
            self.transitions.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if let Some(message) = self.fail_once.lock().unwrap().take() {
                return Err(message);
            }
            *self.current.lock().unwrap() = Some(destination.clone());
            *self.last.lock().unwrap() = Some((kind, destination));
            Ok(())
        })
    }
}

/// Prompt double: records toasts and answers confirms with a preset choice.
pub(crate) struct TestPrompt {
    pub toasts: Mutex<Vec<String>>,
    pub confirm_answer: AtomicBool,
    pub confirms: AtomicUsize,
}

impl TestPrompt {
    pub fn new(confirm_answer: bool) -> Arc<Self> {
        Arc::new(Self {
            toasts: Mutex::new(Vec::new()),
            confirm_answer: AtomicBool::new(confirm_answer),
            confirms: AtomicUsize::new(0),
        })
    }

    pub fn toast_count(&self) -> usize {
        self.toasts.lock().unwrap().len()
    }

    pub fn confirm_count(&self) -> usize {
        self.confirms.load(Ordering::SeqCst)
    }
}

impl UiPrompt for TestPrompt {
    fn toast(&self, message: &str) {
        self.toasts.lock().unwrap().push(message.to_string());
    }

    fn confirm(
        &self,
        _title: &str,
        _content: &str,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        self.confirms.fetch_add(1, Ordering::SeqCst);
        let answer = self.confirm_answer.load(Ordering::SeqCst);
        Box::pin(async move { answer })
    }
}

/// Poll a condition until it holds or a short deadline passes.
pub(crate) async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within the deadline");
}
