//! Single-flight navigation guard
//!
//! At most one page transition may be in flight; a second request while one
//! is pending is rejected, never queued. Every transition runs under a fixed
//! timeout after which the in-flight flag is forcibly cleared so a hung host
//! transition cannot block navigation forever. The guard's flag is the sole
//! arbiter of navigation concurrency — no component bypasses it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::error::NavError;
use crate::router::{Destination, Navigator, TransitionKind};

/// Default per-transition timeout.
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Serializes all page transitions through one in-flight flag.
pub struct NavigationGuard {
    navigator: Arc<dyn Navigator>,
    in_flight: AtomicBool,
    timeout: Duration,
    login_path: String,
}

impl NavigationGuard {
    pub fn new(navigator: Arc<dyn Navigator>, login_path: impl Into<String>) -> Self {
        Self::with_timeout(navigator, login_path, NAVIGATION_TIMEOUT)
    }

    pub fn with_timeout(
        navigator: Arc<dyn Navigator>,
        login_path: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            navigator,
            in_flight: AtomicBool::new(false),
            timeout,
            login_path: login_path.into(),
        }
    }

    /// The host navigator behind this guard.
    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Perform a guarded transition.
    ///
    /// Already being at the target resolves without a transition. The login
    /// destination always replaces the whole stack, so back navigation
    /// cannot return to a stale authenticated screen. A concurrent caller
    /// gets `NavError::InFlight`; a transition exceeding the timeout fails
    /// with `NavError::Timeout` and unblocks subsequent attempts.
    pub async fn navigate(
        &self,
        kind: TransitionKind,
        destination: &Destination,
    ) -> Result<(), NavError> {
        if let Some(current) = self.navigator.current_route() {
            if current.path == destination.path {
                debug!(path = %destination.path, "already at target, skipping navigation");
                return Ok(());
            }
        }

        let kind = if destination.path == self.login_path {
            TransitionKind::Relaunch
        } else {
            kind
        };

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(path = %destination.path, "navigation already in progress, rejecting");
            return Err(NavError::InFlight);
        }

        let result =
            tokio::time::timeout(self.timeout, self.navigator.transition(kind, destination)).await;
        self.in_flight.store(false, Ordering::Release);

        match result {
            Ok(Ok(())) => {
                debug!(path = %destination.path, ?kind, "navigation complete");
                Ok(())
            }
            Ok(Err(message)) => {
                error!(path = %destination.path, error = %message, "navigation failed");
                Err(NavError::Transition(message))
            }
            Err(_) => {
                error!(
                    path = %destination.path,
                    timeout_secs = self.timeout.as_secs(),
                    "navigation timed out"
                );
                Err(NavError::Timeout {
                    path: destination.path.clone(),
                    timeout_secs: self.timeout.as_secs(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestNavigator;

    const LOGIN: &str = "/login";

    #[tokio::test]
    async fn concurrent_navigation_is_rejected_not_queued() {
        let navigator = TestNavigator::slow(Duration::from_millis(50));
        let guard = NavigationGuard::new(navigator.clone(), LOGIN);

        let dest_first = Destination::new("/bill-detail");
        let dest_second = Destination::new("/user-budget");
        let first = guard.navigate(TransitionKind::Push, &dest_first);
        let second = guard.navigate(TransitionKind::Push, &dest_second);
        let (r1, r2) = tokio::join!(first, second);

        let results = [r1, r2];
        assert_eq!(
            results.iter().filter(|r| r.is_ok()).count(),
            1,
            "exactly one navigation wins"
        );
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(NavError::InFlight))),
            "the loser must be rejected with an in-progress error"
        );
        assert_eq!(
            navigator.transition_count(),
            1,
            "the underlying transition must run once"
        );
    }

    #[tokio::test]
    async fn timeout_clears_the_flag_and_unblocks_later_attempts() {
        let navigator = TestNavigator::slow(Duration::from_secs(30));
        let guard =
            NavigationGuard::with_timeout(navigator.clone(), LOGIN, Duration::from_millis(50));

        let result = guard
            .navigate(TransitionKind::Push, &Destination::new("/chat"))
            .await;
        assert!(matches!(result, Err(NavError::Timeout { .. })));

        // The flag must be clear: the next attempt times out on its own
        // instead of being rejected as in-flight
        let result = guard
            .navigate(TransitionKind::Push, &Destination::new("/chat"))
            .await;
        assert!(matches!(result, Err(NavError::Timeout { .. })));
    }

    #[tokio::test]
    async fn already_at_target_short_circuits() {
        let navigator = TestNavigator::new();
        navigator.set_current(Destination::new("/bills"));
        let guard = NavigationGuard::new(navigator.clone(), LOGIN);

        let result = guard
            .navigate(TransitionKind::Push, &Destination::new("/bills"))
            .await;
        assert!(result.is_ok());
        assert_eq!(navigator.transition_count(), 0);
    }

    #[tokio::test]
    async fn login_destination_forces_a_full_stack_replacement() {
        let navigator = TestNavigator::new();
        let guard = NavigationGuard::new(navigator.clone(), LOGIN);

        guard
            .navigate(TransitionKind::Push, &Destination::new(LOGIN))
            .await
            .unwrap();

        let (kind, dest) = navigator.last_transition().unwrap();
        assert_eq!(kind, TransitionKind::Relaunch);
        assert_eq!(dest.path, LOGIN);
    }

    #[tokio::test]
    async fn host_failure_maps_to_transition_error() {
        let navigator = TestNavigator::new();
        navigator.fail_next("page not registered");
        let guard = NavigationGuard::new(navigator.clone(), LOGIN);

        let result = guard
            .navigate(TransitionKind::Push, &Destination::new("/missing"))
            .await;
        match result {
            Err(NavError::Transition(message)) => assert_eq!(message, "page not registered"),
            other => panic!("expected Transition error, got {other:?}"),
        }

        // Failure must release the flag
        let result = guard
            .navigate(TransitionKind::Push, &Destination::new("/bills"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn sequential_navigations_all_run() {
        let navigator = TestNavigator::new();
        let guard = NavigationGuard::new(navigator.clone(), LOGIN);

        for path in ["/bills", "/chat", "/user-budget"] {
            guard
                .navigate(TransitionKind::Push, &Destination::new(path))
                .await
                .unwrap();
        }
        assert_eq!(navigator.transition_count(), 3);
    }
}
