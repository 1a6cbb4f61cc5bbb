//! Session coordination: login prompts, redirects and finalization
//!
//! One coordinator owns every path into and out of the authenticated state:
//! the login prompt flow, the redirect when a request discovers a missing or
//! rejected credential, the intended-destination bookkeeping that resumes
//! the user's flow after login, and logout. It also implements the
//! pipeline's unauthorized hook, so concurrent 401s collapse into a single
//! teardown.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use bill_api::SessionHooks;
use bill_auth::TokenStore;
use common::{DurableKv, Secret};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{NavError, SessionError};
use crate::guard::NavigationGuard;
use crate::profile;
use crate::prompt::{PromptOptions, UiPrompt};
use crate::router::{Destination, TransitionKind};

/// Cooldown after a login redirect before another may start. Prevents
/// redirect storms when several requests discover the dead session together.
pub const REDIRECT_COOLDOWN: Duration = Duration::from_secs(1);

/// The two fixed destinations the session layer needs to know.
#[derive(Debug, Clone)]
pub struct SessionRoutes {
    pub login: String,
    /// Default landing destination when no intended destination survives
    pub home: String,
}

impl Default for SessionRoutes {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            home: "/bills".to_string(),
        }
    }
}

/// Coordinates session state with navigation.
pub struct SessionCoordinator {
    tokens: Arc<TokenStore>,
    guard: Arc<NavigationGuard>,
    prompt: Arc<dyn UiPrompt>,
    routes: SessionRoutes,
    storage: Arc<DurableKv>,
    intended: Mutex<Option<Destination>>,
    /// Armed when a login redirect starts; holds the arm/completion instant
    redirect_gate: Mutex<Option<Instant>>,
}

impl SessionCoordinator {
    pub fn new(
        tokens: Arc<TokenStore>,
        guard: Arc<NavigationGuard>,
        prompt: Arc<dyn UiPrompt>,
        routes: SessionRoutes,
        storage: Arc<DurableKv>,
    ) -> Self {
        Self {
            tokens,
            guard,
            prompt,
            routes,
            storage,
            intended: Mutex::new(None),
            redirect_gate: Mutex::new(None),
        }
    }

    /// Whether a valid credential is currently held.
    pub async fn is_logged_in(&self) -> bool {
        self.tokens.get_valid().await.is_some()
    }

    /// Gate an action on the login state, prompting when logged out.
    ///
    /// Returns `true` when already logged in — the caller may proceed.
    /// Otherwise returns `false` and, unless a login redirect is already in
    /// flight, runs the confirm-prompt flow in the background: confirm
    /// navigates to login (then `on_confirm`), cancel runs `on_cancel`.
    /// Callers must not proceed on `false`.
    pub async fn check_login_with_prompt(&self, options: PromptOptions) -> bool {
        if self.is_logged_in().await {
            return true;
        }

        if self.redirect_pending() {
            debug!("login redirect already in flight, ignoring prompt request");
            return false;
        }

        let prompt = self.prompt.clone();
        let guard = self.guard.clone();
        let login_path = self.routes.login.clone();
        tokio::spawn(async move {
            let PromptOptions {
                title,
                content,
                on_confirm,
                on_cancel,
            } = options;

            if prompt.confirm(&title, &content).await {
                let login = Destination::new(&login_path);
                match guard.navigate(TransitionKind::Push, &login).await {
                    Ok(()) => {
                        if let Some(callback) = on_confirm {
                            callback();
                        }
                    }
                    Err(e) => error!(error = %e, "failed to open the login screen"),
                }
            } else if let Some(callback) = on_cancel {
                callback();
            }
        });

        false
    }

    /// Idempotent redirect to the login screen.
    ///
    /// Gated by the redirect cooldown and the navigation guard; concurrent
    /// and rapid repeated calls produce at most one transition. Records the
    /// current screen as the intended destination first.
    pub async fn redirect_to_login(&self) {
        if !self.try_arm_redirect() {
            debug!("login redirect already in flight or cooling down");
            return;
        }
        self.record_current_as_intended();
        self.finish_redirect().await;
    }

    /// Capture a destination to resume after login.
    ///
    /// The login screen itself is never recorded.
    pub fn record_intended_destination(&self, path: &str, params: Vec<(String, String)>) {
        if path == self.routes.login {
            return;
        }
        *self.intended.lock().expect("intended destination poisoned") =
            Some(Destination::with_params(path, params));
    }

    /// Capture the current screen as the intended destination.
    ///
    /// Keeps any earlier record when the current screen has no identity, so
    /// a redirect from a transient state still resumes somewhere sensible.
    pub fn record_current_as_intended(&self) {
        match self.guard.navigator().current_route() {
            Some(current) if current.path != self.routes.login => {
                debug!(path = %current.path, "recorded intended destination");
                *self.intended.lock().expect("intended destination poisoned") = Some(current);
            }
            Some(_) => {}
            None => {
                let mut intended = self.intended.lock().expect("intended destination poisoned");
                if intended.is_none() {
                    *intended = Some(Destination::new(&self.routes.home));
                }
            }
        }
    }

    /// Finalize a successful login.
    ///
    /// The payload must carry a usable `token`; failures surface a
    /// user-visible error. On success the credential is stored, the intended
    /// destination is consumed, and exactly one final navigation runs: the
    /// tab-switch transition for tab destinations (path only), a stack
    /// replacement otherwise, falling back to the home tab on failure.
    pub async fn complete_login(&self, payload: &Value) -> Result<(), SessionError> {
        let Some(token) = payload.get("token").and_then(Value::as_str) else {
            error!("login response carries no token");
            self.prompt.toast("login data invalid");
            return Err(SessionError::InvalidLoginPayload);
        };
        let credential = Secret::new(token);
        debug!(token_len = credential.len(), "storing login credential");

        if !self.tokens.set(credential.expose()).await {
            error!("login token failed validation");
            self.prompt.toast("login data format invalid");
            return Err(SessionError::TokenRejected);
        }

        // Consume the intended destination: read once, then cleared
        let intended = self
            .intended
            .lock()
            .expect("intended destination poisoned")
            .take();
        let destination = match intended {
            Some(dest) if dest.path != self.routes.login => dest,
            _ => Destination::new(&self.routes.home),
        };

        let (kind, target) = if self.guard.navigator().is_tab_route(&destination.path) {
            // Tab screens take the tab-switch transition, path only
            (TransitionKind::SwitchTab, Destination::new(&destination.path))
        } else {
            (TransitionKind::Replace, destination)
        };

        if let Err(e) = self.guard.navigate(kind, &target).await {
            warn!(error = %e, path = %target.path, "post-login navigation failed, falling back to home");
            let home = Destination::new(&self.routes.home);
            self.guard
                .navigate(TransitionKind::SwitchTab, &home)
                .await?;
        }

        info!("login complete");
        Ok(())
    }

    /// Clear the session: credential, profile fields, and a parting toast.
    pub async fn logout(&self) {
        self.tokens.clear().await;
        profile::clear(&self.storage).await;
        self.prompt.toast("signed out");
        info!("logged out");
    }

    /// Whether a login redirect is in flight or cooling down.
    fn redirect_pending(&self) -> bool {
        matches!(
            *self.redirect_gate.lock().expect("redirect gate poisoned"),
            Some(armed) if armed.elapsed() < REDIRECT_COOLDOWN
        )
    }

    /// Arm the redirect gate; only the first caller in a window wins.
    fn try_arm_redirect(&self) -> bool {
        let mut gate = self.redirect_gate.lock().expect("redirect gate poisoned");
        match *gate {
            Some(armed) if armed.elapsed() < REDIRECT_COOLDOWN => false,
            _ => {
                *gate = Some(Instant::now());
                true
            }
        }
    }

    async fn finish_redirect(&self) {
        let login = Destination::new(&self.routes.login);
        let result = self.guard.navigate(TransitionKind::Relaunch, &login).await;

        // Completion restarts the cooldown window
        *self.redirect_gate.lock().expect("redirect gate poisoned") = Some(Instant::now());

        match result {
            Ok(()) => debug!("redirected to login"),
            Err(NavError::InFlight) => debug!("another navigation owns the transition"),
            Err(e) => warn!(error = %e, "login redirect failed"),
        }
    }
}

impl SessionHooks for SessionCoordinator {
    /// Unauthorized-session teardown, invoked by the pipeline on HTTP 401.
    ///
    /// Clears the credential, then — once per cooldown window no matter how
    /// many requests fail together — surfaces the session-expired notice,
    /// records the current screen and redirects to login.
    fn on_unauthorized(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            warn!("server rejected the session credential");
            self.tokens.clear().await;

            if !self.try_arm_redirect() {
                debug!("unauthorized teardown already in progress");
                return;
            }
            self.prompt.toast("session expired, please log in again");
            self.record_current_as_intended();
            self.finish_redirect().await;
        })
    }
}
