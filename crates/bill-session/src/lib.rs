//! Session and navigation coordination for the bill-tracking client
//!
//! Sits between the request pipeline and the UI host: decides when to prompt
//! or redirect to login, serializes page transitions so rapid taps and
//! concurrent teardowns cannot stack navigations, remembers where the user
//! was headed before authentication interrupted them, and finalizes session
//! state after a successful login.
//!
//! The UI host implements two seams: `Navigator` (page transitions) and
//! `UiPrompt` (toasts and confirm dialogs). Everything else is wired by
//! `SessionContext`, the injectable application root.

pub mod context;
pub mod coordinator;
pub mod error;
pub mod guard;
pub mod profile;
pub mod prompt;
pub mod router;

#[cfg(test)]
pub(crate) mod testutil;

pub use context::SessionContext;
pub use coordinator::{SessionCoordinator, SessionRoutes};
pub use error::{NavError, SessionError};
pub use guard::NavigationGuard;
pub use profile::UserProfile;
pub use prompt::{PromptOptions, UiPrompt};
pub use router::{Destination, Navigator, TransitionKind};
