//! `coachdesk-auth` — actor resolution and organization scoping.
//!
//! This crate is intentionally decoupled from HTTP. Apart from the session
//! stores it performs no IO; scope evaluation and filtering are pure.

pub mod actor;
pub mod filter;
pub mod roles;
pub mod scope;
pub mod session;

pub use actor::ActorContext;
pub use filter::{JoinContext, JoinRequirements, apply_scope};
pub use roles::{ADMIN_ROLE, Role, SUPER_ADMIN_ROLE, normalize_role_name};
pub use scope::{
    ScopeDecision, ScopeExplanation, ScopeMode, ScopePolicy, evaluate_scope, evaluate_scope_with,
    explain_scope,
};
pub use session::{
    FileSessionStore, LoginResponse, MemorySessionStore, SessionError, SessionState, SessionStore,
    StoredUser, resolve_actor_context,
};
