//! Scope evaluation: which rows of a resource an actor may see.
//!
//! - No IO
//! - No panics
//! - Never errors: an actor that cannot be scoped gets a fail-closed decision

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use coachdesk_core::{DomainError, OrganizationId, OwnershipKind, ResourceType};

use crate::{ActorContext, Role};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeMode {
    /// Every row is visible.
    Global,
    /// Rows whose own organization key matches.
    Organization,
    /// Rows whose organization is reached through parent rows.
    Derived,
}

/// Outcome of scope evaluation for one (actor, resource) pair.
///
/// `Derived` always carries an organization. `Organization` may carry `None`,
/// which means the actor should have been scoped but has no usable
/// organization: nothing is visible.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeDecision {
    mode: ScopeMode,
    organization_id: Option<OrganizationId>,
}

impl ScopeDecision {
    pub fn global() -> Self {
        Self {
            mode: ScopeMode::Global,
            organization_id: None,
        }
    }

    pub fn organization(organization_id: Option<OrganizationId>) -> Self {
        Self {
            mode: ScopeMode::Organization,
            organization_id,
        }
    }

    pub fn derived(organization_id: OrganizationId) -> Self {
        Self {
            mode: ScopeMode::Derived,
            organization_id: Some(organization_id),
        }
    }

    pub fn mode(&self) -> ScopeMode {
        self.mode
    }

    pub fn organization_id(&self) -> Option<OrganizationId> {
        self.organization_id
    }

    pub fn is_global(&self) -> bool {
        self.mode == ScopeMode::Global
    }

    /// Scoped, but with nothing to scope to.
    pub fn is_fail_closed(&self) -> bool {
        !self.is_global() && self.organization_id.is_none()
    }
}

/// Which organization-sensitive resources organization admins are scoped on.
///
/// The default scopes all of them. Individual resources can be exempted,
/// which makes them globally visible to organization admins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopePolicy {
    unscoped: HashSet<ResourceType>,
}

impl ScopePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exempt(mut self, resource: ResourceType) -> Self {
        self.unscoped.insert(resource);
        self
    }

    /// Build from resource names, e.g. `"invoices, payments"`.
    pub fn from_unscoped_list(list: &str) -> Result<Self, DomainError> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .try_fold(Self::new(), |policy, name| Ok(policy.exempt(name.parse()?)))
    }

    pub fn is_scoped(&self, resource: ResourceType) -> bool {
        resource.is_organization_sensitive() && !self.unscoped.contains(&resource)
    }

    pub fn unscoped(&self) -> impl Iterator<Item = ResourceType> + '_ {
        self.unscoped.iter().copied()
    }
}

/// Evaluate an actor's scope on a resource under the default policy.
pub fn evaluate_scope(actor: &ActorContext, resource: ResourceType) -> ScopeDecision {
    evaluate_scope_with(actor, resource, &ScopePolicy::default())
}

/// Evaluate an actor's scope on a resource.
///
/// Rules, first match wins:
/// 1. super admin: global
/// 2. resource not scoped by `policy`: global
/// 3. org admin with an organization: organization (direct keys) or derived
/// 4. org admin without an organization: organization with `None` (fail closed)
/// 5. anyone else: global
pub fn evaluate_scope_with(
    actor: &ActorContext,
    resource: ResourceType,
    policy: &ScopePolicy,
) -> ScopeDecision {
    let (decision, reason) = decide(&actor.role(), actor.organization_id, resource, policy);

    if decision.is_fail_closed() {
        tracing::warn!(
            resource = %resource,
            email = %actor.email,
            "organization admin has no usable organization id; nothing will be visible"
        );
    } else {
        tracing::debug!(
            resource = %resource,
            mode = ?decision.mode(),
            organization_id = ?decision.organization_id(),
            reason,
            "scope evaluated"
        );
    }

    decision
}

fn decide(
    role: &Role,
    organization_id: Option<OrganizationId>,
    resource: ResourceType,
    policy: &ScopePolicy,
) -> (ScopeDecision, &'static str) {
    if role.is_super_admin() {
        return (ScopeDecision::global(), "super admin sees every organization");
    }

    if !policy.is_scoped(resource) {
        return (ScopeDecision::global(), "resource is not scoped by organization");
    }

    if !role.is_org_admin() {
        return (ScopeDecision::global(), "no elevated role; resource left unfiltered");
    }

    match organization_id {
        Some(org) if resource.ownership() == OwnershipKind::Direct => (
            ScopeDecision::organization(Some(org)),
            "organization admin limited to own organization",
        ),
        Some(org) => (
            ScopeDecision::derived(org),
            "organization admin limited to rows owned through parent records",
        ),
        None => (
            ScopeDecision::organization(None),
            "organization admin without organization id; failing closed",
        ),
    }
}

/// Auditable account of a scope decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeExplanation {
    pub resource: ResourceType,
    pub email: String,
    pub role: String,
    pub decision: ScopeDecision,
    pub fail_closed: bool,
    pub reason: String,
}

/// Explain why an actor gets the scope they get on a resource.
pub fn explain_scope(
    actor: &ActorContext,
    resource: ResourceType,
    policy: &ScopePolicy,
) -> ScopeExplanation {
    let role = actor.role();
    let (decision, reason) = decide(&role, actor.organization_id, resource, policy);
    ScopeExplanation {
        resource,
        email: actor.email.clone(),
        role: role.to_string(),
        decision,
        fail_closed: decision.is_fail_closed(),
        reason: reason.to_string(),
    }
}
