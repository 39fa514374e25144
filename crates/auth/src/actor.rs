use serde::{Deserialize, Serialize};

use coachdesk_core::OrganizationId;

use crate::Role;

/// The authenticated actor a scoped read is performed for.
///
/// A snapshot taken from persisted login state; nothing in this workspace
/// mutates it after construction. The default value is the unauthenticated
/// actor: no role, no organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorContext {
    pub email: String,
    pub organization_id: Option<OrganizationId>,
    pub role_name: String,
}

impl ActorContext {
    pub fn new(
        email: impl Into<String>,
        organization_id: Option<OrganizationId>,
        role_name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            organization_id,
            role_name: role_name.into(),
        }
    }

    pub fn role(&self) -> Role {
        Role::parse(&self.role_name)
    }

    pub fn is_authenticated(&self) -> bool {
        !self.email.is_empty()
    }
}
