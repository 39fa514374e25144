use serde::{Deserialize, Serialize};

/// Normalized name of the cross-organization administrator role.
pub const SUPER_ADMIN_ROLE: &str = "super admin";

/// Normalized name of the organization administrator role.
pub const ADMIN_ROLE: &str = "admin";

/// Role recognized for scoping decisions.
///
/// Role names arrive as free text from the login response (`" Admin "`,
/// `"SUPER ADMIN"`, ...). Anything that does not normalize to one of the two
/// administrator roles is carried as `Other` and grants no elevated scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    OrgAdmin,
    Other(String),
}

/// Trim, lowercase and collapse inner whitespace runs to a single space.
pub fn normalize_role_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

impl Role {
    /// Total parse; never fails.
    pub fn parse(name: &str) -> Self {
        let normalized = normalize_role_name(name);
        match normalized.as_str() {
            SUPER_ADMIN_ROLE => Role::SuperAdmin,
            ADMIN_ROLE => Role::OrgAdmin,
            _ => Role::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::SuperAdmin => SUPER_ADMIN_ROLE,
            Role::OrgAdmin => ADMIN_ROLE,
            Role::Other(name) => name,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    pub fn is_org_admin(&self) -> bool {
        matches!(self, Role::OrgAdmin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(Role::parse("  Super Admin  "), Role::SuperAdmin);
        assert_eq!(Role::parse("SUPER\t  admin"), Role::SuperAdmin);
        assert_eq!(Role::parse(" Admin "), Role::OrgAdmin);
        assert_eq!(Role::parse("ADMIN"), Role::OrgAdmin);
    }

    #[test]
    fn unknown_roles_are_kept_normalized() {
        assert_eq!(Role::parse(" Trainer "), Role::Other("trainer".to_string()));
        assert_eq!(Role::parse(""), Role::Other(String::new()));
        assert_eq!(Role::parse("superadmin"), Role::Other("superadmin".to_string()));
    }

    #[test]
    fn display_uses_normalized_names() {
        assert_eq!(Role::SuperAdmin.to_string(), SUPER_ADMIN_ROLE);
        assert_eq!(Role::parse("Coach").to_string(), "coach");
    }
}
