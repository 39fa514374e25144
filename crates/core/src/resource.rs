//! Resource types served by the backend and how each one is owned.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Every collection the console reads from the backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Organizations,
    Activities,
    Trainers,
    Batches,
    Students,
    Enrollments,
    Attendance,
    BatchSessions,
    FeePlans,
    Invoices,
    Payments,
    Roles,
    Users,
}

/// How a resource's rows are tied to an organization.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipKind {
    /// Shared catalog data; not attributable to one organization.
    Unscoped,
    /// Rows carry the organization key themselves.
    Direct,
    /// `batchId -> batch.organizationId`
    ViaBatch,
    /// `sessionId -> session.batchId -> batch.organizationId`
    ViaSession,
    /// `studentId -> student.organizationId`
    ViaStudent,
}

impl ResourceType {
    pub const ALL: [ResourceType; 13] = [
        ResourceType::Organizations,
        ResourceType::Activities,
        ResourceType::Trainers,
        ResourceType::Batches,
        ResourceType::Students,
        ResourceType::Enrollments,
        ResourceType::Attendance,
        ResourceType::BatchSessions,
        ResourceType::FeePlans,
        ResourceType::Invoices,
        ResourceType::Payments,
        ResourceType::Roles,
        ResourceType::Users,
    ];

    /// Stable snake_case name (config, logs, CLI).
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Organizations => "organizations",
            ResourceType::Activities => "activities",
            ResourceType::Trainers => "trainers",
            ResourceType::Batches => "batches",
            ResourceType::Students => "students",
            ResourceType::Enrollments => "enrollments",
            ResourceType::Attendance => "attendance",
            ResourceType::BatchSessions => "batch_sessions",
            ResourceType::FeePlans => "fee_plans",
            ResourceType::Invoices => "invoices",
            ResourceType::Payments => "payments",
            ResourceType::Roles => "roles",
            ResourceType::Users => "users",
        }
    }

    /// Path segment of the collection endpoint, relative to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            ResourceType::Organizations => "organizations",
            ResourceType::Activities => "activities",
            ResourceType::Trainers => "trainers",
            ResourceType::Batches => "batches",
            ResourceType::Students => "students",
            ResourceType::Enrollments => "enrollments",
            ResourceType::Attendance => "attendance",
            ResourceType::BatchSessions => "batch-sessions",
            ResourceType::FeePlans => "fee-plans",
            ResourceType::Invoices => "invoices",
            ResourceType::Payments => "payments",
            ResourceType::Roles => "roles",
            ResourceType::Users => "users",
        }
    }

    pub fn ownership(&self) -> OwnershipKind {
        match self {
            ResourceType::Organizations
            | ResourceType::Batches
            | ResourceType::Students
            | ResourceType::Users => OwnershipKind::Direct,
            ResourceType::BatchSessions => OwnershipKind::ViaBatch,
            ResourceType::Attendance => OwnershipKind::ViaSession,
            ResourceType::Enrollments | ResourceType::Invoices | ResourceType::Payments => {
                OwnershipKind::ViaStudent
            }
            ResourceType::Activities
            | ResourceType::Trainers
            | ResourceType::FeePlans
            | ResourceType::Roles => OwnershipKind::Unscoped,
        }
    }

    /// Whether rows of this resource belong to a single organization.
    pub fn is_organization_sensitive(&self) -> bool {
        self.ownership() != OwnershipKind::Unscoped
    }
}

impl core::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = DomainError;

    /// Accepts the snake_case name or the path segment, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ResourceType::ALL
            .into_iter()
            .find(|r| r.as_str() == wanted || r.path() == wanted)
            .ok_or_else(|| DomainError::unknown_resource(s.trim()))
    }
}
