//! Applying a scope decision to fetched rows.
//!
//! Rows whose organization is only reachable through parents are resolved via
//! lookup tables the caller assembled beforehand; this module never fetches.

use std::collections::HashMap;

use coachdesk_core::{
    Batch, BatchId, BatchSession, OrganizationId, Ownership, OwnershipKind, ResourceType,
    Scopable, SessionId, Student, StudentId,
};

use crate::scope::ScopeDecision;

/// Parent-key lookup tables for resolving derived ownership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinContext {
    batch_org: HashMap<BatchId, OrganizationId>,
    session_batch: HashMap<SessionId, BatchId>,
    student_org: HashMap<StudentId, OrganizationId>,
}

impl JoinContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index batches by id. Batches without an organization are left out.
    pub fn with_batches(mut self, batches: &[Batch]) -> Self {
        for batch in batches {
            if let Some(org) = batch.organization_id {
                self.batch_org.insert(batch.id, org);
            }
        }
        self
    }

    /// Index sessions by id. Sessions without a batch are left out.
    pub fn with_sessions(mut self, sessions: &[BatchSession]) -> Self {
        for session in sessions {
            if let Some(batch) = session.batch_id {
                self.session_batch.insert(session.id, batch);
            }
        }
        self
    }

    /// Index students by id. Students without an organization are left out.
    pub fn with_students(mut self, students: &[Student]) -> Self {
        for student in students {
            if let Some(org) = student.organization_id {
                self.student_org.insert(student.id, org);
            }
        }
        self
    }

    pub fn insert_batch(&mut self, batch: BatchId, organization: OrganizationId) {
        self.batch_org.insert(batch, organization);
    }

    pub fn insert_session(&mut self, session: SessionId, batch: BatchId) {
        self.session_batch.insert(session, batch);
    }

    pub fn insert_student(&mut self, student: StudentId, organization: OrganizationId) {
        self.student_org.insert(student, organization);
    }

    /// Walk the ownership chain until an organization is found.
    ///
    /// `None` when any link is missing or the row is unscoped.
    pub fn resolve_organization(&self, ownership: Ownership) -> Option<OrganizationId> {
        match ownership {
            Ownership::Unscoped => None,
            Ownership::Organization(org) => org,
            Ownership::Batch(batch) => self.batch_org.get(&batch?).copied(),
            Ownership::Session(session) => {
                let batch = self.session_batch.get(&session?).copied();
                self.resolve_organization(Ownership::Batch(batch))
            }
            Ownership::Student(student) => self.student_org.get(&student?).copied(),
        }
    }
}

/// Parent collections a caller must fetch before filtering a resource.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct JoinRequirements {
    pub batches: bool,
    pub sessions: bool,
    pub students: bool,
}

impl JoinRequirements {
    pub fn for_resource(resource: ResourceType) -> Self {
        match resource.ownership() {
            OwnershipKind::Unscoped | OwnershipKind::Direct => Self::default(),
            OwnershipKind::ViaBatch => Self {
                batches: true,
                ..Self::default()
            },
            OwnershipKind::ViaSession => Self {
                batches: true,
                sessions: true,
                ..Self::default()
            },
            OwnershipKind::ViaStudent => Self {
                students: true,
                ..Self::default()
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.batches || self.sessions || self.students)
    }
}

/// Produce the subset of `records` visible under `decision`.
///
/// - global: every record, in order
/// - scoped with no organization: nothing
/// - otherwise: records whose resolved organization matches, in original order
///
/// The input is never modified.
pub fn apply_scope<T>(decision: &ScopeDecision, records: &[T], join: &JoinContext) -> Vec<T>
where
    T: Scopable + Clone,
{
    if decision.is_global() {
        return records.to_vec();
    }

    let Some(org) = decision.organization_id() else {
        return Vec::new();
    };

    let visible: Vec<T> = records
        .iter()
        .filter(|r| join.resolve_organization(r.ownership()) == Some(org))
        .cloned()
        .collect();

    tracing::debug!(
        mode = ?decision.mode(),
        organization_id = %org,
        candidates = records.len(),
        visible = visible.len(),
        "scope applied"
    );

    visible
}
