//! `coachdesk-core` — domain primitives shared by every other crate.
//!
//! This crate contains **pure domain** types (no IO): identifiers, the resource
//! catalog, backend rows and the ownership contract used for organization scoping.

pub mod error;
pub mod id;
pub mod ownership;
pub mod records;
pub mod resource;

pub use error::DomainError;
pub use id::{BatchId, OrganizationId, RecordId, SessionId, StudentId};
pub use ownership::{Ownership, Record, Scopable};
pub use records::{
    Activity, Attendance, Batch, BatchSession, Enrollment, FeePlan, Invoice, Organization,
    Payment, RoleRecord, Student, Trainer, UserRecord,
};
pub use resource::{OwnershipKind, ResourceType};
