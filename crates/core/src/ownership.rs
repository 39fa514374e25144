//! Ownership contract for rows that can be narrowed to one organization.

use serde::de::DeserializeOwned;

use crate::id::{BatchId, OrganizationId, SessionId, StudentId};
use crate::resource::ResourceType;

/// The first link in a row's chain to its owning organization.
///
/// A `None` key means the row names no parent (or a garbage one) and can
/// never be attributed to an organization.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Ownership {
    Unscoped,
    Organization(Option<OrganizationId>),
    Batch(Option<BatchId>),
    Session(Option<SessionId>),
    Student(Option<StudentId>),
}

/// Marks rows that carry (directly or transitively) an organization key.
///
/// Similar to a tenant-scoped message, except the tenant may only be
/// reachable through parent rows the caller has to supply.
pub trait Scopable {
    fn ownership(&self) -> Ownership;
}

/// A typed row of one backend collection.
pub trait Record: Scopable + DeserializeOwned + Clone + Send + 'static {
    const RESOURCE: ResourceType;
}

impl<T: Scopable + ?Sized> Scopable for &T {
    fn ownership(&self) -> Ownership {
        (**self).ownership()
    }
}
