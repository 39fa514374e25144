//! Strongly-typed identifiers used across the domain.
//!
//! The backend hands out positive integer keys. Ids accept either a JSON
//! number or a numeric string on the way in, since persisted login state
//! tends to stringify them.

use core::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of an organization (the tenant boundary).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OrganizationId(u64);

/// Identifier of a batch (a scheduled run of an activity).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BatchId(u64);

/// Identifier of a batch session (one meeting of a batch).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionId(u64);

/// Identifier of a student.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StudentId(u64);

/// Identifier of any other row (activities, invoices, payments, ...).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(u64);

/// Parse a raw integer into a positive id value.
fn positive(raw: i128, name: &str) -> Result<u64, DomainError> {
    if raw <= 0 || raw > u64::MAX as i128 {
        return Err(DomainError::invalid_id(format!("{name}: {raw} is not a positive integer")));
    }
    Ok(raw as u64)
}

struct IdVisitor(&'static str);

impl<'de> Visitor<'de> for IdVisitor {
    type Value = u64;

    fn expecting(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "a positive integer {} (number or numeric string)", self.0)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
        positive(v as i128, self.0).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
        positive(v as i128, self.0).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<u64, E> {
        if v.fract() != 0.0 {
            return Err(E::custom(format!("{}: {v} is not an integer", self.0)));
        }
        positive(v as i128, self.0).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
        let raw: i128 = v
            .trim()
            .parse()
            .map_err(|_| E::custom(format!("{}: '{v}' is not numeric", self.0)))?;
        positive(raw, self.0).map_err(E::custom)
    }
}

macro_rules! impl_int_newtype {
    ($t:ident, $name:literal) => {
        impl $t {
            /// Create an identifier, rejecting zero.
            pub fn new(value: u64) -> Result<Self, DomainError> {
                positive(value as i128, $name).map(Self)
            }

            pub fn get(&self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$t> for u64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl TryFrom<u64> for $t {
            type Error = DomainError;

            fn try_from(value: u64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw: i128 = s
                    .trim()
                    .parse()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                positive(raw, $name).map(Self)
            }
        }

        impl<'de> Deserialize<'de> for $t {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer.deserialize_any(IdVisitor($name)).map(Self)
            }
        }
    };
}

impl_int_newtype!(OrganizationId, "OrganizationId");
impl_int_newtype!(BatchId, "BatchId");
impl_int_newtype!(SessionId, "SessionId");
impl_int_newtype!(StudentId, "StudentId");
impl_int_newtype!(RecordId, "RecordId");

/// Deserialize an optional id, mapping anything unusable to `None`.
///
/// Foreign keys on fetched rows are frequently `null`, `""` or `0` once the
/// parent has been removed. Those rows must still load; they just cannot be
/// attributed to an organization.
pub fn lenient_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}
