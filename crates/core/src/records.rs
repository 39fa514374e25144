//! Rows returned by the backend collections.
//!
//! Only the fields the console reads are modeled; unknown fields are ignored.
//! Only a row's own `id` is strict. Everything else is lenient: a missing,
//! null or mistyped value loads as `None` instead of failing the whole
//! listing, and amounts may arrive as numbers or decimal strings.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::id::{lenient_option, BatchId, OrganizationId, RecordId, SessionId, StudentId};
use crate::ownership::{Ownership, Record, Scopable};
use crate::resource::ResourceType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: OrganizationId,
    #[serde(default, deserialize_with = "lenient_option")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_option")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trainer {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_option")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: BatchId,
    #[serde(default, deserialize_with = "lenient_option")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub organization_id: Option<OrganizationId>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub activity_id: Option<RecordId>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub trainer_id: Option<RecordId>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: StudentId,
    #[serde(default, deserialize_with = "lenient_option")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub organization_id: Option<OrganizationId>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_option")]
    pub student_id: Option<StudentId>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub batch_id: Option<BatchId>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub fee_plan_id: Option<RecordId>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub enrolled_on: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_option")]
    pub session_id: Option<SessionId>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub student_id: Option<StudentId>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSession {
    pub id: SessionId,
    #[serde(default, deserialize_with = "lenient_option")]
    pub batch_id: Option<BatchId>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub session_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeePlan {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_option")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub billing_cycle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_option")]
    pub student_id: Option<StudentId>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub enrollment_id: Option<RecordId>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_option")]
    pub student_id: Option<StudentId>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub invoice_id: Option<RecordId>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub method: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub paid_on: Option<NaiveDate>,
}

/// A row of the `roles` collection (distinct from the parsed RBAC role).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRecord {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_option")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_option")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub organization_id: Option<OrganizationId>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub role_name: Option<String>,
}

/// Amount as a JSON number or a decimal string (`"120.00"`).
fn lenient_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let amount = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(amount.filter(|a| a.is_finite()))
}

macro_rules! impl_record {
    ($t:ty, $resource:expr, |$row:ident| $ownership:expr) => {
        impl Scopable for $t {
            fn ownership(&self) -> Ownership {
                let $row = self;
                $ownership
            }
        }

        impl Record for $t {
            const RESOURCE: ResourceType = $resource;
        }
    };
}

impl_record!(Organization, ResourceType::Organizations, |row| Ownership::Organization(Some(row.id)));
impl_record!(Activity, ResourceType::Activities, |_row| Ownership::Unscoped);
impl_record!(Trainer, ResourceType::Trainers, |_row| Ownership::Unscoped);
impl_record!(Batch, ResourceType::Batches, |row| Ownership::Organization(row.organization_id));
impl_record!(Student, ResourceType::Students, |row| Ownership::Organization(row.organization_id));
impl_record!(Enrollment, ResourceType::Enrollments, |row| Ownership::Student(row.student_id));
impl_record!(Attendance, ResourceType::Attendance, |row| Ownership::Session(row.session_id));
impl_record!(BatchSession, ResourceType::BatchSessions, |row| Ownership::Batch(row.batch_id));
impl_record!(FeePlan, ResourceType::FeePlans, |_row| Ownership::Unscoped);
impl_record!(Invoice, ResourceType::Invoices, |row| Ownership::Student(row.student_id));
impl_record!(Payment, ResourceType::Payments, |row| Ownership::Student(row.student_id));
impl_record!(RoleRecord, ResourceType::Roles, |_row| Ownership::Unscoped);
impl_record!(UserRecord, ResourceType::Users, |row| Ownership::Organization(row.organization_id));
