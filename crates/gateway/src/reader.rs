//! Scoped reads: fetch a collection, then narrow it to what the actor may see.

use serde_json::Value;

use coachdesk_auth::{
    ActorContext, JoinContext, JoinRequirements, ScopeDecision, ScopePolicy, apply_scope,
    evaluate_scope_with,
};
use coachdesk_core::{
    Activity, Attendance, Batch, BatchSession, Enrollment, FeePlan, Invoice, Organization, Payment,
    Record, ResourceType, RoleRecord, Student, Trainer, UserRecord,
};

use crate::gateway::fetch;
use crate::{EntityGateway, GatewayError};

/// Reads collections on behalf of an actor.
///
/// Parent collections needed to resolve derived ownership are fetched
/// concurrently with the candidate rows; filtering starts only once all of
/// them have arrived. A fail-closed decision returns nothing without
/// touching the gateway.
#[derive(Debug)]
pub struct ScopedReader<G> {
    gateway: G,
    policy: ScopePolicy,
}

impl<G: EntityGateway> ScopedReader<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            policy: ScopePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ScopePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn policy(&self) -> &ScopePolicy {
        &self.policy
    }

    pub fn decision(&self, actor: &ActorContext, resource: ResourceType) -> ScopeDecision {
        evaluate_scope_with(actor, resource, &self.policy)
    }

    /// The rows of `T`'s collection visible to `actor`, in backend order.
    pub async fn visible<T: Record>(&self, actor: &ActorContext) -> Result<Vec<T>, GatewayError> {
        let decision = self.decision(actor, T::RESOURCE);

        if decision.is_global() {
            return fetch::<T, G>(&self.gateway).await;
        }
        if decision.is_fail_closed() {
            return Ok(Vec::new());
        }

        let needs = JoinRequirements::for_resource(T::RESOURCE);
        let (records, join) = tokio::try_join!(fetch::<T, G>(&self.gateway), self.join_context(needs))?;

        Ok(apply_scope(&decision, &records, &join))
    }

    /// Untyped variant of [`Self::visible`] for callers that pick the
    /// resource at runtime.
    pub async fn visible_json(
        &self,
        actor: &ActorContext,
        resource: ResourceType,
    ) -> Result<Vec<Value>, GatewayError> {
        match resource {
            ResourceType::Organizations => self.visible_values::<Organization>(actor).await,
            ResourceType::Activities => self.visible_values::<Activity>(actor).await,
            ResourceType::Trainers => self.visible_values::<Trainer>(actor).await,
            ResourceType::Batches => self.visible_values::<Batch>(actor).await,
            ResourceType::Students => self.visible_values::<Student>(actor).await,
            ResourceType::Enrollments => self.visible_values::<Enrollment>(actor).await,
            ResourceType::Attendance => self.visible_values::<Attendance>(actor).await,
            ResourceType::BatchSessions => self.visible_values::<BatchSession>(actor).await,
            ResourceType::FeePlans => self.visible_values::<FeePlan>(actor).await,
            ResourceType::Invoices => self.visible_values::<Invoice>(actor).await,
            ResourceType::Payments => self.visible_values::<Payment>(actor).await,
            ResourceType::Roles => self.visible_values::<RoleRecord>(actor).await,
            ResourceType::Users => self.visible_values::<UserRecord>(actor).await,
        }
    }

    async fn visible_values<T>(&self, actor: &ActorContext) -> Result<Vec<Value>, GatewayError>
    where
        T: Record + serde::Serialize,
    {
        self.visible::<T>(actor)
            .await?
            .iter()
            .map(|row| serde_json::to_value(row).map_err(|e| GatewayError::parse(T::RESOURCE, e.to_string())))
            .collect()
    }

    async fn join_context(&self, needs: JoinRequirements) -> Result<JoinContext, GatewayError> {
        let (batches, sessions, students) = tokio::try_join!(
            self.fetch_if::<Batch>(needs.batches),
            self.fetch_if::<BatchSession>(needs.sessions),
            self.fetch_if::<Student>(needs.students),
        )?;

        Ok(JoinContext::new()
            .with_batches(&batches)
            .with_sessions(&sessions)
            .with_students(&students))
    }

    async fn fetch_if<T: Record>(&self, wanted: bool) -> Result<Vec<T>, GatewayError> {
        if wanted {
            fetch::<T, G>(&self.gateway).await
        } else {
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use coachdesk_core::OrganizationId;

    use super::*;
    use crate::InMemoryGateway;

    fn org(id: u64) -> OrganizationId {
        OrganizationId::new(id).unwrap()
    }

    fn seeded() -> InMemoryGateway {
        InMemoryGateway::new()
            .with_raw(
                ResourceType::Batches,
                vec![
                    json!({"id": 100, "name": "Morning", "organizationId": 1}),
                    json!({"id": 200, "name": "Evening", "organizationId": 2}),
                ],
            )
            .with_raw(
                ResourceType::BatchSessions,
                vec![
                    json!({"id": 10, "batchId": 100}),
                    json!({"id": 11, "batchId": 200}),
                    json!({"id": 12, "batchId": 300}),
                ],
            )
            .with_raw(
                ResourceType::Attendance,
                vec![
                    json!({"id": 1, "sessionId": 10, "studentId": 1}),
                    json!({"id": 2, "sessionId": 11, "studentId": 2}),
                    json!({"id": 3, "sessionId": 12, "studentId": 1}),
                ],
            )
            .with_raw(
                ResourceType::Students,
                vec![
                    json!({"id": 1, "name": "Ana", "organizationId": 1}),
                    json!({"id": 2, "name": "Ben", "organizationId": "2"}),
                ],
            )
            .with_raw(
                ResourceType::Invoices,
                vec![
                    json!({"id": 7, "studentId": 2, "amount": 120.0}),
                    json!({"id": 8, "studentId": 1, "amount": 80.0}),
                    json!({"id": 9, "studentId": null, "amount": 5.0}),
                ],
            )
            .with_raw(ResourceType::Activities, vec![json!({"id": 1, "name": "Swim"})])
    }

    fn admin_of(id: u64) -> ActorContext {
        ActorContext::new("admin@x.io", Some(org(id)), "Admin")
    }

    #[tokio::test]
    async fn attendance_is_scoped_through_sessions_and_batches() {
        let reader = ScopedReader::new(seeded());
        let rows: Vec<Attendance> = reader.visible(&admin_of(1)).await.unwrap();
        assert_eq!(rows.iter().map(|r| r.id.get()).collect::<Vec<_>>(), vec![1]);

        assert_eq!(reader.gateway().calls(ResourceType::Batches), 1);
        assert_eq!(reader.gateway().calls(ResourceType::BatchSessions), 1);
        assert_eq!(reader.gateway().calls(ResourceType::Students), 0);
    }

    #[tokio::test]
    async fn invoices_are_scoped_through_students() {
        let reader = ScopedReader::new(seeded());
        let rows: Vec<Invoice> = reader.visible(&admin_of(2)).await.unwrap();
        assert_eq!(rows.iter().map(|r| r.id.get()).collect::<Vec<_>>(), vec![7]);
        assert_eq!(reader.gateway().calls(ResourceType::Batches), 0);
    }

    #[tokio::test]
    async fn direct_resources_need_no_parents() {
        let reader = ScopedReader::new(seeded());
        let rows: Vec<Batch> = reader.visible(&admin_of(2)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name.as_deref(), Some("Evening"));
        assert_eq!(reader.gateway().total_calls(), 1);
    }

    #[tokio::test]
    async fn super_admin_reads_unfiltered() {
        let reader = ScopedReader::new(seeded());
        let actor = ActorContext::new("root@x.io", None, " super ADMIN ");
        let rows: Vec<BatchSession> = reader.visible(&actor).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(reader.gateway().total_calls(), 1);
    }

    #[tokio::test]
    async fn fail_closed_never_fetches() {
        let reader = ScopedReader::new(seeded());
        let actor = ActorContext::new("admin@x.io", None, "admin");
        for resource in [ResourceType::Batches, ResourceType::Attendance, ResourceType::Invoices] {
            assert!(reader.visible_json(&actor, resource).await.unwrap().is_empty());
        }
        assert_eq!(reader.gateway().total_calls(), 0);

        let activities = reader.visible_json(&actor, ResourceType::Activities).await.unwrap();
        assert_eq!(activities.len(), 1);
    }

    #[tokio::test]
    async fn exempted_resources_are_read_unfiltered() {
        let policy = ScopePolicy::new().exempt(ResourceType::Invoices);
        let reader = ScopedReader::new(seeded()).with_policy(policy);
        let rows: Vec<Invoice> = reader.visible(&admin_of(1)).await.unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn parent_fetch_failure_propagates() {
        let gateway = seeded().with_failure(ResourceType::Students, GatewayError::Api(500, "boom".into()));
        let reader = ScopedReader::new(gateway);
        let err = reader.visible::<Enrollment>(&admin_of(1)).await.unwrap_err();
        assert_eq!(err, GatewayError::Api(500, "boom".into()));
    }

    #[tokio::test]
    async fn undecodable_rows_are_reported() {
        let gateway = InMemoryGateway::new()
            .with_raw(ResourceType::Organizations, vec![json!({"id": "x", "name": "Bad"})]);
        let reader = ScopedReader::new(gateway);
        let err = reader.visible::<Organization>(&admin_of(1)).await.unwrap_err();
        assert!(matches!(err, GatewayError::Parse { .. }));
    }

    #[tokio::test]
    async fn null_names_and_string_amounts_still_scope() {
        let gateway = seeded()
            .with_raw(
                ResourceType::Students,
                vec![
                    json!({"id": 1, "name": null, "organizationId": 1}),
                    json!({"id": 2, "organizationId": 2}),
                ],
            )
            .with_raw(
                ResourceType::Invoices,
                vec![
                    json!({"id": 7, "studentId": 2, "amount": "120.00"}),
                    json!({"id": 8, "studentId": 1, "amount": "80"}),
                ],
            );
        let reader = ScopedReader::new(gateway);

        let rows: Vec<Invoice> = reader.visible(&admin_of(1)).await.unwrap();
        assert_eq!(rows.iter().map(|r| r.id.get()).collect::<Vec<_>>(), vec![8]);
        assert_eq!(rows[0].amount, Some(80.0));

        let root = ActorContext::new("root@x.io", None, "Super Admin");
        let all: Vec<Invoice> = reader.visible(&root).await.unwrap();
        assert_eq!(all[0].amount, Some(120.0));

        let students: Vec<Student> = reader.visible(&admin_of(1)).await.unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].name, None);
    }
}
