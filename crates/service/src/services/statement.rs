use std::cmp::Reverse;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::statement::{self, normalize_month};
use models::validate::validate_name;

use super::{check_file_key, discard_file, lookup_client, now, owned};
use crate::auth::{domain::Principal, repository::AuthRepository};
use crate::errors::ServiceError;
use crate::metrics;
use crate::notify::{Notice, Notifications};
use crate::repository::DocumentRepository;
use crate::storage::FileStore;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateStatementInput {
    pub client_id: Uuid,
    pub title: String,
    /// English month name or three-letter abbreviation, any case.
    pub month: String,
    pub year: i32,
    pub file_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementYear {
    pub year: i32,
    /// Calendar order, January first.
    pub statements: Vec<statement::Model>,
}

/// Newest period first: year descending, then calendar month descending.
pub fn sort_newest_first(rows: &mut [statement::Model]) {
    rows.sort_by_key(|s| Reverse(s.period()));
}

/// Group by year (newest year first) with months in calendar order.
pub fn timeline(mut rows: Vec<statement::Model>) -> Vec<StatementYear> {
    rows.sort_by(|a, b| {
        let (ya, ma) = a.period();
        let (yb, mb) = b.period();
        yb.cmp(&ya).then(ma.cmp(&mb))
    });
    let mut out: Vec<StatementYear> = Vec::new();
    for s in rows {
        match out.last_mut() {
            Some(group) if group.year == s.year => group.statements.push(s),
            _ => out.push(StatementYear { year: s.year, statements: vec![s] }),
        }
    }
    out
}

pub struct StatementService {
    documents: Arc<dyn DocumentRepository>,
    directory: Arc<dyn AuthRepository>,
    files: Arc<dyn FileStore>,
    notifications: Notifications,
}

impl StatementService {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        directory: Arc<dyn AuthRepository>,
        files: Arc<dyn FileStore>,
        notifications: Notifications,
    ) -> Self {
        Self { documents, directory, files, notifications }
    }

    #[instrument(skip(self, principal, input), fields(tenant = %principal.tenant_id))]
    pub async fn create(&self, principal: &Principal, input: CreateStatementInput) -> Result<statement::Model, ServiceError> {
        principal.require_admin()?;
        validate_name(&input.title)?;
        let month = normalize_month(&input.month)?;
        if !(1900..=9999).contains(&input.year) {
            return Err(ServiceError::Validation("year out of range".into()));
        }
        let file_key = check_file_key(principal, &input.file_key)?;
        lookup_client(&self.directory, principal.tenant_id, input.client_id).await?;
        let row = statement::Model {
            id: Uuid::new_v4(),
            tenant_id: principal.tenant_id,
            client_id: input.client_id,
            title: input.title.trim().to_string(),
            month,
            year: input.year,
            file_key,
            created_at: now(),
        };
        let created = self.documents.insert_statement(row).await?;
        metrics::record("statement", "created");
        info!(event = "statement_created", statement_id = %created.id);

        let notice = Notice::new(
            "statement_available",
            created.id,
            "New statement available",
            format!("Your statement for {} {} is available.", created.month, created.year),
        );
        self.notifications.user(principal.tenant_id, created.client_id, &notice).await;
        Ok(created)
    }

    pub async fn list(&self, principal: &Principal, client_id: Option<Uuid>) -> Result<Vec<statement::Model>, ServiceError> {
        let mut rows = self
            .documents
            .list_statements(principal.tenant_id, principal.scope_client(client_id))
            .await?;
        sort_newest_first(&mut rows);
        Ok(rows)
    }

    pub async fn timeline(&self, principal: &Principal, client_id: Option<Uuid>) -> Result<Vec<StatementYear>, ServiceError> {
        let rows = self
            .documents
            .list_statements(principal.tenant_id, principal.scope_client(client_id))
            .await?;
        Ok(timeline(rows))
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<statement::Model, ServiceError> {
        let row = self.documents.get_statement(principal.tenant_id, id).await?;
        owned(principal, row, |s| s.client_id, "statement")
    }

    /// Removes the record and its stored file.
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), ServiceError> {
        principal.require_admin()?;
        let row = self.get(principal, id).await?;
        if !self.documents.delete_statement(principal.tenant_id, id).await? {
            return Err(ServiceError::not_found("statement"));
        }
        discard_file(&self.files, &row.file_key).await;
        metrics::record("statement", "deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testkit::Kit;
    use crate::storage::FileStore;

    fn service(kit: &Kit) -> StatementService {
        StatementService::new(kit.repo.clone(), kit.directory.clone(), kit.files.clone(), kit.notifications())
    }

    async fn add(kit: &Kit, svc: &StatementService, month: &str, year: i32) -> statement::Model {
        let file = kit.files.put(kit.tenant_id, "statement.pdf", b"pdf".to_vec()).await.unwrap();
        svc.create(
            &kit.admin,
            CreateStatementInput {
                client_id: kit.client.user_id,
                title: format!("{month} {year}"),
                month: month.into(),
                year,
                file_key: file.key,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn sorted_by_calendar_not_alphabet() {
        let kit = Kit::new().await;
        let svc = service(&kit);
        add(&kit, &svc, "april", 2024).await;
        add(&kit, &svc, "Dec", 2023).await;
        add(&kit, &svc, "JANUARY", 2024).await;
        add(&kit, &svc, "September", 2024).await;

        let rows = svc.list(&kit.client, None).await.unwrap();
        let periods: Vec<(i32, &str)> = rows.iter().map(|s| (s.year, s.month.as_str())).collect();
        assert_eq!(periods, vec![(2024, "September"), (2024, "April"), (2024, "January"), (2023, "December")]);
        assert!(svc.list(&kit.other_client, None).await.unwrap().is_empty());

        let tl = svc.timeline(&kit.client, None).await.unwrap();
        assert_eq!(tl.len(), 2);
        assert_eq!(tl[0].year, 2024);
        let months: Vec<&str> = tl[0].statements.iter().map(|s| s.month.as_str()).collect();
        assert_eq!(months, vec!["January", "April", "September"]);
        assert_eq!(tl[1].statements[0].month, "December");
    }

    #[tokio::test]
    async fn rejects_unknown_month_and_notifies_on_create() {
        let kit = Kit::new().await;
        let svc = service(&kit);
        let file = kit.files.put(kit.tenant_id, "s.pdf", b"pdf".to_vec()).await.unwrap();
        let bad = CreateStatementInput {
            client_id: kit.client.user_id,
            title: "Q1".into(),
            month: "Smarch".into(),
            year: 2024,
            file_key: file.key,
        };
        assert!(svc.create(&kit.admin, bad).await.is_err());
        add(&kit, &svc, "mar", 2024).await;
        assert_eq!(kit.notifier.pushes_for(kit.client.user_id).len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_the_stored_file() {
        let kit = Kit::new().await;
        let svc = service(&kit);
        let st = add(&kit, &svc, "may", 2024).await;
        assert!(kit.files.get(&st.file_key).await.unwrap().is_some());
        assert!(matches!(svc.delete(&kit.client, st.id).await, Err(ServiceError::Forbidden(_))));
        svc.delete(&kit.admin, st.id).await.unwrap();
        assert!(kit.files.get(&st.file_key).await.unwrap().is_none());
        assert!(matches!(svc.delete(&kit.admin, st.id).await, Err(ServiceError::NotFound(_))));
    }
}
