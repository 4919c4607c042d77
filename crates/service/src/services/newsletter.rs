use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use models::newsletter;
use models::validate::validate_name;

use super::{check_file_key, discard_file, now};
use crate::auth::domain::Principal;
use crate::errors::ServiceError;
use crate::metrics;
use crate::notify::{Notice, Notifications};
use crate::repository::DocumentRepository;
use crate::storage::FileStore;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateNewsletterInput {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub file_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNewsletterInput {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub file_key: Option<String>,
}

pub struct NewsletterService {
    documents: Arc<dyn DocumentRepository>,
    files: Arc<dyn FileStore>,
    notifications: Notifications,
}

impl NewsletterService {
    pub fn new(documents: Arc<dyn DocumentRepository>, files: Arc<dyn FileStore>, notifications: Notifications) -> Self {
        Self { documents, files, notifications }
    }

    #[instrument(skip(self, principal, input), fields(tenant = %principal.tenant_id))]
    pub async fn create(&self, principal: &Principal, input: CreateNewsletterInput) -> Result<newsletter::Model, ServiceError> {
        principal.require_admin()?;
        validate_name(&input.title)?;
        let file_key = input.file_key.as_deref().map(|k| check_file_key(principal, k)).transpose()?;
        let row = newsletter::Model {
            id: Uuid::new_v4(),
            tenant_id: principal.tenant_id,
            title: input.title.trim().to_string(),
            summary: input.summary,
            file_key,
            published: false,
            published_at: None,
            created_at: now(),
        };
        let created = self.documents.insert_newsletter(row).await?;
        metrics::record("newsletter", "created");
        Ok(created)
    }

    pub async fn update(&self, principal: &Principal, id: Uuid, input: UpdateNewsletterInput) -> Result<newsletter::Model, ServiceError> {
        principal.require_admin()?;
        let mut n = self.get(principal, id).await?;
        if let Some(title) = input.title {
            validate_name(&title)?;
            n.title = title.trim().to_string();
        }
        if let Some(summary) = input.summary {
            n.summary = summary;
        }
        let mut replaced = None;
        if let Some(key) = input.file_key {
            let key = check_file_key(principal, &key)?;
            if n.file_key.as_deref() != Some(key.as_str()) {
                replaced = n.file_key.replace(key);
            }
        }
        let saved = self.documents.update_newsletter(n).await?;
        if let Some(old) = replaced {
            discard_file(&self.files, &old).await;
        }
        Ok(saved)
    }

    /// Publishing pushes to every client of the tenant.
    #[instrument(skip(self, principal), fields(tenant = %principal.tenant_id))]
    pub async fn publish(&self, principal: &Principal, id: Uuid) -> Result<newsletter::Model, ServiceError> {
        principal.require_admin()?;
        let mut n = self.get(principal, id).await?;
        if n.published {
            return Err(ServiceError::InvalidState("newsletter already published".into()));
        }
        n.published = true;
        n.published_at = Some(now());
        let saved = self.documents.update_newsletter(n).await?;
        metrics::record("newsletter", "published");
        info!(event = "newsletter_published", newsletter_id = %saved.id);

        let notice = Notice::new("newsletter_published", saved.id, saved.title.clone(), saved.summary.clone());
        self.notifications.clients_push(principal.tenant_id, &notice).await;
        Ok(saved)
    }

    /// Newest first; clients only see published issues.
    pub async fn list(&self, principal: &Principal) -> Result<Vec<newsletter::Model>, ServiceError> {
        let mut rows = self.documents.list_newsletters(principal.tenant_id, !principal.is_admin()).await?;
        rows.sort_by(|a, b| {
            b.published_at
                .unwrap_or(b.created_at)
                .cmp(&a.published_at.unwrap_or(a.created_at))
        });
        Ok(rows)
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<newsletter::Model, ServiceError> {
        match self.documents.get_newsletter(principal.tenant_id, id).await? {
            Some(n) if principal.is_admin() || n.published => Ok(n),
            _ => Err(ServiceError::not_found("newsletter")),
        }
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), ServiceError> {
        principal.require_admin()?;
        let n = self.get(principal, id).await?;
        if !self.documents.delete_newsletter(principal.tenant_id, id).await? {
            return Err(ServiceError::not_found("newsletter"));
        }
        if let Some(key) = n.file_key {
            discard_file(&self.files, &key).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testkit::Kit;
    use crate::storage::FileStore;

    fn input(title: &str) -> CreateNewsletterInput {
        CreateNewsletterInput { title: title.into(), summary: "Quarterly letter".into(), file_key: None }
    }

    #[tokio::test]
    async fn publish_pushes_to_clients_only_once() {
        let kit = Kit::new().await;
        let svc = NewsletterService::new(kit.repo.clone(), kit.files.clone(), kit.notifications());
        let n = svc.create(&kit.admin, input("Q2 2024")).await.unwrap();
        assert!(svc.list(&kit.client).await.unwrap().is_empty());
        assert!(matches!(svc.get(&kit.client, n.id).await, Err(ServiceError::NotFound(_))));

        let published = svc.publish(&kit.admin, n.id).await.unwrap();
        assert!(published.published_at.is_some());
        assert_eq!(kit.notifier.pushes_for(kit.client.user_id).len(), 1);
        assert_eq!(kit.notifier.pushes_for(kit.other_client.user_id).len(), 1);
        assert!(kit.notifier.pushes_for(kit.admin.user_id).is_empty());
        assert!(matches!(svc.publish(&kit.admin, n.id).await, Err(ServiceError::InvalidState(_))));
        assert_eq!(svc.list(&kit.client).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failing_notifier_does_not_fail_publish() {
        let kit = Kit::new().await;
        let notifications = Notifications::new(
            Arc::new(crate::notify::mock::RecordingNotifier::failing()),
            kit.directory.clone(),
        );
        let svc = NewsletterService::new(kit.repo.clone(), kit.files.clone(), notifications);
        let n = svc.create(&kit.admin, input("Outage edition")).await.unwrap();
        assert!(svc.publish(&kit.admin, n.id).await.unwrap().published);
    }

    #[tokio::test]
    async fn replaced_and_deleted_attachments_are_removed() {
        let kit = Kit::new().await;
        let svc = NewsletterService::new(kit.repo.clone(), kit.files.clone(), kit.notifications());
        let first = kit.files.put(kit.tenant_id, "q2.pdf", b"v1".to_vec()).await.unwrap();
        let second = kit.files.put(kit.tenant_id, "q2-final.pdf", b"v2".to_vec()).await.unwrap();
        let mut create = input("Q2 2024");
        create.file_key = Some(first.key.clone());
        let n = svc.create(&kit.admin, create).await.unwrap();

        let update = UpdateNewsletterInput { file_key: Some(second.key.clone()), ..Default::default() };
        svc.update(&kit.admin, n.id, update).await.unwrap();
        assert!(kit.files.get(&first.key).await.unwrap().is_none());
        assert!(kit.files.get(&second.key).await.unwrap().is_some());

        svc.delete(&kit.admin, n.id).await.unwrap();
        assert!(kit.files.is_empty());
    }
}
