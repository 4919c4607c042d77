use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use models::kyc_document::{self, KycStatus};
use models::validate::validate_required;

use super::{acting_client, check_file_key, discard_file, lookup_client, now, owned};
use crate::auth::{domain::Principal, repository::AuthRepository};
use crate::errors::ServiceError;
use crate::metrics;
use crate::notify::{Notice, Notifications};
use crate::repository::{DocumentRepository, KycFilter};
use crate::storage::FileStore;

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitKycInput {
    /// Admins submitting on behalf of a client set this.
    #[serde(default)]
    pub client_id: Option<Uuid>,
    pub doc_type: String,
    pub file_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewKycInput {
    pub decision: KycStatus,
    #[serde(default)]
    pub note: Option<String>,
}

pub struct KycService {
    documents: Arc<dyn DocumentRepository>,
    directory: Arc<dyn AuthRepository>,
    files: Arc<dyn FileStore>,
    notifications: Notifications,
}

impl KycService {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        directory: Arc<dyn AuthRepository>,
        files: Arc<dyn FileStore>,
        notifications: Notifications,
    ) -> Self {
        Self { documents, directory, files, notifications }
    }

    #[instrument(skip(self, principal, input), fields(tenant = %principal.tenant_id))]
    pub async fn submit(&self, principal: &Principal, input: SubmitKycInput) -> Result<kyc_document::Model, ServiceError> {
        let client_id = acting_client(principal, input.client_id)?;
        lookup_client(&self.directory, principal.tenant_id, client_id).await?;
        validate_required("doc_type", &input.doc_type)?;
        let file_key = check_file_key(principal, &input.file_key)?;
        let ts = now();
        let row = kyc_document::Model {
            id: Uuid::new_v4(),
            tenant_id: principal.tenant_id,
            client_id,
            doc_type: input.doc_type.trim().to_ascii_lowercase(),
            file_key,
            status: KycStatus::Pending,
            review_note: None,
            created_at: ts,
            updated_at: ts,
        };
        let created = self.documents.insert_kyc(row).await?;
        metrics::record("kyc", "submitted");
        info!(event = "kyc_submitted", kyc_id = %created.id);
        Ok(created)
    }

    pub async fn list(&self, principal: &Principal, mut filter: KycFilter) -> Result<Vec<kyc_document::Model>, ServiceError> {
        filter.client_id = principal.scope_client(filter.client_id);
        self.documents.list_kyc(principal.tenant_id, &filter).await
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<kyc_document::Model, ServiceError> {
        let row = self.documents.get_kyc(principal.tenant_id, id).await?;
        owned(principal, row, |k| k.client_id, "kyc document")
    }

    /// Pending -> Approved | Rejected; a rejection carries a note for the client.
    #[instrument(skip(self, principal, input), fields(tenant = %principal.tenant_id))]
    pub async fn review(&self, principal: &Principal, id: Uuid, input: ReviewKycInput) -> Result<kyc_document::Model, ServiceError> {
        principal.require_admin()?;
        let mut doc = self.get(principal, id).await?;
        if doc.status != KycStatus::Pending {
            return Err(ServiceError::invalid_state("kyc document", doc.status, "review"));
        }
        let note = input.note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        match input.decision {
            KycStatus::Approved => {}
            KycStatus::Rejected if note.is_some() => {}
            KycStatus::Rejected => return Err(ServiceError::Validation("a rejection requires a note".into())),
            KycStatus::Pending => return Err(ServiceError::Validation("decision must be approved or rejected".into())),
        }
        doc.status = input.decision;
        doc.review_note = note;
        doc.updated_at = now();
        let saved = self.documents.update_kyc(doc).await?;
        let outcome = if saved.status == KycStatus::Approved { "approved" } else { "rejected" };
        metrics::record("kyc", outcome);
        info!(event = "kyc_reviewed", kyc_id = %saved.id, outcome);

        let body = match &saved.review_note {
            Some(n) => format!("Your {} document was {outcome}: {n}", saved.doc_type),
            None => format!("Your {} document was {outcome}.", saved.doc_type),
        };
        let notice = Notice::new("kyc_reviewed", saved.id, format!("KYC document {outcome}"), body);
        self.notifications.user(principal.tenant_id, saved.client_id, &notice).await;
        Ok(saved)
    }

    /// Admins may delete any document; clients only their own pending ones.
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), ServiceError> {
        let doc = self.get(principal, id).await?;
        if !principal.is_admin() && doc.status != KycStatus::Pending {
            return Err(ServiceError::invalid_state("kyc document", doc.status, "delete"));
        }
        if self.documents.delete_kyc(principal.tenant_id, id).await? {
            discard_file(&self.files, &doc.file_key).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testkit::Kit;
    use crate::storage::FileStore;

    fn service(kit: &Kit) -> KycService {
        KycService::new(kit.repo.clone(), kit.directory.clone(), kit.files.clone(), kit.notifications())
    }

    async fn submit(kit: &Kit, svc: &KycService) -> kyc_document::Model {
        let file = kit.files.put(kit.tenant_id, "passport.jpg", vec![0xff, 0xd8]).await.unwrap();
        svc.submit(&kit.client, SubmitKycInput { client_id: None, doc_type: "Passport".into(), file_key: file.key })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn review_flow() {
        let kit = Kit::new().await;
        let svc = service(&kit);
        let doc = submit(&kit, &svc).await;
        assert_eq!(doc.doc_type, "passport");
        assert_eq!(doc.status, KycStatus::Pending);

        let no_note = ReviewKycInput { decision: KycStatus::Rejected, note: Some("  ".into()) };
        assert!(matches!(svc.review(&kit.admin, doc.id, no_note).await, Err(ServiceError::Validation(_))));
        let by_client = ReviewKycInput { decision: KycStatus::Approved, note: None };
        assert!(matches!(svc.review(&kit.client, doc.id, by_client).await, Err(ServiceError::Forbidden(_))));

        let rejected = svc
            .review(&kit.admin, doc.id, ReviewKycInput { decision: KycStatus::Rejected, note: Some("Expired".into()) })
            .await
            .unwrap();
        assert_eq!(rejected.review_note.as_deref(), Some("Expired"));
        let pushes = kit.notifier.pushes_for(kit.client.user_id);
        assert!(pushes.iter().any(|p| p.body.contains("Expired")));

        let again = svc.review(&kit.admin, doc.id, ReviewKycInput { decision: KycStatus::Approved, note: None }).await;
        assert!(matches!(again, Err(ServiceError::InvalidState(_))));
        assert!(matches!(svc.delete(&kit.client, doc.id).await, Err(ServiceError::InvalidState(_))));
        svc.delete(&kit.admin, doc.id).await.unwrap();
        assert!(kit.files.get(&doc.file_key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn client_withdraws_pending_document_and_file() {
        let kit = Kit::new().await;
        let svc = service(&kit);
        let doc = submit(&kit, &svc).await;
        assert_eq!(kit.files.len(), 1);
        svc.delete(&kit.client, doc.id).await.unwrap();
        assert!(kit.files.is_empty());
    }

    #[tokio::test]
    async fn clients_see_only_their_documents() {
        let kit = Kit::new().await;
        let svc = service(&kit);
        submit(&kit, &svc).await;
        assert_eq!(svc.list(&kit.client, KycFilter::default()).await.unwrap().len(), 1);
        assert!(svc.list(&kit.other_client, KycFilter::default()).await.unwrap().is_empty());
        assert_eq!(svc.list(&kit.admin, KycFilter::default()).await.unwrap().len(), 1);
    }
}
