//! Business services for the investment lifecycle and client documents.
//!
//! Every operation takes the calling [`Principal`]; tenant scoping and role
//! checks happen here, not in the HTTP layer.

pub mod capital_call;
pub mod commitment;
pub mod kyc;
pub mod newsletter;
pub mod product;
pub mod receipt;
pub mod statement;
pub mod subscription;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

use crate::auth::{domain::{AuthUser, Principal, Role}, repository::AuthRepository};
use crate::errors::ServiceError;
use crate::storage;

pub use capital_call::CapitalCallService;
pub use commitment::CommitmentService;
pub use kyc::KycService;
pub use newsletter::NewsletterService;
pub use product::ProductService;
pub use receipt::ReceiptService;
pub use statement::StatementService;
pub use subscription::SubscriptionService;

pub(crate) fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}

/// Resolve a client of the principal's tenant; admins and unknown ids are rejected.
pub(crate) async fn lookup_client(
    directory: &Arc<dyn AuthRepository>,
    tenant_id: Uuid,
    client_id: Uuid,
) -> Result<AuthUser, ServiceError> {
    match directory.find_user(tenant_id, client_id).await? {
        Some(u) if u.role == Role::Client => Ok(u),
        Some(_) => Err(ServiceError::Validation("user is not a client".into())),
        None => Err(ServiceError::not_found("client")),
    }
}

/// Clients act for themselves; admins must name the client.
pub(crate) fn acting_client(principal: &Principal, requested: Option<Uuid>) -> Result<Uuid, ServiceError> {
    if principal.is_admin() {
        requested.ok_or_else(|| ServiceError::Validation("client_id is required".into()))
    } else {
        match requested {
            Some(id) if id != principal.user_id => {
                Err(ServiceError::Forbidden("clients may only act for themselves".into()))
            }
            _ => Ok(principal.user_id),
        }
    }
}

/// File keys referenced by records must live under the caller's tenant.
pub(crate) fn check_file_key(principal: &Principal, key: &str) -> Result<String, ServiceError> {
    let key = key.trim();
    if !storage::key_belongs_to(key, principal.tenant_id) {
        return Err(ServiceError::Validation("file key does not belong to this tenant".into()));
    }
    Ok(key.to_string())
}

/// Best-effort removal of a stored file whose record is gone or was never written.
pub(crate) async fn discard_file(files: &Arc<dyn storage::FileStore>, key: &str) {
    match files.delete(key).await {
        Ok(_) => debug!(key, "stored file removed"),
        Err(e) => warn!(key, error = %e, "could not remove stored file"),
    }
}

/// Hide other clients' records behind NotFound rather than Forbidden.
pub(crate) fn owned<T>(principal: &Principal, row: Option<T>, client_of: impl Fn(&T) -> Uuid, entity: &str) -> Result<T, ServiceError> {
    match row {
        Some(r) if principal.is_admin() || client_of(&r) == principal.user_id => Ok(r),
        _ => Err(ServiceError::not_found(entity)),
    }
}

#[cfg(test)]
pub(crate) mod testkit {
    //! Shared fixtures for the service tests.

    use std::sync::Arc;

    use uuid::Uuid;

    use crate::auth::domain::{Principal, Role};
    use crate::auth::repository::{mock::MockAuthRepository, AuthRepository};
    use crate::notify::{mock::RecordingNotifier, Notifications};
    use crate::repository::MemoryRepository;
    use crate::storage::MemoryFileStore;

    pub struct Kit {
        pub repo: Arc<MemoryRepository>,
        pub directory: Arc<MockAuthRepository>,
        pub notifier: Arc<RecordingNotifier>,
        pub files: Arc<MemoryFileStore>,
        pub tenant_id: Uuid,
        pub admin: Principal,
        pub client: Principal,
        pub other_client: Principal,
    }

    impl Kit {
        pub async fn new() -> Self {
            let directory = Arc::new(MockAuthRepository::default());
            let tenant_id = directory.create_tenant("acme capital").await.unwrap();
            let admin = directory.create_user(tenant_id, "admin@acme.io", "Ada Admin", Role::Admin).await.unwrap();
            let client = directory.create_user(tenant_id, "carl@client.io", "Carl Client", Role::Client).await.unwrap();
            let other = directory.create_user(tenant_id, "olga@client.io", "Olga Other", Role::Client).await.unwrap();
            Kit {
                repo: Arc::new(MemoryRepository::default()),
                directory,
                notifier: Arc::new(RecordingNotifier::default()),
                files: Arc::new(MemoryFileStore::default()),
                tenant_id,
                admin: Principal::from(&admin),
                client: Principal::from(&client),
                other_client: Principal::from(&other),
            }
        }

        pub fn notifications(&self) -> Notifications {
            Notifications::new(self.notifier.clone(), self.directory.clone())
        }
    }
}
