use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials, Role};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
///
/// Also serves as the user directory other services use to address notifications.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn create_tenant(&self, name: &str) -> Result<Uuid, AuthError>;
    async fn tenant_exists(&self, tenant_id: Uuid) -> Result<bool, AuthError>;

    async fn find_user_by_tenant_email(&self, tenant_id: Uuid, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Option<AuthUser>, AuthError>;
    async fn list_users(&self, tenant_id: Uuid, role: Option<Role>) -> Result<Vec<AuthUser>, AuthError>;
    async fn create_user(&self, tenant_id: Uuid, email: &str, name: &str, role: Role) -> Result<AuthUser, AuthError>;
    /// Inserts the user and its credentials atomically.
    async fn create_user_with_password(
        &self,
        tenant_id: Uuid,
        email: &str,
        name: &str,
        role: Role,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<AuthUser, AuthError>;
    /// Inserts the tenant, its first admin and the admin's credentials atomically.
    async fn create_tenant_with_admin(
        &self,
        tenant_name: &str,
        email: &str,
        name: &str,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<AuthUser, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        tenants: Mutex<HashMap<Uuid, String>>,
        users: Mutex<HashMap<(Uuid, String), AuthUser>>, // key: (tenant_id, email)
        creds: Mutex<HashMap<Uuid, Credentials>>,        // key: user_id
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn create_tenant(&self, name: &str) -> Result<Uuid, AuthError> {
            let mut tenants = self.tenants.lock().unwrap();
            if tenants.values().any(|n| n == name) {
                return Err(AuthError::TenantConflict);
            }
            let id = Uuid::new_v4();
            tenants.insert(id, name.to_string());
            Ok(id)
        }

        async fn tenant_exists(&self, tenant_id: Uuid) -> Result<bool, AuthError> {
            Ok(self.tenants.lock().unwrap().contains_key(&tenant_id))
        }

        async fn find_user_by_tenant_email(&self, tenant_id: Uuid, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(&(tenant_id, email.to_ascii_lowercase())).cloned())
        }

        async fn find_user(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.values().find(|u| u.tenant_id == tenant_id && u.id == user_id).cloned())
        }

        async fn list_users(&self, tenant_id: Uuid, role: Option<Role>) -> Result<Vec<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            let mut out: Vec<AuthUser> = users
                .values()
                .filter(|u| u.tenant_id == tenant_id && role.map_or(true, |r| u.role == r))
                .cloned()
                .collect();
            out.sort_by(|a, b| a.email.cmp(&b.email));
            Ok(out)
        }

        async fn create_user(&self, tenant_id: Uuid, email: &str, name: &str, role: Role) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().unwrap();
            let key = (tenant_id, email.to_ascii_lowercase());
            if users.contains_key(&key) {
                return Err(AuthError::Conflict);
            }
            let user = AuthUser { id: Uuid::new_v4(), tenant_id, email: key.1.clone(), name: name.to_string(), role };
            users.insert(key, user.clone());
            Ok(user)
        }

        async fn create_user_with_password(
            &self,
            tenant_id: Uuid,
            email: &str,
            name: &str,
            role: Role,
            password_hash: String,
            password_algorithm: String,
        ) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().unwrap();
            let mut creds = self.creds.lock().unwrap();
            let key = (tenant_id, email.trim().to_ascii_lowercase());
            if users.contains_key(&key) {
                return Err(AuthError::Conflict);
            }
            let user = AuthUser { id: Uuid::new_v4(), tenant_id, email: key.1.clone(), name: name.trim().to_string(), role };
            creds.insert(user.id, Credentials { user_id: user.id, password_hash, password_algorithm });
            users.insert(key, user.clone());
            Ok(user)
        }

        async fn create_tenant_with_admin(
            &self,
            tenant_name: &str,
            email: &str,
            name: &str,
            password_hash: String,
            password_algorithm: String,
        ) -> Result<AuthUser, AuthError> {
            let mut tenants = self.tenants.lock().unwrap();
            if tenants.values().any(|n| n == tenant_name.trim()) {
                return Err(AuthError::TenantConflict);
            }
            let tenant_id = Uuid::new_v4();
            let user = AuthUser {
                id: Uuid::new_v4(),
                tenant_id,
                email: email.trim().to_ascii_lowercase(),
                name: name.trim().to_string(),
                role: Role::Admin,
            };
            tenants.insert(tenant_id, tenant_name.trim().to_string());
            self.creds
                .lock()
                .unwrap()
                .insert(user.id, Credentials { user_id: user.id, password_hash, password_algorithm });
            self.users.lock().unwrap().insert((tenant_id, user.email.clone()), user.clone());
            Ok(user)
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().unwrap();
            Ok(creds.get(&user_id).cloned())
        }

        async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
            let mut creds = self.creds.lock().unwrap();
            let c = Credentials { user_id, password_hash, password_algorithm };
            creds.insert(user_id, c.clone());
            Ok(c)
        }
    }
}
