use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use models::user::Role;

use crate::errors::ServiceError;

/// Registration input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub tenant_id: Uuid,
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role { Role::Client }

/// First admin of a brand-new tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapInput {
    pub tenant_name: String,
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub tenant_id: Uuid,
    pub email: String,
    pub password: String,
}

/// Domain user (business view)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Domain credentials (hashed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub user_id: Uuid,
    pub password_hash: String,
    pub password_algorithm: String,
}

/// Login result (session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub token: Option<String>,
}

/// JWT claims issued at login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub uid: Uuid,
    pub tid: Uuid,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

/// The authenticated caller of a business operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }

    pub fn require_admin(&self) -> Result<(), ServiceError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::Forbidden("admin role required".into()))
        }
    }

    /// Admins see every client of their tenant; clients only themselves.
    pub fn require_client_access(&self, client_id: Uuid) -> Result<(), ServiceError> {
        if self.is_admin() || self.user_id == client_id {
            Ok(())
        } else {
            Err(ServiceError::Forbidden("record belongs to another client".into()))
        }
    }

    /// Client filter to apply on listings: `None` for admins (optionally narrowed), own id for clients.
    pub fn scope_client(&self, requested: Option<Uuid>) -> Option<Uuid> {
        if self.is_admin() { requested } else { Some(self.user_id) }
    }
}

impl From<Claims> for Principal {
    fn from(c: Claims) -> Self {
        Principal { user_id: c.uid, tenant_id: c.tid, email: c.sub, role: c.role }
    }
}

impl From<&AuthUser> for Principal {
    fn from(u: &AuthUser) -> Self {
        Principal { user_id: u.id, tenant_id: u.tenant_id, email: u.email.clone(), role: u.role }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal { user_id: Uuid::new_v4(), tenant_id: Uuid::new_v4(), email: "p@x.io".into(), role }
    }

    #[test]
    fn client_scope_is_forced_to_self() {
        let client = principal(Role::Client);
        let other = Uuid::new_v4();
        assert_eq!(client.scope_client(Some(other)), Some(client.user_id));
        assert!(client.require_client_access(other).is_err());
        assert!(client.require_client_access(client.user_id).is_ok());
        assert!(client.require_admin().is_err());
    }

    #[test]
    fn admin_scope_passes_through() {
        let admin = principal(Role::Admin);
        let other = Uuid::new_v4();
        assert_eq!(admin.scope_client(Some(other)), Some(other));
        assert_eq!(admin.scope_client(None), None);
        assert!(admin.require_client_access(other).is_ok());
    }
}
