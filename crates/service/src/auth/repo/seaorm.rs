use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, TransactionTrait};
use uuid::Uuid;

use crate::auth::domain::{AuthUser, Credentials, Role};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

fn to_auth_user(u: models::user::Model) -> AuthUser {
    AuthUser { id: u.id, tenant_id: u.tenant_id, email: u.email, name: u.name, role: u.role }
}

fn repo_err(e: impl ToString) -> AuthError {
    AuthError::Repository(e.to_string())
}

async fn insert_account<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    email: &str,
    name: &str,
    role: Role,
    password_hash: String,
    password_algorithm: &str,
) -> Result<AuthUser, AuthError> {
    let taken = models::user::Entity::find()
        .filter(models::user::Column::TenantId.eq(tenant_id))
        .filter(models::user::Column::Email.eq(email.trim().to_ascii_lowercase()))
        .one(db)
        .await
        .map_err(repo_err)?;
    if taken.is_some() {
        return Err(AuthError::Conflict);
    }
    let user = models::user::create(db, tenant_id, email, name, role).await?;
    models::user_credentials::upsert_password(db, user.id, password_hash, password_algorithm).await?;
    Ok(to_auth_user(user))
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn create_tenant(&self, name: &str) -> Result<Uuid, AuthError> {
        let existing = models::tenant::Entity::find()
            .filter(models::tenant::Column::Name.eq(name.trim()))
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        if existing.is_some() {
            return Err(AuthError::TenantConflict);
        }
        let created = models::tenant::create(&self.db, name).await?;
        Ok(created.id)
    }

    async fn tenant_exists(&self, tenant_id: Uuid) -> Result<bool, AuthError> {
        let found = models::tenant::Entity::find_by_id(tenant_id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(found.is_some())
    }

    async fn find_user_by_tenant_email(&self, tenant_id: Uuid, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::Entity::find()
            .filter(models::user::Column::TenantId.eq(tenant_id))
            .filter(models::user::Column::Email.eq(email.trim().to_ascii_lowercase()))
            .filter(models::user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(to_auth_user))
    }

    async fn find_user(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::Entity::find_by_id(user_id)
            .filter(models::user::Column::TenantId.eq(tenant_id))
            .filter(models::user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(to_auth_user))
    }

    async fn list_users(&self, tenant_id: Uuid, role: Option<Role>) -> Result<Vec<AuthUser>, AuthError> {
        let mut finder = models::user::Entity::find()
            .filter(models::user::Column::TenantId.eq(tenant_id))
            .filter(models::user::Column::DeletedAt.is_null());
        if let Some(r) = role {
            finder = finder.filter(models::user::Column::Role.eq(r));
        }
        let rows = finder
            .order_by_asc(models::user::Column::Email)
            .all(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(rows.into_iter().map(to_auth_user).collect())
    }

    async fn create_user(&self, tenant_id: Uuid, email: &str, name: &str, role: Role) -> Result<AuthUser, AuthError> {
        let created = models::user::create(&self.db, tenant_id, email, name, role).await?;
        Ok(to_auth_user(created))
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
        let txn = self.db.begin().await.map_err(repo_err)?;
        let user = insert_account(&txn, tenant_id, email, name, role, password_hash, &password_algorithm).await?;
        txn.commit().await.map_err(repo_err)?;
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
        let txn = self.db.begin().await.map_err(repo_err)?;
        let existing = models::tenant::Entity::find()
            .filter(models::tenant::Column::Name.eq(tenant_name.trim()))
            .one(&txn)
            .await
            .map_err(repo_err)?;
        if existing.is_some() {
            return Err(AuthError::TenantConflict);
        }
        let tenant = models::tenant::create(&txn, tenant_name).await?;
        let user = insert_account(&txn, tenant.id, email, name, Role::Admin, password_hash, &password_algorithm).await?;
        txn.commit().await.map_err(repo_err)?;
        Ok(user)
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = models::user_credentials::Entity::find()
            .filter(models::user_credentials::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(|c| Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }))
    }

    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
        let c = models::user_credentials::upsert_password(&self.db, user_id, password_hash, &password_algorithm)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm })
    }
}
