use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use tracing::{info, debug, instrument};

use super::domain::{AuthSession, AuthUser, BootstrapInput, Claims, LoginInput, Principal, RegisterInput, Role};
use super::errors::AuthError;
use super::repository::AuthRepository;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub password_algorithm: String,
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: None, password_algorithm: "argon2".into(), token_ttl_hours: 12 }
    }
}

/// Auth business service independent of web framework
pub struct AuthService {
    repo: Arc<dyn AuthRepository>,
    cfg: AuthConfig,
}

impl AuthService {
    pub fn new(repo: Arc<dyn AuthRepository>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Directory used by other services to look up users.
    pub fn directory(&self) -> Arc<dyn AuthRepository> { Arc::clone(&self.repo) }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::{AuthRepository, mock::MockAuthRepository}};
    /// use service::auth::domain::{RegisterInput, Role};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let tenant_id = tokio_test::block_on(repo.create_tenant("acme")).unwrap();
    /// let svc = AuthService::new(repo, AuthConfig::default());
    /// let input = RegisterInput { tenant_id, email: "user@example.com".into(), name: "Test".into(), password: "Secret123".into(), role: Role::Client };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email, tenant_id = %input.tenant_id))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        if input.password.len() < 8 {
            return Err(AuthError::Validation("password too short (>=8)".into()));
        }
        models::user::validate_email(&input.email)?;
        models::user::validate_name(&input.name)?;
        if !self.repo.tenant_exists(input.tenant_id).await? {
            return Err(AuthError::Validation("unknown tenant".into()));
        }
        if let Some(existing) = self.repo.find_user_by_tenant_email(input.tenant_id, &input.email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let hash = self.hash_password(&input.password)?;
        let user = self
            .repo
            .create_user_with_password(input.tenant_id, &input.email, &input.name, input.role, hash, self.cfg.password_algorithm.clone())
            .await?;
        info!(user_id = %user.id, tenant_id = %user.tenant_id, role = user.role.as_str(), "user_registered");
        Ok(user)
    }

    /// Create a tenant together with its first admin.
    #[instrument(skip(self, input), fields(tenant = %input.tenant_name, email = %input.email))]
    pub async fn bootstrap(&self, input: BootstrapInput) -> Result<AuthUser, AuthError> {
        models::user::validate_name(&input.tenant_name)?;
        if input.password.len() < 8 {
            return Err(AuthError::Validation("password too short (>=8)".into()));
        }
        models::user::validate_email(&input.email)?;
        models::user::validate_name(&input.name)?;
        let hash = self.hash_password(&input.password)?;
        let admin = self
            .repo
            .create_tenant_with_admin(input.tenant_name.trim(), &input.email, &input.name, hash, self.cfg.password_algorithm.clone())
            .await?;
        info!(tenant_id = %admin.tenant_id, user_id = %admin.id, "tenant_created");
        Ok(admin)
    }

    /// Authenticate a user and optionally issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{BootstrapInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig { jwt_secret: Some("secret-secret-secret".into()), ..AuthConfig::default() });
    /// let admin = tokio_test::block_on(svc.bootstrap(BootstrapInput { tenant_name: "acme".into(), email: "u@e.com".into(), name: "N".into(), password: "Passw0rd".into() })).unwrap();
    /// let session = tokio_test::block_on(svc.login(LoginInput { tenant_id: admin.tenant_id, email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(session.token.is_some());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email, tenant_id = %input.tenant_id))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_tenant_email(input.tenant_id, &input.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::Unauthorized);
        }

        let token = match &self.cfg.jwt_secret {
            Some(secret) => Some(self.issue_token(&user, secret)?),
            None => None,
        };
        info!(user_id = %user.id, "user_logged_in");
        Ok(AuthSession { user, token })
    }

    /// Decode and validate a bearer token.
    pub fn verify_token(&self, token: &str) -> Result<Principal, AuthError> {
        let secret = self.cfg.jwt_secret.as_deref().ok_or_else(|| AuthError::TokenError("no signing secret configured".into()))?;
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        Ok(Principal::from(data.claims))
    }

    pub async fn list_users(&self, principal: &Principal, role: Option<Role>) -> Result<Vec<AuthUser>, AuthError> {
        if !principal.is_admin() {
            return Err(AuthError::Forbidden("admin role required".into()));
        }
        self.repo.list_users(principal.tenant_id, role).await
    }

    pub async fn me(&self, principal: &Principal) -> Result<AuthUser, AuthError> {
        self.repo
            .find_user(principal.tenant_id, principal.user_id)
            .await?
            .ok_or(AuthError::NotFound)
    }

    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string())
    }

    fn issue_token(&self, user: &AuthUser, secret: &str) -> Result<String, AuthError> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user.email.clone(),
            uid: user.id,
            tid: user.tenant_id,
            role: user.role,
            iat: now.timestamp() as usize,
            exp: (now + chrono::Duration::hours(self.cfg.token_ttl_hours)).timestamp() as usize,
        };
        encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;

    fn svc() -> AuthService {
        AuthService::new(
            Arc::new(MockAuthRepository::default()),
            AuthConfig { jwt_secret: Some("unit-test-secret-0001".into()), ..AuthConfig::default() },
        )
    }

    async fn bootstrap(svc: &AuthService) -> AuthUser {
        svc.bootstrap(BootstrapInput {
            tenant_name: "Acme Capital".into(),
            email: "Admin@Acme.io".into(),
            name: "Ada".into(),
            password: "CorrectHorse1".into(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn bootstrap_creates_admin_and_token_round_trips() {
        let svc = svc();
        let admin = bootstrap(&svc).await;
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.email, "admin@acme.io");

        let session = svc
            .login(LoginInput { tenant_id: admin.tenant_id, email: "admin@acme.io".into(), password: "CorrectHorse1".into() })
            .await
            .unwrap();
        let principal = svc.verify_token(session.token.as_deref().unwrap()).unwrap();
        assert_eq!(principal.user_id, admin.id);
        assert_eq!(principal.tenant_id, admin.tenant_id);
        assert!(principal.is_admin());
    }

    #[tokio::test]
    async fn rejected_bootstrap_leaves_no_tenant_behind() {
        let svc = svc();
        let bad = BootstrapInput {
            tenant_name: "Acme".into(),
            email: "not-an-email".into(),
            name: "Ada".into(),
            password: "CorrectHorse1".into(),
        };
        assert!(matches!(svc.bootstrap(bad.clone()).await, Err(AuthError::Validation(_))));
        let fixed = BootstrapInput { email: "a@acme.io".into(), ..bad };
        let admin = svc.bootstrap(fixed.clone()).await.unwrap();
        assert_eq!(admin.email, "a@acme.io");
        let session = svc
            .login(LoginInput { tenant_id: admin.tenant_id, email: "a@acme.io".into(), password: "CorrectHorse1".into() })
            .await
            .unwrap();
        assert_eq!(session.user.id, admin.id);

        let dup = svc.bootstrap(fixed).await.unwrap_err();
        assert!(matches!(dup, AuthError::TenantConflict));
        assert_eq!(dup.to_string(), "tenant already exists");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let svc = svc();
        let admin = bootstrap(&svc).await;
        let err = svc
            .login(LoginInput { tenant_id: admin.tenant_id, email: "admin@acme.io".into(), password: "nope-nope".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn register_rejects_duplicates_and_unknown_tenants() {
        let svc = svc();
        let admin = bootstrap(&svc).await;
        let input = RegisterInput {
            tenant_id: admin.tenant_id,
            email: "client@acme.io".into(),
            name: "Cli".into(),
            password: "ClientPass1".into(),
            role: Role::Client,
        };
        svc.register(input.clone()).await.unwrap();
        assert!(matches!(svc.register(input.clone()).await, Err(AuthError::Conflict)));

        let stray = RegisterInput { tenant_id: uuid::Uuid::new_v4(), ..input };
        assert!(matches!(svc.register(stray).await, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let svc = svc();
        let admin = bootstrap(&svc).await;
        let session = svc
            .login(LoginInput { tenant_id: admin.tenant_id, email: "admin@acme.io".into(), password: "CorrectHorse1".into() })
            .await
            .unwrap();
        let mut token = session.token.unwrap();
        token.push('x');
        assert!(svc.verify_token(&token).is_err());
    }

    #[tokio::test]
    async fn clients_cannot_list_users() {
        let svc = svc();
        let admin = bootstrap(&svc).await;
        let client = svc
            .register(RegisterInput {
                tenant_id: admin.tenant_id,
                email: "c@acme.io".into(),
                name: "C".into(),
                password: "ClientPass1".into(),
                role: Role::Client,
            })
            .await
            .unwrap();
        let as_client = Principal::from(&client);
        assert!(svc.list_users(&as_client, None).await.is_err());
        let as_admin = Principal::from(&admin);
        assert_eq!(svc.list_users(&as_admin, Some(Role::Client)).await.unwrap().len(), 1);
    }
}
