//! Outbound email and push notifications.
//!
//! Delivery is best-effort: callers go through [`Notifications`], which logs
//! failures and never propagates them into the business operation.

pub mod http;

pub use http::HttpNotifier;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::{domain::{AuthUser, Role}, repository::AuthRepository};
use crate::metrics;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("rejected by provider: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_email(&self, msg: &EmailMessage) -> Result<(), NotifyError>;
    async fn send_push(&self, msg: &PushMessage) -> Result<(), NotifyError>;
}

/// Notifier that only writes to the log; used when no SaaS endpoints are configured.
#[derive(Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_email(&self, msg: &EmailMessage) -> Result<(), NotifyError> {
        info!(to = %msg.to, subject = %msg.subject, "email (log only)");
        Ok(())
    }

    async fn send_push(&self, msg: &PushMessage) -> Result<(), NotifyError> {
        info!(user_id = %msg.user_id, title = %msg.title, "push (log only)");
        Ok(())
    }
}

/// What happened, addressed to one or more users.
#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: &'static str,
    pub subject: String,
    pub body: String,
    pub record_id: Uuid,
}

impl Notice {
    pub fn new(kind: &'static str, record_id: Uuid, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self { kind, subject: subject.into(), body: body.into(), record_id }
    }

    fn push_for(&self, user_id: Uuid) -> PushMessage {
        PushMessage {
            user_id,
            title: self.subject.clone(),
            body: self.body.clone(),
            data: serde_json::json!({ "kind": self.kind, "id": self.record_id }),
        }
    }
}

/// Resolves recipients through the user directory and fans out email + push.
#[derive(Clone)]
pub struct Notifications {
    notifier: Arc<dyn Notifier>,
    directory: Arc<dyn AuthRepository>,
}

impl Notifications {
    pub fn new(notifier: Arc<dyn Notifier>, directory: Arc<dyn AuthRepository>) -> Self {
        Self { notifier, directory }
    }

    /// Email + push to a single user.
    pub async fn user(&self, tenant_id: Uuid, user_id: Uuid, notice: &Notice) {
        match self.directory.find_user(tenant_id, user_id).await {
            Ok(Some(user)) => self.deliver(&user, notice, true).await,
            Ok(None) => warn!(%user_id, kind = notice.kind, "notification recipient not found"),
            Err(e) => warn!(%user_id, kind = notice.kind, error = %e, "recipient lookup failed"),
        }
    }

    /// Email every admin of the tenant.
    pub async fn admins(&self, tenant_id: Uuid, notice: &Notice) {
        self.role(tenant_id, Role::Admin, notice, false).await
    }

    /// Push to every client of the tenant.
    pub async fn clients_push(&self, tenant_id: Uuid, notice: &Notice) {
        match self.directory.list_users(tenant_id, Some(Role::Client)).await {
            Ok(users) => {
                for u in users {
                    self.push(&notice.push_for(u.id), notice.kind).await;
                }
            }
            Err(e) => warn!(%tenant_id, kind = notice.kind, error = %e, "client lookup failed"),
        }
    }

    async fn role(&self, tenant_id: Uuid, role: Role, notice: &Notice, with_push: bool) {
        match self.directory.list_users(tenant_id, Some(role)).await {
            Ok(users) => {
                for u in users {
                    self.deliver(&u, notice, with_push).await;
                }
            }
            Err(e) => warn!(%tenant_id, kind = notice.kind, error = %e, "recipient lookup failed"),
        }
    }

    async fn deliver(&self, user: &AuthUser, notice: &Notice, with_push: bool) {
        let email = EmailMessage { to: user.email.clone(), subject: notice.subject.clone(), body: notice.body.clone() };
        match self.notifier.send_email(&email).await {
            Ok(()) => debug!(user_id = %user.id, kind = notice.kind, "email sent"),
            Err(e) => {
                metrics::NOTIFICATION_FAILURES_TOTAL.with_label_values(&["email"]).inc();
                warn!(user_id = %user.id, kind = notice.kind, error = %e, "email delivery failed");
            }
        }
        if with_push {
            self.push(&notice.push_for(user.id), notice.kind).await;
        }
    }

    async fn push(&self, msg: &PushMessage, kind: &str) {
        if let Err(e) = self.notifier.send_push(msg).await {
            metrics::NOTIFICATION_FAILURES_TOTAL.with_label_values(&["push"]).inc();
            warn!(user_id = %msg.user_id, kind, error = %e, "push delivery failed");
        }
    }
}

/// Recording notifier for tests.
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingNotifier {
        pub emails: Mutex<Vec<EmailMessage>>,
        pub pushes: Mutex<Vec<PushMessage>>,
        pub fail: bool,
    }

    impl RecordingNotifier {
        pub fn failing() -> Self { Self { fail: true, ..Default::default() } }

        pub fn emails_to(&self, to: &str) -> Vec<EmailMessage> {
            self.emails.lock().unwrap().iter().filter(|m| m.to == to).cloned().collect()
        }

        pub fn pushes_for(&self, user_id: Uuid) -> Vec<PushMessage> {
            self.pushes.lock().unwrap().iter().filter(|m| m.user_id == user_id).cloned().collect()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_email(&self, msg: &EmailMessage) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Transport("simulated outage".into()));
            }
            self.emails.lock().unwrap().push(msg.clone());
            Ok(())
        }

        async fn send_push(&self, msg: &PushMessage) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Transport("simulated outage".into()));
            }
            self.pushes.lock().unwrap().push(msg.clone());
            Ok(())
        }
    }
}
