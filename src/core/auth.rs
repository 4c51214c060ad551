//! Authentication context consumed by dashboard pages
//!
//! Pages do not own sessions. They ask an injected [`AuthProvider`] for the
//! current user and stay idle until one is available.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl CurrentUser {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            roles: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Authorization context of a page activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthContext {
    /// Authenticated user
    User(CurrentUser),

    /// No authentication
    Anonymous,
}

impl AuthContext {
    pub fn user(&self) -> Option<&CurrentUser> {
        match self {
            AuthContext::User(user) => Some(user),
            AuthContext::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthContext::User(_))
    }
}

impl From<Option<CurrentUser>> for AuthContext {
    fn from(user: Option<CurrentUser>) -> Self {
        user.map_or(AuthContext::Anonymous, AuthContext::User)
    }
}

/// Access policy of a page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthPolicy {
    /// Any authenticated user
    #[default]
    Authenticated,

    /// User must have one of these roles
    HasRole(Vec<String>),
}

impl AuthPolicy {
    /// Check if auth context satisfies this policy
    pub fn check(&self, context: &AuthContext) -> bool {
        match (self, context) {
            (_, AuthContext::Anonymous) => false,
            (AuthPolicy::Authenticated, AuthContext::User(_)) => true,
            (AuthPolicy::HasRole(required), AuthContext::User(user)) => {
                required.iter().any(|r| user.has_role(r))
            }
        }
    }

    /// Policy for an optional required role (as written in page config)
    pub fn from_required_role(role: Option<&str>) -> Self {
        match role {
            Some(role) => AuthPolicy::HasRole(vec![role.to_string()]),
            None => AuthPolicy::Authenticated,
        }
    }

    /// First role that would satisfy this policy, for error messages
    pub fn required_role(&self) -> Option<&str> {
        match self {
            AuthPolicy::Authenticated => None,
            AuthPolicy::HasRole(roles) => roles.first().map(String::as_str),
        }
    }
}

/// Trait for auth providers
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The current user, or `None` while signed out
    async fn current_user(&self) -> Result<Option<CurrentUser>>;

    /// The current user wrapped in an [`AuthContext`]
    async fn context(&self) -> Result<AuthContext> {
        Ok(self.current_user().await?.into())
    }
}

/// Provider whose user is set and cleared by the host (sign in / sign out)
#[derive(Debug, Clone, Default)]
pub struct SessionAuthProvider {
    user: Arc<RwLock<Option<CurrentUser>>>,
}

impl SessionAuthProvider {
    /// Provider with nobody signed in
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider with a user already signed in
    pub fn signed_in(user: CurrentUser) -> Self {
        Self {
            user: Arc::new(RwLock::new(Some(user))),
        }
    }

    pub fn sign_in(&self, user: CurrentUser) {
        let mut slot = self.user.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(user);
    }

    pub fn sign_out(&self) {
        let mut slot = self.user.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}

#[async_trait]
impl AuthProvider for SessionAuthProvider {
    async fn current_user(&self) -> Result<Option<CurrentUser>> {
        let slot = self.user.read().unwrap_or_else(|e| e.into_inner());
        Ok(slot.clone())
    }
}

/// Default no-auth provider (nobody is ever signed in)
pub struct NoAuthProvider;

#[async_trait]
impl AuthProvider for NoAuthProvider {
    async fn current_user(&self) -> Result<Option<CurrentUser>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_check() {
        let user_context = AuthContext::User(CurrentUser::new("ops@example.com").with_role("admin"));

        assert!(AuthPolicy::Authenticated.check(&user_context));
        assert!(AuthPolicy::HasRole(vec!["admin".into()]).check(&user_context));
        assert!(!AuthPolicy::HasRole(vec!["owner".into()]).check(&user_context));

        let anon_context = AuthContext::Anonymous;
        assert!(!AuthPolicy::Authenticated.check(&anon_context));
        assert!(!AuthPolicy::HasRole(vec!["admin".into()]).check(&anon_context));
    }

    #[test]
    fn test_policy_from_required_role() {
        assert_eq!(AuthPolicy::from_required_role(None), AuthPolicy::Authenticated);
        let policy = AuthPolicy::from_required_role(Some("admin"));
        assert_eq!(policy.required_role(), Some("admin"));
    }

    #[tokio::test]
    async fn test_session_provider_sign_in_out() {
        let provider = SessionAuthProvider::new();
        assert_eq!(provider.current_user().await.unwrap(), None);
        assert!(!provider.context().await.unwrap().is_authenticated());

        let user = CurrentUser::new("ada@example.com");
        provider.sign_in(user.clone());
        assert_eq!(provider.current_user().await.unwrap(), Some(user));

        provider.sign_out();
        assert_eq!(provider.current_user().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_no_auth_provider() {
        assert_eq!(NoAuthProvider.current_user().await.unwrap(), None);
    }
}
