//! Session and role client
//!
//! Password sign-in against the identity service plus the per-user role
//! attribute stored in the `profiles` table. Roles only gate the
//! administrator-management feature.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

use super::rest::error_message;
use super::{IdentityProvider, StoreError};

/// Auth error types
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Operation requires the super_admin role")]
    Forbidden,

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Auth service error: {0}")]
    Service(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Administrative role attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Admin,
    SuperAdmin,
}

impl Role {
    /// Only super admins may create other administrators
    pub fn can_manage_admins(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::SuperAdmin => write!(f, "super_admin"),
        }
    }
}

/// Signed-in user identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Result of a successful sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    role: Option<Role>,
}

/// Identity service client
pub struct AuthClient {
    base_url: String,
    api_key: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: None,
            client: reqwest::Client::new(),
        }
    }

    /// Use a cached access token for the current session
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn bearer(&self) -> String {
        format!(
            "Bearer {}",
            self.access_token.as_deref().unwrap_or(&self.api_key)
        )
    }

    /// Sign in with email + password
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(AuthError::InvalidCredentials(error_message(&body)));
        }
        if !status.is_success() {
            return Err(AuthError::Service(error_message(&body)));
        }

        serde_json::from_str(&body)
            .map_err(|e| AuthError::Service(format!("JSON parse error: {}", e)))
    }

    /// End the current session
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        if self.access_token.is_none() {
            return Err(AuthError::NotSignedIn);
        }
        let url = format!("{}/auth/v1/logout", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", self.bearer())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Service(error_message(&body)));
        }
        Ok(())
    }

    /// Role for `user_id`, defaulting to [`Role::Admin`] when absent or unreadable
    pub async fn role_or_default(&self, user_id: &str) -> Role {
        match self.fetch_role(user_id).await {
            Ok(role) => role.unwrap_or_default(),
            Err(e) => {
                error!(user_id, error = %e, "Error fetching role");
                Role::default()
            }
        }
    }

    /// Create another administrator through the remote `create-user` function
    pub async fn create_sub_admin(
        &self,
        caller: Role,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AuthError> {
        if !caller.can_manage_admins() {
            return Err(AuthError::Forbidden);
        }
        if self.access_token.is_none() {
            return Err(AuthError::NotSignedIn);
        }

        let url = format!("{}/functions/v1/create-user", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", self.bearer())
            .json(&json!({ "email": email, "password": password, "role": role }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AuthError::Service(error_message(&body)));
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| AuthError::Service(format!("JSON parse error: {}", e)))?;
        let user = value.get("user").cloned().unwrap_or(value);
        serde_json::from_value(user)
            .map_err(|e| AuthError::Service(format!("Unexpected user payload: {}", e)))
    }
}

#[async_trait]
impl IdentityProvider for AuthClient {
    async fn current_user(&self) -> Result<Option<User>, AuthError> {
        if self.access_token.is_none() {
            return Ok(None);
        }

        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", self.bearer())
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await?;
                let user = serde_json::from_str(&body)
                    .map_err(|e| AuthError::Service(format!("JSON parse error: {}", e)))?;
                Ok(Some(user))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!("Cached session rejected by identity service");
                Ok(None)
            }
            status => Err(AuthError::Service(format!("HTTP {}", status.as_u16()))),
        }
    }

    async fn fetch_role(&self, user_id: &str) -> Result<Option<Role>, AuthError> {
        let url = format!(
            "{}/rest/v1/profiles?select=role&id=eq.{}",
            self.base_url,
            urlencoding::encode(user_id)
        );
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", self.bearer())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::Http {
                status: status.as_u16(),
                message: error_message(&body),
            }
            .into());
        }

        let rows: Vec<ProfileRow> = serde_json::from_str(&body)
            .map_err(|e| StoreError::InvalidResponse(format!("JSON parse error: {}", e)))?;
        Ok(rows.into_iter().next().and_then(|r| r.role))
    }
}
