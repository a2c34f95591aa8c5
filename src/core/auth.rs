//! Caller identity for invoicer
//!
//! Token verification happens upstream. An [`AuthProvider`] only turns what
//! the upstream layer attached to the request into an [`AuthContext`], and
//! the service only ever sees a [`Caller`], which cannot be anonymous.

use anyhow::Result;
use async_trait::async_trait;
use axum::http::HeaderMap;

use crate::core::invoice::OwnerId;

/// Authorization context extracted from a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthContext {
    /// Authenticated user
    User { owner_id: OwnerId },

    /// No authentication
    Anonymous,
}

impl AuthContext {
    /// The caller this context authenticates, if any
    pub fn caller(&self) -> Option<Caller> {
        match self {
            AuthContext::User { owner_id } => Some(Caller::new(owner_id.clone())),
            AuthContext::Anonymous => None,
        }
    }
}

/// An authenticated caller. Every service operation takes one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    owner_id: OwnerId,
}

impl Caller {
    pub fn new(owner_id: impl Into<OwnerId>) -> Self {
        Self {
            owner_id: owner_id.into(),
        }
    }

    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    /// Whether this caller owns a record with the given owner
    pub fn owns(&self, owner_id: &OwnerId) -> bool {
        &self.owner_id == owner_id
    }
}

/// Trait for auth providers
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Extract auth context from HTTP request headers
    async fn extract_context(&self, headers: &HeaderMap) -> Result<AuthContext>;
}

/// Trusts a header set by an upstream gateway after it verified the token
#[derive(Debug, Clone)]
pub struct HeaderAuthProvider {
    header: String,
}

impl HeaderAuthProvider {
    pub const DEFAULT_HEADER: &'static str = "x-user-id";

    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into().to_ascii_lowercase(),
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }
}

impl Default for HeaderAuthProvider {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HEADER)
    }
}

#[async_trait]
impl AuthProvider for HeaderAuthProvider {
    async fn extract_context(&self, headers: &HeaderMap) -> Result<AuthContext> {
        let Some(value) = headers.get(self.header.as_str()) else {
            return Ok(AuthContext::Anonymous);
        };

        let Ok(user_id) = value.to_str() else {
            tracing::debug!(header = %self.header, "ignoring non-ascii identity header");
            return Ok(AuthContext::Anonymous);
        };

        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Ok(AuthContext::Anonymous);
        }

        Ok(AuthContext::User {
            owner_id: OwnerId::new(user_id),
        })
    }
}

/// Provider that always resolves to the same user (development and tests)
#[derive(Debug, Clone)]
pub struct StaticAuthProvider {
    owner_id: OwnerId,
}

impl StaticAuthProvider {
    pub fn new(owner_id: impl Into<OwnerId>) -> Self {
        Self {
            owner_id: owner_id.into(),
        }
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn extract_context(&self, _headers: &HeaderMap) -> Result<AuthContext> {
        Ok(AuthContext::User {
            owner_id: self.owner_id.clone(),
        })
    }
}
