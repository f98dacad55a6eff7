// File: src/auth.rs
// Purpose: Authentication collaborator used by challenge, forbid, sign-in and sign-out results

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::context::RequestContext;
use crate::response::HttpResponse;

/// State carried through an authentication round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationProperties {
    /// Where to send the user once the handler is done
    pub redirect_uri: Option<String>,
    pub is_persistent: bool,
    #[serde(default)]
    pub items: BTreeMap<String, String>,
}

impl AuthenticationProperties {
    pub fn redirect_to(uri: impl Into<String>) -> Self {
        Self {
            redirect_uri: Some(uri.into()),
            ..Self::default()
        }
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.is_persistent = persistent;
        self
    }

    pub fn item(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.items.insert(key.into(), value.into());
        self
    }
}

/// A single statement about the user, e.g. `("name", "ada")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub kind: String,
    pub value: String,
}

/// The user being signed in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsPrincipal {
    pub authentication_type: Option<String>,
    pub claims: Vec<Claim>,
}

impl ClaimsPrincipal {
    pub fn new(authentication_type: impl Into<String>) -> Self {
        Self {
            authentication_type: Some(authentication_type.into()),
            claims: Vec::new(),
        }
    }

    pub fn claim(mut self, kind: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.push(Claim {
            kind: kind.into(),
            value: value.into(),
        });
        self
    }

    pub fn find_first(&self, kind: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|claim| claim.kind == kind)
            .map(|claim| claim.value.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.authentication_type.is_some()
    }
}

/// Performs authentication actions for a scheme. `None` means the default scheme.
#[async_trait]
pub trait AuthenticationService: Send + Sync {
    /// Ask the client to authenticate (typically 401 or a login redirect)
    async fn challenge(
        &self,
        request: &RequestContext,
        response: &mut HttpResponse,
        scheme: Option<&str>,
        properties: Option<&AuthenticationProperties>,
    ) -> Result<()>;

    /// Tell an authenticated client it lacks access (typically 403)
    async fn forbid(
        &self,
        request: &RequestContext,
        response: &mut HttpResponse,
        scheme: Option<&str>,
        properties: Option<&AuthenticationProperties>,
    ) -> Result<()>;

    async fn sign_in(
        &self,
        request: &RequestContext,
        response: &mut HttpResponse,
        scheme: Option<&str>,
        principal: &ClaimsPrincipal,
        properties: Option<&AuthenticationProperties>,
    ) -> Result<()>;

    async fn sign_out(
        &self,
        request: &RequestContext,
        response: &mut HttpResponse,
        scheme: Option<&str>,
        properties: Option<&AuthenticationProperties>,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_claims() {
        let principal = ClaimsPrincipal::new("cookies")
            .claim("name", "ada")
            .claim("role", "admin");
        assert!(principal.is_authenticated());
        assert_eq!(principal.find_first("role"), Some("admin"));
        assert_eq!(principal.find_first("email"), None);
        assert!(!ClaimsPrincipal::default().is_authenticated());
    }

    #[test]
    fn test_properties_builder() {
        let props = AuthenticationProperties::redirect_to("/account")
            .persistent(true)
            .item("returnUrl", "/cart");
        assert_eq!(props.redirect_uri.as_deref(), Some("/account"));
        assert!(props.is_persistent);
        assert_eq!(props.items.get("returnUrl").map(String::as_str), Some("/cart"));
    }
}
