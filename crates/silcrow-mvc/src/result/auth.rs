// File: src/result/auth.rs
// Purpose: Results that defer to the authentication service

use crate::auth::{AuthenticationProperties, ClaimsPrincipal};

/// Challenge each scheme in order, or the default scheme when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChallengeResult {
    pub schemes: Vec<String>,
    pub properties: Option<AuthenticationProperties>,
}

impl ChallengeResult {
    pub fn new<I, S>(schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            schemes: schemes.into_iter().map(Into::into).collect(),
            properties: None,
        }
    }

    pub fn properties(mut self, properties: AuthenticationProperties) -> Self {
        self.properties = Some(properties);
        self
    }
}

/// Forbid each scheme in order, or the default scheme when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForbidResult {
    pub schemes: Vec<String>,
    pub properties: Option<AuthenticationProperties>,
}

impl ForbidResult {
    pub fn new<I, S>(schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            schemes: schemes.into_iter().map(Into::into).collect(),
            properties: None,
        }
    }

    pub fn properties(mut self, properties: AuthenticationProperties) -> Self {
        self.properties = Some(properties);
        self
    }
}

/// Sign a principal in with one scheme (default when `None`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInResult {
    pub scheme: Option<String>,
    pub principal: ClaimsPrincipal,
    pub properties: Option<AuthenticationProperties>,
}

impl SignInResult {
    pub fn new(principal: ClaimsPrincipal) -> Self {
        Self {
            scheme: None,
            principal,
            properties: None,
        }
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn properties(mut self, properties: AuthenticationProperties) -> Self {
        self.properties = Some(properties);
        self
    }
}

/// Sign out of each scheme in order, or the default scheme when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignOutResult {
    pub schemes: Vec<String>,
    pub properties: Option<AuthenticationProperties>,
}

impl SignOutResult {
    pub fn new<I, S>(schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            schemes: schemes.into_iter().map(Into::into).collect(),
            properties: None,
        }
    }

    pub fn properties(mut self, properties: AuthenticationProperties) -> Self {
        self.properties = Some(properties);
        self
    }
}
