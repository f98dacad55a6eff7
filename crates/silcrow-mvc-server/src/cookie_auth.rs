// File: src/cookie_auth.rs
// Purpose: Minimal cookie authentication used by the demo routes

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::http::header::{LOCATION, SET_COOKIE, WWW_AUTHENTICATE};
use axum::http::StatusCode;
use silcrow_mvc::response::HttpResponse;
use silcrow_mvc::{AuthenticationProperties, AuthenticationService, ClaimsPrincipal, RequestContext};

const COOKIE_NAME: &str = "silcrow_session";
const BEARER: &str = "bearer";

/// Signs users in with a session cookie; `bearer` challenges answer 401.
pub struct CookieAuthentication {
    login_path: String,
}

impl CookieAuthentication {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }

    fn login_redirect(&self, properties: Option<&AuthenticationProperties>) -> String {
        match properties.and_then(|p| p.redirect_uri.as_deref()) {
            Some(return_url) => format!(
                "{}?return_url={}",
                self.login_path,
                urlencoding::encode(return_url)
            ),
            None => self.login_path.clone(),
        }
    }
}

#[async_trait]
impl AuthenticationService for CookieAuthentication {
    async fn challenge(
        &self,
        request: &RequestContext,
        response: &mut HttpResponse,
        scheme: Option<&str>,
        properties: Option<&AuthenticationProperties>,
    ) -> Result<()> {
        if scheme == Some(BEARER) {
            response.set_status(StatusCode::UNAUTHORIZED)?;
            response.set_header(WWW_AUTHENTICATE, "Bearer")?;
            return Ok(());
        }

        let location = self.login_redirect(properties);
        tracing::debug!("Challenging {} with redirect to {}", request.path, location);
        response.set_status(StatusCode::FOUND)?;
        response.set_header(LOCATION, &location)?;
        Ok(())
    }

    async fn forbid(
        &self,
        _request: &RequestContext,
        response: &mut HttpResponse,
        _scheme: Option<&str>,
        _properties: Option<&AuthenticationProperties>,
    ) -> Result<()> {
        response.set_status(StatusCode::FORBIDDEN)?;
        Ok(())
    }

    async fn sign_in(
        &self,
        _request: &RequestContext,
        response: &mut HttpResponse,
        _scheme: Option<&str>,
        principal: &ClaimsPrincipal,
        properties: Option<&AuthenticationProperties>,
    ) -> Result<()> {
        let name = principal
            .find_first("name")
            .context("Principal has no name claim")?;
        let max_age = if properties.map_or(false, |p| p.is_persistent) {
            "; Max-Age=2592000"
        } else {
            ""
        };
        response.set_header(
            SET_COOKIE,
            &format!("{}={}; Path=/; HttpOnly{}", COOKIE_NAME, urlencoding::encode(name), max_age),
        )?;
        if let Some(redirect) = properties.and_then(|p| p.redirect_uri.as_deref()) {
            response.set_status(StatusCode::FOUND)?;
            response.set_header(LOCATION, redirect)?;
        }
        Ok(())
    }

    async fn sign_out(
        &self,
        _request: &RequestContext,
        response: &mut HttpResponse,
        _scheme: Option<&str>,
        properties: Option<&AuthenticationProperties>,
    ) -> Result<()> {
        response.set_header(
            SET_COOKIE,
            &format!("{}=; Path=/; HttpOnly; Max-Age=0", COOKIE_NAME),
        )?;
        if let Some(redirect) = properties.and_then(|p| p.redirect_uri.as_deref()) {
            response.set_status(StatusCode::FOUND)?;
            response.set_header(LOCATION, redirect)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use pretty_assertions::assert_eq;

    fn request() -> RequestContext {
        RequestContext::new(Method::GET, "/account")
    }

    #[tokio::test]
    async fn test_cookie_challenge_redirects_to_login() {
        let auth = CookieAuthentication::new("/login");
        let mut response = HttpResponse::new();
        let properties = AuthenticationProperties::redirect_to("/account?tab=2");

        auth.challenge(&request(), &mut response, None, Some(&properties))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.header_str(LOCATION),
            Some("/login?return_url=%2Faccount%3Ftab%3D2")
        );
    }

    #[tokio::test]
    async fn test_bearer_challenge_is_401() {
        let auth = CookieAuthentication::new("/login");
        let mut response = HttpResponse::new();

        auth.challenge(&request(), &mut response, Some("bearer"), None)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.header_str(WWW_AUTHENTICATE), Some("Bearer"));
    }

    #[tokio::test]
    async fn test_sign_in_requires_name() {
        let auth = CookieAuthentication::new("/login");
        let mut response = HttpResponse::new();
        let principal = ClaimsPrincipal::new("cookies");

        let outcome = auth
            .sign_in(&request(), &mut response, None, &principal, None)
            .await;
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn test_sign_in_sets_cookie() {
        let auth = CookieAuthentication::new("/login");
        let mut response = HttpResponse::new();
        let principal = ClaimsPrincipal::new("cookies").claim("name", "ada");
        let properties = AuthenticationProperties::redirect_to("/").persistent(true);

        auth.sign_in(&request(), &mut response, None, &principal, Some(&properties))
            .await
            .unwrap();

        assert_eq!(
            response.header_str(SET_COOKIE),
            Some("silcrow_session=ada; Path=/; HttpOnly; Max-Age=2592000")
        );
        assert_eq!(response.status(), StatusCode::FOUND);
    }
}
