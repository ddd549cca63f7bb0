//! Session authentication extractors.
//!
//! The session is a signed token in an HttpOnly cookie. Taking an
//! [`Identity`] argument makes a handler login-only: without a valid session
//! the request is redirected to the login page with `?next=` pointing back at
//! the page that was asked for.

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::http::{StatusCode, header};
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, dev::Payload, web};
use futures::future::LocalBoxFuture;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::fmt;

use yatube_core::error::RepoError;
use yatube_core::ports::{AuthError, BaseRepository};

use crate::config::SiteSettings;
use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Characters left as-is in `next`: unreserved ones plus the path separator.
const NEXT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Login page URL that returns to `next` afterwards.
pub fn login_redirect(login_url: &str, next: &str) -> String {
    format!(
        "{}?next={}",
        login_url,
        utf8_percent_encode(next, NEXT_ENCODE_SET)
    )
}

/// Accept `next` only when it is a path on this site.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

/// Cookie carrying a freshly issued session token.
pub fn session_cookie(token: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::seconds(max_age_secs))
        .finish()
}

/// Cookie that clears the session in the browser.
pub fn expired_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// Authenticated user identity extractor.
///
/// ```ignore
/// async fn new_post(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
}

/// Why a login-only request could not proceed.
#[derive(Debug)]
pub enum AuthenticationError {
    /// No usable session; send the visitor to the login page.
    LoginRequired { reason: AuthError, redirect_to: String },
    /// The session could not be checked against storage.
    Storage(RepoError),
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthenticationError::LoginRequired { reason, .. } => {
                write!(f, "Login required: {}", reason)
            }
            AuthenticationError::Storage(e) => write!(f, "Session lookup failed: {}", e),
        }
    }
}

impl ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthenticationError::LoginRequired { .. } => StatusCode::FOUND,
            AuthenticationError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AuthenticationError::LoginRequired { reason, redirect_to } => {
                tracing::debug!(%reason, "Redirecting to login");
                HttpResponse::Found()
                    .insert_header((header::LOCATION, redirect_to.as_str()))
                    .finish()
            }
            AuthenticationError::Storage(e) => {
                tracing::error!("Session lookup failed: {}", e);
                HttpResponse::InternalServerError().body("Internal Server Error")
            }
        }
    }
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = req.cookie(SESSION_COOKIE).map(|c| c.value().to_string());

        let login_url = state
            .as_ref()
            .map(|s| s.settings.login_url.clone())
            .unwrap_or_else(|| SiteSettings::default().login_url);
        let requested = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let redirect_to = login_redirect(&login_url, requested);

        Box::pin(async move {
            let login_required = |reason| AuthenticationError::LoginRequired {
                reason,
                redirect_to: redirect_to.clone(),
            };

            let state = match state {
                Some(state) => state,
                None => {
                    tracing::error!("AppState not found in app data");
                    return Err(login_required(AuthError::InvalidToken(
                        "Server configuration error".to_string(),
                    )));
                }
            };
            let token = token.ok_or_else(|| login_required(AuthError::MissingAuth))?;
            let claims = state.tokens.validate_token(&token).map_err(login_required)?;

            // The account may have been removed since the token was issued.
            let user = state
                .users
                .find_by_id(claims.user_id)
                .await
                .map_err(AuthenticationError::Storage)?
                .ok_or_else(|| login_required(AuthError::InvalidCredentials))?;

            Ok(Identity {
                user_id: user.id,
                username: user.username,
            })
        })
    }
}

/// Optional identity extractor - doesn't fail if not authenticated.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn as_ref(&self) -> Option<&Identity> {
        self.0.as_ref()
    }
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let identity = Identity::from_request(req, payload);
        Box::pin(async move {
            match identity.await {
                Ok(identity) => Ok(OptionalIdentity(Some(identity))),
                Err(AuthenticationError::Storage(e)) => {
                    tracing::warn!("Treating request as anonymous: {}", e);
                    Ok(OptionalIdentity(None))
                }
                Err(_) => Ok(OptionalIdentity(None)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect_keeps_slashes() {
        assert_eq!(
            login_redirect("/auth/login/", "/test_user/1/edit/"),
            "/auth/login/?next=/test_user/1/edit/"
        );
    }

    #[test]
    fn test_login_redirect_encodes_query() {
        assert_eq!(
            login_redirect("/auth/login/", "/new/?page=2&x=y"),
            "/auth/login/?next=/new/%3Fpage%3D2%26x%3Dy"
        );
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/alice/1/edit/")), Some("/alice/1/edit/"));
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("https://evil.example/")), None);
        assert_eq!(safe_next(Some("/\\evil.example")), None);
        assert_eq!(safe_next(None), None);
    }
}
