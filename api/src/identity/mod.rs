use axum::http::{StatusCode, header, request::Parts};

use crate::{
    App,
    error::{ApiRequestError, AppError},
};

pub const COOKIE_NAME: &str = "auth_token";

#[derive(thiserror::Error, Debug)]
pub enum AuthenticationError {
    #[error(
        "Authentication required, but no bearer token or cookie `{COOKIE_NAME}` found in headers."
    )]
    NoCredentials,

    #[error(
        "Unauthorized, please check if you're logged in by refreshing the \
         page. This could be due to an expired session or token has became invalid."
    )]
    Unauthorized,
}

impl ApiRequestError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl From<AuthenticationError> for AppError {
    fn from(e: AuthenticationError) -> Self {
        AppError::from_request_error(e)
    }
}

/// The caller, as resolved from their session token. The id is trusted as-is
/// by the handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: i32,
}

/// Reads the session token from `Authorization: Bearer <token>`, falling back
/// to the auth cookie.
fn session_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_owned());
    }

    let jar = axum_extra::extract::cookie::CookieJar::from_headers(&parts.headers);
    jar.get(COOKIE_NAME).map(|c| c.value().to_owned())
}

pub struct MaybeAuthUser(pub Result<Identity, AuthenticationError>);

impl axum::extract::FromRequestParts<App> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &App) -> Result<Self, Self::Rejection> {
        let Some(session_token) = session_token(parts) else {
            return Ok(MaybeAuthUser(Err(AuthenticationError::NoCredentials)));
        };

        let identity_id = state.store.find_session_identity(&session_token).await?;

        Ok(MaybeAuthUser(
            identity_id
                .map(|id| Identity { id })
                .ok_or(AuthenticationError::Unauthorized),
        ))
    }
}

pub struct AuthUser(pub Identity);

impl axum::extract::FromRequestParts<App> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &App) -> Result<Self, Self::Rejection> {
        let MaybeAuthUser(auth_user) = MaybeAuthUser::from_request_parts(parts, state).await?;

        Ok(AuthUser(auth_user?))
    }
}
