use axum::http::{StatusCode, request::Parts};

use crate::{App, error::ApiRequestError, error::AppError};

use self::models::{identity::Identity, session::find_identity_by_token};

pub mod models;

pub const COOKIE_NAME: &str = "auth_token";

#[derive(thiserror::Error, Debug)]
pub enum AuthenticationError {
    #[error("Authentication required, but no cookie `{COOKIE_NAME}` found in headers.")]
    NoCookie,

    #[error(
        "Unauthorized, please check if you're logged in by refreshing the \
         page. This could be due to an expired session or token has became invalid."
    )]
    Unauthorized,

    #[error("Only the site owner can do this.")]
    NotOwner,
}

impl ApiRequestError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthenticationError::NotOwner => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

pub struct MaybeAuthUser(pub Result<Identity, AuthenticationError>);

impl MaybeAuthUser {
    pub fn id(&self) -> Option<i32> {
        self.0.as_ref().ok().map(|identity| identity.id)
    }
}

impl axum::extract::FromRequestParts<App> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &App) -> Result<Self, Self::Rejection> {
        let jar = axum_extra::extract::cookie::CookieJar::from_headers(&parts.headers);

        let session_token: &str = if let Some(t) = jar.get(COOKIE_NAME) {
            t.value()
        } else {
            return Ok(MaybeAuthUser(Err(AuthenticationError::NoCookie)));
        };

        let mut conn = state.diesel.get().await?;
        let found = find_identity_by_token(&mut conn, session_token).await?;

        if let Some((session, identity)) = &found {
            tracing::trace!(session_id = session.id, identity_id = identity.id, "Session resolved");
        }

        Ok(MaybeAuthUser(
            found
                .map(|(_, identity)| identity)
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

/// The site owner, the only identity allowed to edit content and moderate.
pub struct AdminUser(pub Identity);

impl axum::extract::FromRequestParts<App> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &App) -> Result<Self, Self::Rejection> {
        let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;

        if identity.id != state.config.owner_identity_id {
            tracing::warn!(identity_id = identity.id, "Non-owner tried an admin route");
            return Err(AuthenticationError::NotOwner.into());
        }

        Ok(AdminUser(identity))
    }
}
