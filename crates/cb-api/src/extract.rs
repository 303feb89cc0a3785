//! Identity extractors, mirroring the three route guards:
//! signed in ([`CurrentUser`]), maybe signed in ([`MaybeUser`]) and admin ([`AdminUser`]).

use std::convert::Infallible;
use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use cb_core::models::User;
use uuid::Uuid;

use crate::cookie;
use crate::error::ApiError;
use crate::state::AppState;

/// A request carrying a valid access token.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

/// Any request; the id is present when a valid access token was sent.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<Uuid>);

/// A request from an account with the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

fn token_user(parts: &Parts, state: &AppState) -> Option<Uuid> {
    cookie::read_token(&parts.headers).and_then(|token| state.auth.authenticate(&token))
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        token_user(parts, state)
            .map(CurrentUser)
            .ok_or_else(ApiError::unauthorized)
    }
}

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(token_user(parts, state)))
    }
}

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(id) = CurrentUser::from_request_parts(parts, state).await?;
        let admin = state.auth.require_admin(id).await?;
        Ok(AdminUser(admin))
    }
}
