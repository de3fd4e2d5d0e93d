//! Caller identity extractors.
//!
//! Interactive authentication is an external collaborator: an upstream
//! proxy authenticates organizers and injects their id as the `X-Owner-Id`
//! header. Admin endpoints are gated by a shared deployment token in
//! `X-Admin-Token`, compared in constant time so the check leaks nothing
//! about the expected value.

use crate::error::AppError;
use crate::state::AppState;
use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use constant_time_eq::constant_time_eq;
use stagepass_core::types::OwnerId;
use uuid::Uuid;

/// Header carrying the authenticated organizer id.
pub const OWNER_HEADER: &str = "x-owner-id";

/// Header carrying the admin token.
pub const ADMIN_HEADER: &str = "x-admin-token";

/// The authenticated organizer making the request.
pub struct OwnerIdentity(pub OwnerId);

#[async_trait]
impl<S> FromRequestParts<S> for OwnerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(OWNER_HEADER)
            .ok_or_else(|| AppError::unauthorized("missing owner identity"))?
            .to_str()
            .map_err(|_| AppError::unauthorized("invalid owner identity header"))?;
        let uuid = Uuid::parse_str(raw)
            .map_err(|_| AppError::unauthorized("invalid owner identity header"))?;
        Ok(Self(OwnerId::from_uuid(uuid)))
    }
}

/// Marker for a request authenticated with the admin token.
pub struct AdminCaller;

#[async_trait]
impl<S> FromRequestParts<S> for AdminCaller
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        let provided = parts
            .headers
            .get(ADMIN_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("missing admin token"))?;
        if !constant_time_eq(provided.as_bytes(), app.admin_token.as_bytes()) {
            tracing::warn!("admin endpoint called with a bad token");
            return Err(AppError::unauthorized("invalid admin token"));
        }
        Ok(Self)
    }
}
