use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{domain::models::UserId, routes::ApiError};

/// Header carrying the caller's user id, set by the authenticating gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// A custom Axum extractor for the calling user.
///
/// Authentication happens upstream; the gateway forwards the verified user id in
/// [`USER_ID_HEADER`]. Returns 401 Unauthorized if the header is missing or is
/// not a positive integer.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: UserId,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

        let id = value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i32>().ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| ApiError::unauthorized("Invalid user identity"))?;

        Ok(AuthUser {
            id: UserId::new(id),
        })
    }
}
