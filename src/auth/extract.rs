use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use sqlx::SqlitePool;

use crate::db::Profile;
use crate::error::AppError;
use crate::store;

use super::token::TokenKeys;

/// Extractor for protected routes: takes the bearer token, verifies it,
/// and resolves the subject to an existing profile. Blocked profiles are
/// treated the same as missing ones.
pub struct AuthUser(pub Profile);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
    TokenKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        let user_id = TokenKeys::from_ref(state).verify(token)?;

        let profile = store::profile_by_id(&SqlitePool::from_ref(state), user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if profile.is_blocked {
            return Err(AppError::Unauthorized);
        }

        Ok(AuthUser(profile))
    }
}
