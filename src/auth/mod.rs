mod extract;
mod password;
mod signin;
mod signup;
mod token;

use axum::{
    Json, Router,
    routing::{get, post},
};

use crate::AppState;
use crate::db::Profile;
use crate::error::AppResult;

pub use extract::AuthUser;
pub use signin::SigninRequest;
pub use signup::{AuthResponse, SignupRequest};
pub use token::TokenKeys;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup::signup))
        .route("/signin", post(signin::signin))
        .route("/user", get(current_user))
}

/// Exchanges a bearer token for its profile; this is what the client's
/// session restore calls on startup.
#[axum::debug_handler(state = AppState)]
async fn current_user(AuthUser(user): AuthUser) -> AppResult<Json<Profile>> {
    Ok(Json(user))
}
