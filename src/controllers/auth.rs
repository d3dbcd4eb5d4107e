use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::info;

use crate::error::AppResult;
use crate::middleware::{AuthUser, ValidatedJson};
use crate::models::{LoginRequest, SignupRequest, User};
use crate::services::users::{hash_password, normalize_email, verify_credentials, NewUser};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/user", get(me))
}

// POST /api/auth/signup
async fn signup(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let password_hash = hash_password(req.password, state.config.auth.bcrypt_cost).await?;
    let user = state
        .users
        .create_user(NewUser {
            email: normalize_email(&req.email),
            password_hash,
            name: req.name,
            phone: req.phone,
            city: req.city,
        })
        .await?;

    info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

// POST /api/auth/login
// Credentials are checked here; later requests repeat them as Basic auth.
async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> AppResult<Json<User>> {
    let user = verify_credentials(state.users.as_ref(), &req.email, &req.password).await?;
    Ok(Json(user))
}

// POST /api/auth/logout
// Nothing is held server-side; the client just stops sending credentials.
async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

// GET /api/user
async fn me(State(state): State<Arc<AppState>>, user: AuthUser) -> AppResult<Json<User>> {
    Ok(Json(state.users.get_user(user.user_id).await?))
}
