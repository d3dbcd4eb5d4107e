pub mod json;
pub mod path;

pub use json::ValidatedJson;
pub use path::PathParam;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use base64::{engine::general_purpose, Engine as _};
use std::sync::Arc;

use crate::error::AppError;
use crate::services::users::verify_credentials;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub name: String,
}

/// Splits an `Authorization: Basic ...` value into email and password.
pub fn decode_basic(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;

    let (email, password) = credentials.split_once(':')?;
    if email.is_empty() {
        return None;
    }
    Some((email.to_string(), password.to_string()))
}

// Basic Auth extractor
impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        let (email, password) = decode_basic(auth_header)
            .ok_or_else(|| AppError::Unauthorized("Malformed Basic credentials".to_string()))?;

        let user = verify_credentials(state.users.as_ref(), &email, &password).await?;

        Ok(AuthUser {
            user_id: user.id,
            email: user.email,
            name: user.name,
        })
    }
}
