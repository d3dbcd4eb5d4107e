use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::AppError;

/// JSON body that has been deserialized and passed its `Validate` rules.
/// Either failure becomes a 400 with the usual error body.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| AppError::Validation(format!("Invalid input: {}", e.body_text())))?;

        value
            .validate()
            .map_err(|e| AppError::Validation(format!("Invalid input: {}", first_message(&e))))?;

        Ok(ValidatedJson(value))
    }
}

/// Picks one human readable message out of a (possibly nested) error tree.
fn first_message(errors: &ValidationErrors) -> String {
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(err) = list.first() {
                    return match &err.message {
                        Some(msg) => msg.to_string(),
                        None => format!("{field} is invalid"),
                    };
                }
            }
            ValidationErrorsKind::Struct(inner) => return first_message(inner),
            ValidationErrorsKind::List(items) => {
                if let Some(inner) = items.values().next() {
                    return first_message(inner);
                }
            }
        }
    }
    "invalid request".to_string()
}
