use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::json;
use thiserror::Error;

/// A field constraint (length, emptiness, range) was not met.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("database error: {0}")]
    Database(DieselError),

    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        StoreError::NotFound { entity, id }
    }
}

// Constraint violations raised by PostgreSQL carry the constraint name in the
// message, which is all the caller needs to tell which rule was broken.
impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                StoreError::InvalidReference(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                StoreError::Validation(ValidationError::new("check", info.message()))
            }
            other => StoreError::Database(other),
        }
    }
}

/// Errors surfaced by the HTTP layer.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("media storage failed: {0}")]
    Media(anyhow::Error),

    #[error("blocking task failed: {0}")]
    Blocking(#[from] BlockingError),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Store(err) => match err {
                StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                StoreError::Conflict(_) => StatusCode::CONFLICT,
                StoreError::InvalidReference(_) => StatusCode::UNPROCESSABLE_ENTITY,
                StoreError::Validation(_) => StatusCode::BAD_REQUEST,
                StoreError::Database(_) | StoreError::Pool(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Media(_) | AppError::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self);
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(json!({ "error": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_store_error_kind() {
        let cases = [
            (AppError::from(StoreError::not_found("doctor", 3)), StatusCode::NOT_FOUND),
            (
                AppError::from(StoreError::Conflict("accounts_account_number_key".into())),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(StoreError::InvalidReference("patients_user_id_fkey".into())),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::from(ValidationError::new("address", "too long")),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Media(anyhow::anyhow!("ipfs unreachable")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status_code(), expected, "{err}");
        }
    }

    #[test]
    fn not_found_message_names_entity() {
        let err = StoreError::not_found("payment", 42);
        assert_eq!(err.to_string(), "payment with id 42 not found");
    }
}
