pub mod accounts;
pub mod appointments;
pub mod discharges;
pub mod doctors;
pub mod patients;
pub mod payments;
pub mod users;

use actix_web::error::BlockingError;
use actix_web::{HttpResponse, Responder};

use crate::error::{AppError, StoreError};
use crate::media::{decode_picture, MediaStore};

pub async fn hello() -> impl Responder {
    HttpResponse::Ok().body("Hello, hospital!")
}

/// Uploads an optional base64 picture and returns its media reference.
pub(crate) async fn store_picture(
    media: &dyn MediaStore,
    folder: &str,
    encoded: Option<String>,
) -> Result<Option<String>, AppError> {
    let Some(encoded) = encoded else {
        return Ok(None);
    };
    let bytes = decode_picture(&encoded)?;
    let reference = media.put(folder, bytes).await.map_err(AppError::Media)?;
    tracing::debug!(%reference, "Stored profile picture");
    Ok(Some(reference))
}

/// Passes a store result through, dropping the picture uploaded for it when
/// the record could not be written.
pub(crate) async fn release_picture_on_error<T>(
    media: &dyn MediaStore,
    reference: Option<String>,
    result: Result<Result<T, StoreError>, BlockingError>,
) -> Result<T, AppError> {
    let result = result
        .map_err(AppError::from)
        .and_then(|inner| inner.map_err(AppError::from));
    if let (Err(_), Some(reference)) = (&result, reference) {
        match media.remove(&reference).await {
            Ok(()) => tracing::debug!(%reference, "Released unused profile picture"),
            Err(e) => tracing::warn!(%reference, error = %e, "Failed to release unused profile picture"),
        }
    }
    result
}
