use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use super::{release_picture_on_error, store_picture};
use crate::error::AppError;
use crate::media::MediaStore;
use crate::models::{
    today, CreatePatient, Patient, PatientChanges, PatientFilter, PatientProfile,
    PATIENT_PICTURE_FOLDER,
};
use crate::store::Store;

#[derive(Debug, Serialize)]
pub struct PatientView {
    #[serde(flatten)]
    pub patient: Patient,
    pub name: String,
    pub display: String,
}

impl From<PatientProfile> for PatientView {
    fn from(profile: PatientProfile) -> Self {
        PatientView {
            name: profile.name(),
            display: profile.to_string(),
            patient: profile.patient,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePatient {
    #[serde(flatten)]
    pub changes: PatientChanges,
    pub profile_pic_base64: Option<String>,
}

pub async fn create_patient(
    store: web::Data<dyn Store>,
    media: web::Data<dyn MediaStore>,
    body: web::Json<CreatePatient>,
) -> Result<HttpResponse, AppError> {
    let mut body = body.into_inner();
    let picture = body.profile_pic_base64.take();
    let mut new_patient = body.into_new(None, today());
    new_patient.validate()?;
    new_patient.profile_pic =
        store_picture(media.get_ref(), PATIENT_PICTURE_FOLDER, picture).await?;

    let picture = new_patient.profile_pic.clone();
    let result = web::block(move || store.create_patient(new_patient)).await;
    let patient = release_picture_on_error(media.get_ref(), picture, result).await?;
    tracing::info!(patient_id = patient.id, "Admitted patient");
    Ok(HttpResponse::Created().json(patient))
}

pub async fn get_patient(
    store: web::Data<dyn Store>,
    patient_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let patient_id = patient_id.into_inner();
    let profile = web::block(move || store.patient_profile(patient_id)).await??;
    Ok(HttpResponse::Ok().json(PatientView::from(profile)))
}

pub async fn list_patients(
    store: web::Data<dyn Store>,
    filter: web::Query<PatientFilter>,
) -> Result<HttpResponse, AppError> {
    let filter = filter.into_inner();
    let patients = web::block(move || store.list_patients(&filter)).await??;
    Ok(HttpResponse::Ok().json(patients))
}

pub async fn update_patient(
    store: web::Data<dyn Store>,
    media: web::Data<dyn MediaStore>,
    patient_id: web::Path<i32>,
    body: web::Json<UpdatePatient>,
) -> Result<HttpResponse, AppError> {
    let patient_id = patient_id.into_inner();
    let UpdatePatient {
        mut changes,
        profile_pic_base64,
    } = body.into_inner();
    changes.validate()?;
    changes.profile_pic =
        store_picture(media.get_ref(), PATIENT_PICTURE_FOLDER, profile_pic_base64).await?;

    let picture = changes.profile_pic.clone();
    let result = web::block(move || store.update_patient(patient_id, changes)).await;
    let patient = release_picture_on_error(media.get_ref(), picture, result).await?;
    Ok(HttpResponse::Ok().json(patient))
}

pub async fn delete_patient(
    store: web::Data<dyn Store>,
    patient_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let patient_id = patient_id.into_inner();
    web::block(move || store.delete_patient(patient_id)).await??;
    tracing::info!(patient_id, "Deleted patient");
    Ok(HttpResponse::NoContent().finish())
}

pub async fn get_patient_discharge(
    store: web::Data<dyn Store>,
    patient_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let patient_id = patient_id.into_inner();
    let bill = web::block(move || store.discharge_for_patient(patient_id)).await??;
    Ok(HttpResponse::Ok().json(bill))
}
