use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use super::{release_picture_on_error, store_picture};
use crate::error::AppError;
use crate::media::MediaStore;
use crate::models::{CreateDoctor, Doctor, DoctorChanges, DoctorFilter, DoctorProfile, DOCTOR_PICTURE_FOLDER};
use crate::store::Store;

/// Doctor row plus the name and label derived from its user.
#[derive(Debug, Serialize)]
pub struct DoctorView {
    #[serde(flatten)]
    pub doctor: Doctor,
    pub name: String,
    pub display: String,
}

impl From<DoctorProfile> for DoctorView {
    fn from(profile: DoctorProfile) -> Self {
        DoctorView {
            name: profile.name(),
            display: profile.to_string(),
            doctor: profile.doctor,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateDoctor {
    #[serde(flatten)]
    pub changes: DoctorChanges,
    pub profile_pic_base64: Option<String>,
}

pub async fn create_doctor(
    store: web::Data<dyn Store>,
    media: web::Data<dyn MediaStore>,
    body: web::Json<CreateDoctor>,
) -> Result<HttpResponse, AppError> {
    let mut body = body.into_inner();
    let picture = body.profile_pic_base64.take();
    let mut new_doctor = body.into_new(None);
    new_doctor.validate()?;
    new_doctor.profile_pic = store_picture(media.get_ref(), DOCTOR_PICTURE_FOLDER, picture).await?;

    let picture = new_doctor.profile_pic.clone();
    let result = web::block(move || store.create_doctor(new_doctor)).await;
    let doctor = release_picture_on_error(media.get_ref(), picture, result).await?;
    tracing::info!(doctor_id = doctor.id, department = %doctor.department, "Registered doctor");
    Ok(HttpResponse::Created().json(doctor))
}

pub async fn get_doctor(
    store: web::Data<dyn Store>,
    doctor_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let doctor_id = doctor_id.into_inner();
    let profile = web::block(move || store.doctor_profile(doctor_id)).await??;
    Ok(HttpResponse::Ok().json(DoctorView::from(profile)))
}

pub async fn list_doctors(
    store: web::Data<dyn Store>,
    filter: web::Query<DoctorFilter>,
) -> Result<HttpResponse, AppError> {
    let filter = filter.into_inner();
    let doctors = web::block(move || store.list_doctors(&filter)).await??;
    Ok(HttpResponse::Ok().json(doctors))
}

pub async fn update_doctor(
    store: web::Data<dyn Store>,
    media: web::Data<dyn MediaStore>,
    doctor_id: web::Path<i32>,
    body: web::Json<UpdateDoctor>,
) -> Result<HttpResponse, AppError> {
    let doctor_id = doctor_id.into_inner();
    let UpdateDoctor {
        mut changes,
        profile_pic_base64,
    } = body.into_inner();
    changes.validate()?;
    changes.profile_pic =
        store_picture(media.get_ref(), DOCTOR_PICTURE_FOLDER, profile_pic_base64).await?;

    let picture = changes.profile_pic.clone();
    let result = web::block(move || store.update_doctor(doctor_id, changes)).await;
    let doctor = release_picture_on_error(media.get_ref(), picture, result).await?;
    Ok(HttpResponse::Ok().json(doctor))
}

pub async fn delete_doctor(
    store: web::Data<dyn Store>,
    doctor_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let doctor_id = doctor_id.into_inner();
    web::block(move || store.delete_doctor(doctor_id)).await??;
    tracing::info!(doctor_id, "Deleted doctor");
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    use crate::handlers::testing::{app, Backends};
    use crate::media::encode_picture;
    use crate::store::fixtures;

    #[actix_web::test]
    async fn registration_defaults_to_cardiology_and_unapproved() {
        let backends = Backends::new();
        let user = fixtures::user(backends.store.as_ref(), "house", "Gregory", "House");
        let app = test::init_service(app!(backends)).await;

        let req = test::TestRequest::post()
            .uri("/doctors")
            .set_json(json!({"user_id": user.id, "address": "1 Infirmary Lane"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let doctor: Value = test::read_body_json(resp).await;
        assert_eq!(doctor["department"], "Cardiologist");
        assert_eq!(doctor["status"], false);
        assert_eq!(doctor["profile_pic"], Value::Null);
    }

    #[actix_web::test]
    async fn profile_view_carries_name_and_display() {
        let backends = Backends::new();
        let user = fixtures::user(backends.store.as_ref(), "house", "Gregory", "House");
        let doctor = fixtures::doctor(backends.store.as_ref(), user.id);
        let app = test::init_service(app!(backends)).await;

        let req = test::TestRequest::get()
            .uri(&format!("/doctors/{}", doctor.id))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["name"], "Gregory House");
        assert_eq!(view["display"], "Gregory House (Cardiologist)");
        assert_eq!(view["user_id"], user.id);
    }

    #[actix_web::test]
    async fn picture_is_uploaded_and_referenced() {
        let backends = Backends::new();
        let user = fixtures::user(backends.store.as_ref(), "house", "Gregory", "House");
        let app = test::init_service(app!(backends)).await;

        let req = test::TestRequest::post()
            .uri("/doctors")
            .set_json(json!({
                "user_id": user.id,
                "address": "1 Infirmary Lane",
                "department": "Dermatologists",
                "profile_pic_base64": encode_picture(b"\x89PNG"),
            }))
            .to_request();
        let doctor: Value = test::call_and_read_body_json(&app, req).await;
        let reference = doctor["profile_pic"].as_str().unwrap();
        assert!(reference.starts_with("profile_pic/DoctorProfilePic/"));
        assert_eq!(backends.media.get(reference).unwrap(), b"\x89PNG");
    }

    #[actix_web::test]
    async fn picture_is_released_when_user_is_unknown() {
        let backends = Backends::new();
        let app = test::init_service(app!(backends)).await;

        let req = test::TestRequest::post()
            .uri("/doctors")
            .set_json(json!({
                "user_id": 404,
                "address": "1 Infirmary Lane",
                "profile_pic_base64": encode_picture(b"\x89PNG"),
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(backends.media.is_empty());
    }

    #[actix_web::test]
    async fn explicit_null_clears_mobile() {
        let backends = Backends::new();
        let user = fixtures::user(backends.store.as_ref(), "house", "Gregory", "House");
        let doctor = fixtures::doctor(backends.store.as_ref(), user.id);
        let app = test::init_service(app!(backends)).await;

        let req = test::TestRequest::patch()
            .uri(&format!("/doctors/{}", doctor.id))
            .set_json(json!({"mobile": null}))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["mobile"], Value::Null);
        assert_eq!(updated["address"], "1 Infirmary Lane");
    }

    #[actix_web::test]
    async fn unknown_department_is_rejected() {
        let backends = Backends::new();
        let user = fixtures::user(backends.store.as_ref(), "house", "Gregory", "House");
        let app = test::init_service(app!(backends)).await;

        let req = test::TestRequest::post()
            .uri("/doctors")
            .set_json(json!({"user_id": user.id, "address": "x", "department": "Podiatry"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn approve_and_filter_by_status() {
        let backends = Backends::new();
        let a = fixtures::user(backends.store.as_ref(), "a", "A", "One");
        let b = fixtures::user(backends.store.as_ref(), "b", "B", "Two");
        let approved = fixtures::doctor(backends.store.as_ref(), a.id);
        let pending = fixtures::doctor(backends.store.as_ref(), b.id);
        let app = test::init_service(app!(backends)).await;

        let req = test::TestRequest::patch()
            .uri(&format!("/doctors/{}", pending.id))
            .set_json(json!({"status": false}))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["status"], false);

        let req = test::TestRequest::get().uri("/doctors?status=true").to_request();
        let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], approved.id);
    }

    #[actix_web::test]
    async fn registering_for_unknown_user_is_unprocessable() {
        let backends = Backends::new();
        let app = test::init_service(app!(backends)).await;
        let req = test::TestRequest::post()
            .uri("/doctors")
            .set_json(json!({"user_id": 404, "address": "1 Infirmary Lane"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
