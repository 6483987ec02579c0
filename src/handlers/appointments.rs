use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::error::{AppError, StoreError};
use crate::models::{today, Appointment, AppointmentChanges, AppointmentFilter, CreateAppointment};
use crate::store::Store;

#[derive(Debug, Serialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub summary: String,
}

pub async fn create_appointment(
    store: web::Data<dyn Store>,
    body: web::Json<CreateAppointment>,
) -> Result<HttpResponse, AppError> {
    let new_appointment = body.into_inner().into_new(today());
    new_appointment.validate()?;
    let appointment = web::block(move || store.create_appointment(new_appointment)).await??;
    tracing::info!(
        appointment_id = appointment.id,
        patient_id = appointment.patient_id,
        doctor_id = appointment.doctor_id,
        "Booked appointment"
    );
    Ok(HttpResponse::Created().json(appointment))
}

pub async fn get_appointment(
    store: web::Data<dyn Store>,
    appointment_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let appointment_id = appointment_id.into_inner();
    let view = web::block(move || {
        let appointment = store.get_appointment(appointment_id)?;
        let patient = store.patient_profile(appointment.patient_id)?;
        let doctor = store.doctor_profile(appointment.doctor_id)?;
        let summary = appointment.summary(&patient.name(), &doctor.name());
        Ok::<_, StoreError>(AppointmentView {
            appointment,
            summary,
        })
    })
    .await??;
    Ok(HttpResponse::Ok().json(view))
}

pub async fn list_appointments(
    store: web::Data<dyn Store>,
    filter: web::Query<AppointmentFilter>,
) -> Result<HttpResponse, AppError> {
    let filter = filter.into_inner();
    let appointments = web::block(move || store.list_appointments(&filter)).await??;
    Ok(HttpResponse::Ok().json(appointments))
}

pub async fn update_appointment(
    store: web::Data<dyn Store>,
    appointment_id: web::Path<i32>,
    body: web::Json<AppointmentChanges>,
) -> Result<HttpResponse, AppError> {
    let appointment_id = appointment_id.into_inner();
    let changes = body.into_inner();
    changes.validate()?;
    let appointment =
        web::block(move || store.update_appointment(appointment_id, changes)).await??;
    Ok(HttpResponse::Ok().json(appointment))
}

pub async fn delete_appointment(
    store: web::Data<dyn Store>,
    appointment_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let appointment_id = appointment_id.into_inner();
    web::block(move || store.delete_appointment(appointment_id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    use crate::handlers::testing::{app, Backends};
    use crate::models::today;
    use crate::store::fixtures;

    #[actix_web::test]
    async fn booking_defaults_date_and_summary_names_both_sides() {
        let backends = Backends::new();
        let store = backends.store.as_ref();
        let du = fixtures::user(store, "house", "Gregory", "House");
        let pu = fixtures::user(store, "ann", "Ann", "Lee");
        let doctor = fixtures::doctor(store, du.id);
        let patient = fixtures::patient(store, pu.id, Some(doctor.id));
        let app = test::init_service(app!(backends)).await;

        let req = test::TestRequest::post()
            .uri("/appointments")
            .set_json(json!({
                "patient_id": patient.id,
                "doctor_id": doctor.id,
                "description": "Follow-up",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        assert_eq!(created["appointment_date"], today().to_string());
        assert_eq!(created["status"], false);

        let req = test::TestRequest::get()
            .uri(&format!("/appointments/{}", created["id"]))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            view["summary"],
            format!("Appointment for Ann Lee with Gregory House on {}", today())
        );
    }

    #[actix_web::test]
    async fn blank_description_is_rejected() {
        let backends = Backends::new();
        let app = test::init_service(app!(backends)).await;
        let req = test::TestRequest::post()
            .uri("/appointments")
            .set_json(json!({"patient_id": 1, "doctor_id": 2, "description": "  "}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn approve_then_filter_and_cancel() {
        let backends = Backends::new();
        let store = backends.store.as_ref();
        let du = fixtures::user(store, "house", "Gregory", "House");
        let pu = fixtures::user(store, "ann", "Ann", "Lee");
        let doctor = fixtures::doctor(store, du.id);
        let patient = fixtures::patient(store, pu.id, None);
        let app = test::init_service(app!(backends)).await;

        let req = test::TestRequest::post()
            .uri("/appointments")
            .set_json(json!({
                "patient_id": patient.id,
                "doctor_id": doctor.id,
                "appointment_date": "2024-07-01",
                "description": "Checkup",
            }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let uri = format!("/appointments/{}", created["id"]);

        let req = test::TestRequest::patch()
            .uri(&uri)
            .set_json(json!({"status": true}))
            .to_request();
        let approved: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(approved["status"], true);
        assert_eq!(approved["appointment_date"], "2024-07-01");

        let req = test::TestRequest::get()
            .uri(&format!("/appointments?doctor_id={}&status=true", doctor.id))
            .to_request();
        let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.len(), 1);

        let req = test::TestRequest::delete().uri(&uri).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
        let req = test::TestRequest::get().uri(&uri).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
