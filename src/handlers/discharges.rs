use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::error::{AppError, StoreError};
use crate::models::{CreateDischarge, DischargeChanges, NewDischarge, PatientDischargeDetails};
use crate::store::Store;

#[derive(Debug, Serialize)]
pub struct DischargeView {
    #[serde(flatten)]
    pub bill: PatientDischargeDetails,
    pub summary: String,
}

pub async fn create_discharge(
    store: web::Data<dyn Store>,
    body: web::Json<CreateDischarge>,
) -> Result<HttpResponse, AppError> {
    let new_bill = NewDischarge::try_from(body.into_inner())?;
    new_bill.validate()?;
    let bill = web::block(move || store.create_discharge(new_bill)).await??;
    tracing::info!(
        bill_id = bill.id,
        patient_id = bill.patient_id,
        total = bill.total,
        "Recorded discharge"
    );
    Ok(HttpResponse::Created().json(bill))
}

pub async fn get_discharge(
    store: web::Data<dyn Store>,
    bill_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let bill_id = bill_id.into_inner();
    let view = web::block(move || {
        let bill = store.get_discharge(bill_id)?;
        let patient = store.patient_profile(bill.patient_id)?;
        let summary = bill.summary(&patient.name());
        Ok::<_, StoreError>(DischargeView { bill, summary })
    })
    .await??;
    Ok(HttpResponse::Ok().json(view))
}

pub async fn update_discharge(
    store: web::Data<dyn Store>,
    bill_id: web::Path<i32>,
    body: web::Json<DischargeChanges>,
) -> Result<HttpResponse, AppError> {
    let bill_id = bill_id.into_inner();
    let changes = body.into_inner();
    changes.validate()?;
    let bill = web::block(move || store.update_discharge(bill_id, changes)).await??;
    Ok(HttpResponse::Ok().json(bill))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    use crate::handlers::testing::{app, Backends};
    use crate::store::fixtures;

    fn bill_body(patient_id: i32) -> Value {
        json!({
            "patient_id": patient_id,
            "address": "4 Elm Road",
            "release_date": "2024-06-02",
            "day_spent": 3,
            "room_charge": 100,
            "medicine_cost": 50,
            "doctor_fee": 200,
            "other_charge": 25,
        })
    }

    #[actix_web::test]
    async fn total_is_computed_when_omitted() {
        let backends = Backends::new();
        let pu = fixtures::user(backends.store.as_ref(), "ann", "Ann", "Lee");
        let patient = fixtures::patient(backends.store.as_ref(), pu.id, None);
        let app = test::init_service(app!(backends)).await;

        let req = test::TestRequest::post()
            .uri("/discharges")
            .set_json(bill_body(patient.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let bill: Value = test::read_body_json(resp).await;
        assert_eq!(bill["total"], 575);
        assert_eq!(bill["paid"], false);

        let req = test::TestRequest::get()
            .uri(&format!("/discharges/{}", bill["id"]))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["summary"], "Patient: Ann Lee - Discharge Date: 2024-06-02");
    }

    #[actix_web::test]
    async fn one_bill_per_patient() {
        let backends = Backends::new();
        let pu = fixtures::user(backends.store.as_ref(), "ann", "Ann", "Lee");
        let patient = fixtures::patient(backends.store.as_ref(), pu.id, None);
        let app = test::init_service(app!(backends)).await;

        for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
            let req = test::TestRequest::post()
                .uri("/discharges")
                .set_json(bill_body(patient.id))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), expected);
        }
    }

    #[actix_web::test]
    async fn negative_charges_are_rejected() {
        let backends = Backends::new();
        let app = test::init_service(app!(backends)).await;
        let mut body = bill_body(1);
        body["medicine_cost"] = json!(-5);
        let req = test::TestRequest::post()
            .uri("/discharges")
            .set_json(body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn provider_identifiers_are_recorded() {
        let backends = Backends::new();
        let pu = fixtures::user(backends.store.as_ref(), "ann", "Ann", "Lee");
        let patient = fixtures::patient(backends.store.as_ref(), pu.id, None);
        let bill = fixtures::discharge(backends.store.as_ref(), patient.id, 600);
        let app = test::init_service(app!(backends)).await;

        let req = test::TestRequest::patch()
            .uri(&format!("/discharges/{}", bill.id))
            .set_json(json!({"provider_order_id": "order_9", "paid": true}))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["provider_order_id"], "order_9");
        assert_eq!(updated["provider_payment_id"], Value::Null);
        assert_eq!(updated["paid"], true);
        assert_eq!(updated["total"], 600);
    }
}
