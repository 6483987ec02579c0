use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::error::{AppError, StoreError};
use crate::models::{CreatePayment, Payment, PaymentFilter, PaymentStatus, PaymentStatusChange};
use crate::store::Store;

#[derive(Debug, Serialize)]
pub struct PaymentView {
    #[serde(flatten)]
    pub payment: Payment,
    pub amount: i32,
    pub summary: String,
}

pub async fn create_payment(
    store: web::Data<dyn Store>,
    body: web::Json<CreatePayment>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    request.validate()?;
    let payment = web::block(move || store.create_payment(request)).await??;
    tracing::info!(
        payment_id = payment.id,
        account_id = payment.account_id,
        bill_id = payment.bill_id,
        transaction_id = %payment.transaction_id,
        "Recorded payment"
    );
    Ok(HttpResponse::Created().json(payment))
}

pub async fn get_payment(
    store: web::Data<dyn Store>,
    payment_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let payment_id = payment_id.into_inner();
    let view = web::block(move || {
        let payment = store.get_payment(payment_id)?;
        let bill = store.get_discharge(payment.bill_id)?;
        let patient = store.patient_profile(bill.patient_id)?;
        Ok::<_, StoreError>(PaymentView {
            amount: payment.amount(&bill),
            summary: payment.summary(&patient.name(), &bill),
            payment,
        })
    })
    .await??;
    Ok(HttpResponse::Ok().json(view))
}

pub async fn list_payments(
    store: web::Data<dyn Store>,
    filter: web::Query<PaymentFilter>,
) -> Result<HttpResponse, AppError> {
    let filter = filter.into_inner();
    let payments = web::block(move || store.list_payments(&filter)).await??;
    Ok(HttpResponse::Ok().json(payments))
}

pub async fn update_payment(
    store: web::Data<dyn Store>,
    payment_id: web::Path<i32>,
    body: web::Json<PaymentStatusChange>,
) -> Result<HttpResponse, AppError> {
    let payment_id = payment_id.into_inner();
    let status = body.into_inner().status;
    let payment = web::block(move || store.save_payment(payment_id, status)).await??;
    Ok(HttpResponse::Ok().json(payment))
}

pub async fn settle_payment(
    store: web::Data<dyn Store>,
    payment_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let payment_id = payment_id.into_inner();
    let settlement = web::block(move || store.settle_payment(payment_id)).await??;
    match settlement.payment.status {
        PaymentStatus::Completed => tracing::info!(
            payment_id,
            account_id = settlement.account.id,
            remaining = %settlement.account.balance(),
            "Settled payment"
        ),
        status => tracing::warn!(
            payment_id,
            account_id = settlement.account.id,
            %status,
            "Payment could not be settled"
        ),
    }
    Ok(HttpResponse::Ok().json(settlement))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    use crate::handlers::testing::{app, Backends};
    use crate::models::{AccountStatus, CreatePayment, PatientDischargeDetails};
    use crate::store::{fixtures, Store};

    fn seed(backends: &Backends, balance_cents: i64) -> (i32, PatientDischargeDetails) {
        let store = backends.store.as_ref();
        let user = fixtures::user(store, "ann", "Ann", "Lee");
        let patient = fixtures::patient(store, user.id, None);
        let bill = fixtures::discharge(store, patient.id, 600);
        let account = fixtures::account(store, user.id, "ACC-001", balance_cents);
        (account.id, bill)
    }

    #[actix_web::test]
    async fn generated_transaction_id_and_summary() {
        let backends = Backends::new();
        let (account_id, bill) = seed(&backends, 100_000);
        let app = test::init_service(app!(backends)).await;

        let req = test::TestRequest::post()
            .uri("/payments")
            .set_json(json!({"account_id": account_id, "bill_id": bill.id}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let payment: Value = test::read_body_json(resp).await;
        assert_eq!(payment["status"], "Pending");
        let transaction_id = payment["transaction_id"].as_str().unwrap().to_string();
        assert!(transaction_id.starts_with("ACC-001-"));

        let req = test::TestRequest::get()
            .uri(&format!("/payments/{}", payment["id"]))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["amount"], 600);
        assert_eq!(
            view["summary"],
            format!("Ann Lee - 600 - Pending - {transaction_id}")
        );
    }

    #[actix_web::test]
    async fn supplied_transaction_id_is_kept_and_unique() {
        let backends = Backends::new();
        let (account_id, bill) = seed(&backends, 100_000);
        let app = test::init_service(app!(backends)).await;

        let req = test::TestRequest::post()
            .uri("/payments")
            .set_json(json!({
                "account_id": account_id,
                "bill_id": bill.id,
                "transaction_id": "TX-42",
            }))
            .to_request();
        let payment: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(payment["transaction_id"], "TX-42");

        let req = test::TestRequest::get()
            .uri(&format!("/payments?account_id={account_id}"))
            .to_request();
        let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.len(), 1);

        let req = test::TestRequest::get().uri("/payments?account_id=999").to_request();
        let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert!(listed.is_empty());
    }

    #[actix_web::test]
    async fn settling_debits_account_and_marks_bill_paid() {
        let backends = Backends::new();
        let (account_id, bill) = seed(&backends, 100_000);
        let payment = backends
            .store
            .create_payment(CreatePayment {
                account_id,
                bill_id: bill.id,
                status: Default::default(),
                transaction_id: None,
            })
            .unwrap();
        let app = test::init_service(app!(backends)).await;

        let uri = format!("/payments/{}/settle", payment.id);
        let req = test::TestRequest::post().uri(&uri).to_request();
        let settlement: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(settlement["payment"]["status"], "Completed");
        assert_eq!(settlement["account"]["balance_cents"], 40_000);
        assert_eq!(settlement["bill"]["paid"], true);

        let req = test::TestRequest::post().uri(&uri).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::patch()
            .uri(&format!("/payments/{}", payment.id))
            .set_json(json!({"status": "Pending"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::get()
            .uri(&format!("/accounts/{account_id}"))
            .to_request();
        let account: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(account["balance_cents"], 40_000);
    }

    #[actix_web::test]
    async fn settling_against_inactive_account_fails_without_debit() {
        let backends = Backends::new();
        let (account_id, bill) = seed(&backends, 100_000);
        backends
            .store
            .update_account_status(account_id, AccountStatus::Inactive)
            .unwrap();
        let payment = backends
            .store
            .create_payment(CreatePayment {
                account_id,
                bill_id: bill.id,
                status: Default::default(),
                transaction_id: Some("TX-1".into()),
            })
            .unwrap();
        let app = test::init_service(app!(backends)).await;

        let req = test::TestRequest::post()
            .uri(&format!("/payments/{}/settle", payment.id))
            .to_request();
        let settlement: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(settlement["payment"]["status"], "Failed");
        assert_eq!(settlement["account"]["balance_cents"], 100_000);
        assert_eq!(settlement["bill"]["paid"], false);
    }

    #[actix_web::test]
    async fn status_can_be_saved_directly() {
        let backends = Backends::new();
        let (account_id, bill) = seed(&backends, 100);
        let app = test::init_service(app!(backends)).await;

        let req = test::TestRequest::post()
            .uri("/payments")
            .set_json(json!({"account_id": account_id, "bill_id": bill.id}))
            .to_request();
        let payment: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::patch()
            .uri(&format!("/payments/{}", payment["id"]))
            .set_json(json!({"status": "Failed"}))
            .to_request();
        let saved: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(saved["status"], "Failed");
        assert_eq!(saved["transaction_id"], payment["transaction_id"]);

        let req = test::TestRequest::patch()
            .uri(&format!("/payments/{}", payment["id"]))
            .set_json(json!({"status": "Refunded"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn unknown_bill_is_unprocessable() {
        let backends = Backends::new();
        let (account_id, _) = seed(&backends, 100);
        let app = test::init_service(app!(backends)).await;
        let req = test::TestRequest::post()
            .uri("/payments")
            .set_json(json!({"account_id": account_id, "bill_id": 9999}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
