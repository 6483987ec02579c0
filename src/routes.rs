use actix_web::web;

use crate::handlers::{self, accounts, appointments, discharges, doctors, patients, payments, users};
use crate::media::MAX_PICTURE_BYTES;

// Room for a base64 encoded picture plus the rest of the record.
const JSON_BODY_LIMIT: usize = MAX_PICTURE_BYTES / 3 * 4 + 64 * 1024;

/// Registers every HTTP route on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(JSON_BODY_LIMIT))
        .route("/", web::get().to(handlers::hello))
        .service(
            web::scope("/users")
                .route("", web::post().to(users::create_user))
                .route("/{user_id}", web::get().to(users::get_user))
                .route("/{user_id}", web::delete().to(users::delete_user))
                .route("/{user_id}/account", web::get().to(accounts::get_holder_account)),
        )
        .service(
            web::scope("/doctors")
                .route("", web::post().to(doctors::create_doctor))
                .route("", web::get().to(doctors::list_doctors))
                .route("/{doctor_id}", web::get().to(doctors::get_doctor))
                .route("/{doctor_id}", web::patch().to(doctors::update_doctor))
                .route("/{doctor_id}", web::delete().to(doctors::delete_doctor)),
        )
        .service(
            web::scope("/patients")
                .route("", web::post().to(patients::create_patient))
                .route("", web::get().to(patients::list_patients))
                .route("/{patient_id}", web::get().to(patients::get_patient))
                .route("/{patient_id}", web::patch().to(patients::update_patient))
                .route("/{patient_id}", web::delete().to(patients::delete_patient))
                .route(
                    "/{patient_id}/discharge",
                    web::get().to(patients::get_patient_discharge),
                ),
        )
        .service(
            web::scope("/appointments")
                .route("", web::post().to(appointments::create_appointment))
                .route("", web::get().to(appointments::list_appointments))
                .route("/{appointment_id}", web::get().to(appointments::get_appointment))
                .route("/{appointment_id}", web::patch().to(appointments::update_appointment))
                .route("/{appointment_id}", web::delete().to(appointments::delete_appointment)),
        )
        .service(
            web::scope("/discharges")
                .route("", web::post().to(discharges::create_discharge))
                .route("/{bill_id}", web::get().to(discharges::get_discharge))
                .route("/{bill_id}", web::patch().to(discharges::update_discharge)),
        )
        .service(
            web::scope("/accounts")
                .route("", web::post().to(accounts::create_account))
                .route("", web::get().to(accounts::list_accounts))
                .route("/{account_id}", web::get().to(accounts::get_account))
                .route("/{account_id}/status", web::patch().to(accounts::update_account_status)),
        )
        .service(
            web::scope("/payments")
                .route("", web::post().to(payments::create_payment))
                .route("", web::get().to(payments::list_payments))
                .route("/{payment_id}", web::get().to(payments::get_payment))
                .route("/{payment_id}", web::patch().to(payments::update_payment))
                .route("/{payment_id}/settle", web::post().to(payments::settle_payment)),
        );
}
