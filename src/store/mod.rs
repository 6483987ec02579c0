//! Persistence seam.
//!
//! Every method blocks; HTTP handlers call them from `web::block`.
//! [`PgStore`] talks to PostgreSQL through diesel, [`MemoryStore`] keeps the
//! same constraint rules in process.

pub mod memory;
pub mod pg;

pub use memory::MemoryStore;
pub use pg::{DbPool, PgStore};

use crate::error::{StoreError, StoreResult};
use crate::models::*;

/// A Completed payment has moved money; it may not be reopened.
pub(crate) fn check_status_change(
    id: i32,
    current: PaymentStatus,
    next: PaymentStatus,
) -> StoreResult<()> {
    if current == PaymentStatus::Completed && next != PaymentStatus::Completed {
        return Err(StoreError::Conflict(format!(
            "payment {} is Completed and cannot become {}",
            id, next
        )));
    }
    Ok(())
}

pub(crate) fn bill_already_paid(bill_id: i32) -> StoreError {
    StoreError::Conflict(format!("bill {} is already paid", bill_id))
}

pub trait Store: Send + Sync + 'static {
    fn create_user(&self, new: NewUser) -> StoreResult<User>;
    fn get_user(&self, id: i32) -> StoreResult<User>;
    /// Removes the user together with every profile and record hanging off it.
    fn delete_user(&self, id: i32) -> StoreResult<()>;

    fn create_doctor(&self, new: NewDoctor) -> StoreResult<Doctor>;
    fn get_doctor(&self, id: i32) -> StoreResult<Doctor>;
    fn doctor_profile(&self, id: i32) -> StoreResult<DoctorProfile>;
    fn list_doctors(&self, filter: &DoctorFilter) -> StoreResult<Vec<Doctor>>;
    fn update_doctor(&self, id: i32, changes: DoctorChanges) -> StoreResult<Doctor>;
    /// Cascades to appointments; patients assigned to the doctor are unassigned.
    fn delete_doctor(&self, id: i32) -> StoreResult<()>;

    fn create_patient(&self, new: NewPatient) -> StoreResult<Patient>;
    fn get_patient(&self, id: i32) -> StoreResult<Patient>;
    fn patient_profile(&self, id: i32) -> StoreResult<PatientProfile>;
    fn list_patients(&self, filter: &PatientFilter) -> StoreResult<Vec<Patient>>;
    fn update_patient(&self, id: i32, changes: PatientChanges) -> StoreResult<Patient>;
    fn delete_patient(&self, id: i32) -> StoreResult<()>;

    fn create_appointment(&self, new: NewAppointment) -> StoreResult<Appointment>;
    fn get_appointment(&self, id: i32) -> StoreResult<Appointment>;
    fn list_appointments(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>>;
    fn update_appointment(&self, id: i32, changes: AppointmentChanges) -> StoreResult<Appointment>;
    fn delete_appointment(&self, id: i32) -> StoreResult<()>;

    fn create_discharge(&self, new: NewDischarge) -> StoreResult<PatientDischargeDetails>;
    fn get_discharge(&self, id: i32) -> StoreResult<PatientDischargeDetails>;
    fn discharge_for_patient(&self, patient_id: i32) -> StoreResult<PatientDischargeDetails>;
    fn update_discharge(
        &self,
        id: i32,
        changes: DischargeChanges,
    ) -> StoreResult<PatientDischargeDetails>;

    fn create_account(&self, new: NewAccount) -> StoreResult<Account>;
    fn get_account(&self, id: i32) -> StoreResult<Account>;
    fn account_for_holder(&self, holder_id: i32) -> StoreResult<Account>;
    /// Newest first.
    fn list_accounts(&self) -> StoreResult<Vec<Account>>;
    fn update_account_status(&self, id: i32, status: AccountStatus) -> StoreResult<Account>;

    /// Assigns a transaction id when the request carries none.
    fn create_payment(&self, request: CreatePayment) -> StoreResult<Payment>;
    fn get_payment(&self, id: i32) -> StoreResult<Payment>;
    /// Newest first.
    fn list_payments(&self, filter: &PaymentFilter) -> StoreResult<Vec<Payment>>;
    /// Persists a status change. The transaction id is left untouched.
    fn save_payment(&self, id: i32, status: PaymentStatus) -> StoreResult<Payment>;
    fn settle_payment(&self, id: i32) -> StoreResult<Settlement>;
}
