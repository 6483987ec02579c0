use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, PooledConnection};
use diesel::PgConnection;

use super::{bill_already_paid, check_status_change, Store};
use crate::error::{StoreError, StoreResult};
use crate::models::*;
use crate::schema::{
    accounts, appointments, doctors, patient_discharge_details, patients, payments, users,
};
use crate::transaction::{self, TransactionIdStyle};

// Database connection pool type
pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;
type DbConn = PooledConnection<ConnectionManager<PgConnection>>;

/// PostgreSQL-backed store. Constraint enforcement (uniqueness, foreign keys,
/// cascades) is left to the schema in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
    transaction_id_style: TransactionIdStyle,
}

impl PgStore {
    pub fn new(pool: DbPool, transaction_id_style: TransactionIdStyle) -> Self {
        PgStore {
            pool,
            transaction_id_style,
        }
    }

    pub fn connect(
        database_url: &str,
        max_size: u32,
        transaction_id_style: TransactionIdStyle,
    ) -> StoreResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = r2d2::Pool::builder().max_size(max_size).build(manager)?;
        Ok(PgStore::new(pool, transaction_id_style))
    }

    fn conn(&self) -> StoreResult<DbConn> {
        Ok(self.pool.get()?)
    }
}

fn deleted(rows: usize, entity: &'static str, id: i32) -> StoreResult<()> {
    if rows == 0 {
        Err(StoreError::not_found(entity, id))
    } else {
        Ok(())
    }
}

impl Store for PgStore {
    fn create_user(&self, new: NewUser) -> StoreResult<User> {
        new.validate()?;
        let mut conn = self.conn()?;
        let user: User = diesel::insert_into(users::table)
            .values(&new)
            .returning(User::as_returning())
            .get_result(&mut conn)?;
        tracing::debug!(user_id = user.id, "Inserted user");
        Ok(user)
    }

    fn get_user(&self, id: i32) -> StoreResult<User> {
        let mut conn = self.conn()?;
        users::table
            .find(id)
            .select(User::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(StoreError::not_found("user", id))
    }

    fn delete_user(&self, id: i32) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let rows = diesel::delete(users::table.find(id)).execute(&mut conn)?;
        deleted(rows, "user", id)
    }

    fn create_doctor(&self, new: NewDoctor) -> StoreResult<Doctor> {
        new.validate()?;
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(doctors::table)
            .values(&new)
            .returning(Doctor::as_returning())
            .get_result(&mut conn)?)
    }

    fn get_doctor(&self, id: i32) -> StoreResult<Doctor> {
        let mut conn = self.conn()?;
        doctors::table
            .find(id)
            .select(Doctor::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(StoreError::not_found("doctor", id))
    }

    fn doctor_profile(&self, id: i32) -> StoreResult<DoctorProfile> {
        let mut conn = self.conn()?;
        doctors::table
            .inner_join(users::table)
            .filter(doctors::id.eq(id))
            .select((Doctor::as_select(), User::as_select()))
            .first::<(Doctor, User)>(&mut conn)
            .optional()?
            .map(|(doctor, user)| DoctorProfile { doctor, user })
            .ok_or(StoreError::not_found("doctor", id))
    }

    fn list_doctors(&self, filter: &DoctorFilter) -> StoreResult<Vec<Doctor>> {
        let mut conn = self.conn()?;
        let mut query = doctors::table
            .select(Doctor::as_select())
            .order(doctors::id.asc())
            .into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(doctors::status.eq(status));
        }
        Ok(query.load(&mut conn)?)
    }

    fn update_doctor(&self, id: i32, changes: DoctorChanges) -> StoreResult<Doctor> {
        changes.validate()?;
        if changes.is_empty() {
            return self.get_doctor(id);
        }
        let mut conn = self.conn()?;
        diesel::update(doctors::table.find(id))
            .set(&changes)
            .returning(Doctor::as_returning())
            .get_result(&mut conn)
            .optional()?
            .ok_or(StoreError::not_found("doctor", id))
    }

    fn delete_doctor(&self, id: i32) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let rows = diesel::delete(doctors::table.find(id)).execute(&mut conn)?;
        deleted(rows, "doctor", id)
    }

    fn create_patient(&self, new: NewPatient) -> StoreResult<Patient> {
        new.validate()?;
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(patients::table)
            .values(&new)
            .returning(Patient::as_returning())
            .get_result(&mut conn)?)
    }

    fn get_patient(&self, id: i32) -> StoreResult<Patient> {
        let mut conn = self.conn()?;
        patients::table
            .find(id)
            .select(Patient::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(StoreError::not_found("patient", id))
    }

    fn patient_profile(&self, id: i32) -> StoreResult<PatientProfile> {
        let mut conn = self.conn()?;
        patients::table
            .inner_join(users::table)
            .filter(patients::id.eq(id))
            .select((Patient::as_select(), User::as_select()))
            .first::<(Patient, User)>(&mut conn)
            .optional()?
            .map(|(patient, user)| PatientProfile { patient, user })
            .ok_or(StoreError::not_found("patient", id))
    }

    fn list_patients(&self, filter: &PatientFilter) -> StoreResult<Vec<Patient>> {
        let mut conn = self.conn()?;
        let mut query = patients::table
            .select(Patient::as_select())
            .order(patients::id.asc())
            .into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(patients::status.eq(status));
        }
        if let Some(doctor_id) = filter.doctor_id {
            query = query.filter(patients::assigned_doctor_id.eq(doctor_id));
        }
        Ok(query.load(&mut conn)?)
    }

    fn update_patient(&self, id: i32, changes: PatientChanges) -> StoreResult<Patient> {
        changes.validate()?;
        if changes.is_empty() {
            return self.get_patient(id);
        }
        let mut conn = self.conn()?;
        diesel::update(patients::table.find(id))
            .set(&changes)
            .returning(Patient::as_returning())
            .get_result(&mut conn)
            .optional()?
            .ok_or(StoreError::not_found("patient", id))
    }

    fn delete_patient(&self, id: i32) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let rows = diesel::delete(patients::table.find(id)).execute(&mut conn)?;
        deleted(rows, "patient", id)
    }

    fn create_appointment(&self, new: NewAppointment) -> StoreResult<Appointment> {
        new.validate()?;
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(appointments::table)
            .values(&new)
            .returning(Appointment::as_returning())
            .get_result(&mut conn)?)
    }

    fn get_appointment(&self, id: i32) -> StoreResult<Appointment> {
        let mut conn = self.conn()?;
        appointments::table
            .find(id)
            .select(Appointment::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(StoreError::not_found("appointment", id))
    }

    fn list_appointments(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        let mut conn = self.conn()?;
        let mut query = appointments::table
            .select(Appointment::as_select())
            .order(appointments::id.asc())
            .into_boxed();
        if let Some(patient_id) = filter.patient_id {
            query = query.filter(appointments::patient_id.eq(patient_id));
        }
        if let Some(doctor_id) = filter.doctor_id {
            query = query.filter(appointments::doctor_id.eq(doctor_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(appointments::status.eq(status));
        }
        Ok(query.load(&mut conn)?)
    }

    fn update_appointment(&self, id: i32, changes: AppointmentChanges) -> StoreResult<Appointment> {
        changes.validate()?;
        if changes.is_empty() {
            return self.get_appointment(id);
        }
        let mut conn = self.conn()?;
        diesel::update(appointments::table.find(id))
            .set(&changes)
            .returning(Appointment::as_returning())
            .get_result(&mut conn)
            .optional()?
            .ok_or(StoreError::not_found("appointment", id))
    }

    fn delete_appointment(&self, id: i32) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let rows = diesel::delete(appointments::table.find(id)).execute(&mut conn)?;
        deleted(rows, "appointment", id)
    }

    fn create_discharge(&self, new: NewDischarge) -> StoreResult<PatientDischargeDetails> {
        new.validate()?;
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(patient_discharge_details::table)
            .values(&new)
            .returning(PatientDischargeDetails::as_returning())
            .get_result(&mut conn)?)
    }

    fn get_discharge(&self, id: i32) -> StoreResult<PatientDischargeDetails> {
        let mut conn = self.conn()?;
        patient_discharge_details::table
            .find(id)
            .select(PatientDischargeDetails::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(StoreError::not_found("discharge", id))
    }

    fn discharge_for_patient(&self, patient_id: i32) -> StoreResult<PatientDischargeDetails> {
        let mut conn = self.conn()?;
        patient_discharge_details::table
            .filter(patient_discharge_details::patient_id.eq(patient_id))
            .select(PatientDischargeDetails::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(StoreError::NotFound {
                entity: "discharge for patient",
                id: patient_id,
            })
    }

    fn update_discharge(
        &self,
        id: i32,
        changes: DischargeChanges,
    ) -> StoreResult<PatientDischargeDetails> {
        changes.validate()?;
        if changes.is_empty() {
            return self.get_discharge(id);
        }
        let mut conn = self.conn()?;
        diesel::update(patient_discharge_details::table.find(id))
            .set(&changes)
            .returning(PatientDischargeDetails::as_returning())
            .get_result(&mut conn)
            .optional()?
            .ok_or(StoreError::not_found("discharge", id))
    }

    fn create_account(&self, new: NewAccount) -> StoreResult<Account> {
        new.validate()?;
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(accounts::table)
            .values(&new)
            .returning(Account::as_returning())
            .get_result(&mut conn)?)
    }

    fn get_account(&self, id: i32) -> StoreResult<Account> {
        let mut conn = self.conn()?;
        accounts::table
            .find(id)
            .select(Account::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(StoreError::not_found("account", id))
    }

    fn account_for_holder(&self, holder_id: i32) -> StoreResult<Account> {
        let mut conn = self.conn()?;
        accounts::table
            .filter(accounts::holder_id.eq(holder_id))
            .select(Account::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(StoreError::NotFound {
                entity: "account for holder",
                id: holder_id,
            })
    }

    fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        let mut conn = self.conn()?;
        Ok(accounts::table
            .select(Account::as_select())
            .order((accounts::date.desc(), accounts::id.desc()))
            .load(&mut conn)?)
    }

    fn update_account_status(&self, id: i32, status: AccountStatus) -> StoreResult<Account> {
        let mut conn = self.conn()?;
        diesel::update(accounts::table.find(id))
            .set(accounts::status.eq(status))
            .returning(Account::as_returning())
            .get_result(&mut conn)
            .optional()?
            .ok_or(StoreError::not_found("account", id))
    }

    fn create_payment(&self, request: CreatePayment) -> StoreResult<Payment> {
        request.validate()?;
        let style = self.transaction_id_style;
        let mut conn = self.conn()?;
        conn.transaction::<_, StoreError, _>(|conn| {
            let account_number: String = accounts::table
                .find(request.account_id)
                .select(accounts::account_number)
                .first(conn)
                .optional()?
                .ok_or_else(|| {
                    StoreError::InvalidReference(format!(
                        "account {} does not exist",
                        request.account_id
                    ))
                })?;
            let now = Utc::now();
            let new = NewPayment {
                account_id: request.account_id,
                bill_id: request.bill_id,
                status: request.status,
                transaction_id: transaction::assign(
                    request.transaction_id,
                    style,
                    &account_number,
                    now,
                ),
                date: now,
                created_at: now,
                updated_at: now,
            };
            new.validate()?;
            Ok(diesel::insert_into(payments::table)
                .values(&new)
                .returning(Payment::as_returning())
                .get_result(conn)?)
        })
    }

    fn get_payment(&self, id: i32) -> StoreResult<Payment> {
        let mut conn = self.conn()?;
        payments::table
            .find(id)
            .select(Payment::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(StoreError::not_found("payment", id))
    }

    fn list_payments(&self, filter: &PaymentFilter) -> StoreResult<Vec<Payment>> {
        let mut conn = self.conn()?;
        let mut query = payments::table
            .select(Payment::as_select())
            .order((payments::date.desc(), payments::id.desc()))
            .into_boxed();
        if let Some(account_id) = filter.account_id {
            query = query.filter(payments::account_id.eq(account_id));
        }
        Ok(query.load(&mut conn)?)
    }

    fn save_payment(&self, id: i32, status: PaymentStatus) -> StoreResult<Payment> {
        let mut conn = self.conn()?;
        conn.transaction::<_, StoreError, _>(|conn| {
            let current: PaymentStatus = payments::table
                .find(id)
                .select(payments::status)
                .for_update()
                .first(conn)
                .optional()?
                .ok_or(StoreError::not_found("payment", id))?;
            check_status_change(id, current, status)?;
            Ok(diesel::update(payments::table.find(id))
                .set((payments::status.eq(status), payments::updated_at.eq(Utc::now())))
                .returning(Payment::as_returning())
                .get_result(conn)?)
        })
    }

    fn settle_payment(&self, id: i32) -> StoreResult<Settlement> {
        let mut conn = self.conn()?;
        conn.transaction::<_, StoreError, _>(|conn| {
            let payment: Payment = payments::table
                .find(id)
                .select(Payment::as_select())
                .for_update()
                .first(conn)
                .optional()?
                .ok_or(StoreError::not_found("payment", id))?;
            if payment.status != PaymentStatus::Pending {
                return Err(StoreError::Conflict(format!(
                    "payment {} is already {}",
                    id, payment.status
                )));
            }
            let account: Account = accounts::table
                .find(payment.account_id)
                .select(Account::as_select())
                .for_update()
                .first(conn)?;
            let bill: PatientDischargeDetails = patient_discharge_details::table
                .find(payment.bill_id)
                .select(PatientDischargeDetails::as_select())
                .for_update()
                .first(conn)?;
            if bill.paid {
                return Err(bill_already_paid(bill.id));
            }

            let outcome = settlement_outcome(&account, &bill);
            let (account, bill) = if outcome == PaymentStatus::Completed {
                let account: Account = diesel::update(accounts::table.find(account.id))
                    .set(accounts::balance_cents.eq(accounts::balance_cents - amount_in_cents(&bill)))
                    .returning(Account::as_returning())
                    .get_result(conn)?;
                let bill: PatientDischargeDetails =
                    diesel::update(patient_discharge_details::table.find(bill.id))
                        .set(patient_discharge_details::paid.eq(true))
                        .returning(PatientDischargeDetails::as_returning())
                        .get_result(conn)?;
                (account, bill)
            } else {
                (account, bill)
            };

            let payment: Payment = diesel::update(payments::table.find(id))
                .set((payments::status.eq(outcome), payments::updated_at.eq(Utc::now())))
                .returning(Payment::as_returning())
                .get_result(conn)?;
            Ok(Settlement {
                payment,
                account,
                bill,
            })
        })
    }
}
