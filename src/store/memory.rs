//! In-process store with the same uniqueness, reference and cascade rules as
//! the PostgreSQL schema. Used by the test-suite and `HOSPITAL_STORE=memory`.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use super::{bill_already_paid, check_status_change, Store};
use crate::error::{StoreError, StoreResult};
use crate::models::*;
use crate::transaction::{self, TransactionIdStyle};

#[derive(Default)]
struct Tables {
    next_id: i32,
    users: BTreeMap<i32, User>,
    doctors: BTreeMap<i32, Doctor>,
    patients: BTreeMap<i32, Patient>,
    appointments: BTreeMap<i32, Appointment>,
    discharges: BTreeMap<i32, PatientDischargeDetails>,
    accounts: BTreeMap<i32, Account>,
    payments: BTreeMap<i32, Payment>,
}

fn unique_violation(constraint: &str) -> StoreError {
    StoreError::Conflict(format!(
        "duplicate key value violates unique constraint \"{}\"",
        constraint
    ))
}

fn missing_reference(constraint: &str) -> StoreError {
    StoreError::InvalidReference(format!(
        "insert or update violates foreign key constraint \"{}\"",
        constraint
    ))
}

impl Tables {
    fn allocate_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn require_user(&self, id: i32, constraint: &str) -> StoreResult<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(missing_reference(constraint))
        }
    }

    fn remove_doctor(&mut self, id: i32) {
        if self.doctors.remove(&id).is_none() {
            return;
        }
        self.appointments.retain(|_, a| a.doctor_id != id);
        for patient in self.patients.values_mut() {
            if patient.assigned_doctor_id == Some(id) {
                patient.assigned_doctor_id = None;
            }
        }
    }

    fn remove_patient(&mut self, id: i32) {
        if self.patients.remove(&id).is_none() {
            return;
        }
        self.appointments.retain(|_, a| a.patient_id != id);
        let bills: Vec<i32> = self
            .discharges
            .values()
            .filter(|d| d.patient_id == id)
            .map(|d| d.id)
            .collect();
        for bill_id in bills {
            self.discharges.remove(&bill_id);
            self.payments.retain(|_, p| p.bill_id != bill_id);
        }
    }

    fn remove_account(&mut self, id: i32) {
        if self.accounts.remove(&id).is_some() {
            self.payments.retain(|_, p| p.account_id != id);
        }
    }
}

pub struct MemoryStore {
    tables: Mutex<Tables>,
    transaction_id_style: TransactionIdStyle,
}

impl MemoryStore {
    pub fn new(transaction_id_style: TransactionIdStyle) -> Self {
        MemoryStore {
            tables: Mutex::new(Tables::default()),
            transaction_id_style,
        }
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new(TransactionIdStyle::default())
    }
}

fn newest_first<T, F>(rows: &mut [T], key: F)
where
    F: Fn(&T) -> (chrono::DateTime<Utc>, i32),
{
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

impl Store for MemoryStore {
    fn create_user(&self, new: NewUser) -> StoreResult<User> {
        new.validate()?;
        let mut t = self.tables();
        if t.users.values().any(|u| u.username == new.username) {
            return Err(unique_violation("users_username_key"));
        }
        let user = User {
            id: t.allocate_id(),
            username: new.username,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            date_joined: Utc::now(),
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn get_user(&self, id: i32) -> StoreResult<User> {
        self.tables()
            .users
            .get(&id)
            .cloned()
            .ok_or(StoreError::not_found("user", id))
    }

    fn delete_user(&self, id: i32) -> StoreResult<()> {
        let mut t = self.tables();
        if t.users.remove(&id).is_none() {
            return Err(StoreError::not_found("user", id));
        }
        let doctors: Vec<i32> = t.doctors.values().filter(|d| d.user_id == id).map(|d| d.id).collect();
        let patients: Vec<i32> = t.patients.values().filter(|p| p.user_id == id).map(|p| p.id).collect();
        let accounts: Vec<i32> = t.accounts.values().filter(|a| a.holder_id == id).map(|a| a.id).collect();
        for doctor_id in doctors {
            t.remove_doctor(doctor_id);
        }
        for patient_id in patients {
            t.remove_patient(patient_id);
        }
        for account_id in accounts {
            t.remove_account(account_id);
        }
        Ok(())
    }

    fn create_doctor(&self, new: NewDoctor) -> StoreResult<Doctor> {
        new.validate()?;
        let mut t = self.tables();
        t.require_user(new.user_id, "doctors_user_id_fkey")?;
        if t.doctors.values().any(|d| d.user_id == new.user_id) {
            return Err(unique_violation("doctors_user_id_key"));
        }
        let doctor = Doctor {
            id: t.allocate_id(),
            user_id: new.user_id,
            profile_pic: new.profile_pic,
            address: new.address,
            mobile: new.mobile,
            department: new.department,
            status: new.status,
        };
        t.doctors.insert(doctor.id, doctor.clone());
        Ok(doctor)
    }

    fn get_doctor(&self, id: i32) -> StoreResult<Doctor> {
        self.tables()
            .doctors
            .get(&id)
            .cloned()
            .ok_or(StoreError::not_found("doctor", id))
    }

    fn doctor_profile(&self, id: i32) -> StoreResult<DoctorProfile> {
        let t = self.tables();
        let doctor = t.doctors.get(&id).cloned().ok_or(StoreError::not_found("doctor", id))?;
        let user = t
            .users
            .get(&doctor.user_id)
            .cloned()
            .ok_or(StoreError::not_found("user", doctor.user_id))?;
        Ok(DoctorProfile { doctor, user })
    }

    fn list_doctors(&self, filter: &DoctorFilter) -> StoreResult<Vec<Doctor>> {
        Ok(self
            .tables()
            .doctors
            .values()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect())
    }

    fn update_doctor(&self, id: i32, changes: DoctorChanges) -> StoreResult<Doctor> {
        changes.validate()?;
        let mut t = self.tables();
        let doctor = t.doctors.get_mut(&id).ok_or(StoreError::not_found("doctor", id))?;
        changes.apply(doctor);
        Ok(doctor.clone())
    }

    fn delete_doctor(&self, id: i32) -> StoreResult<()> {
        let mut t = self.tables();
        if !t.doctors.contains_key(&id) {
            return Err(StoreError::not_found("doctor", id));
        }
        t.remove_doctor(id);
        Ok(())
    }

    fn create_patient(&self, new: NewPatient) -> StoreResult<Patient> {
        new.validate()?;
        let mut t = self.tables();
        t.require_user(new.user_id, "patients_user_id_fkey")?;
        if t.patients.values().any(|p| p.user_id == new.user_id) {
            return Err(unique_violation("patients_user_id_key"));
        }
        if let Some(doctor_id) = new.assigned_doctor_id {
            if !t.doctors.contains_key(&doctor_id) {
                return Err(missing_reference("patients_assigned_doctor_id_fkey"));
            }
        }
        let patient = Patient {
            id: t.allocate_id(),
            user_id: new.user_id,
            profile_pic: new.profile_pic,
            address: new.address,
            mobile: new.mobile,
            symptoms: new.symptoms,
            assigned_doctor_id: new.assigned_doctor_id,
            admit_date: new.admit_date,
            status: new.status,
        };
        t.patients.insert(patient.id, patient.clone());
        Ok(patient)
    }

    fn get_patient(&self, id: i32) -> StoreResult<Patient> {
        self.tables()
            .patients
            .get(&id)
            .cloned()
            .ok_or(StoreError::not_found("patient", id))
    }

    fn patient_profile(&self, id: i32) -> StoreResult<PatientProfile> {
        let t = self.tables();
        let patient = t.patients.get(&id).cloned().ok_or(StoreError::not_found("patient", id))?;
        let user = t
            .users
            .get(&patient.user_id)
            .cloned()
            .ok_or(StoreError::not_found("user", patient.user_id))?;
        Ok(PatientProfile { patient, user })
    }

    fn list_patients(&self, filter: &PatientFilter) -> StoreResult<Vec<Patient>> {
        Ok(self
            .tables()
            .patients
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    fn update_patient(&self, id: i32, changes: PatientChanges) -> StoreResult<Patient> {
        changes.validate()?;
        let mut t = self.tables();
        if let Some(Some(doctor_id)) = changes.assigned_doctor_id {
            if !t.doctors.contains_key(&doctor_id) {
                return Err(missing_reference("patients_assigned_doctor_id_fkey"));
            }
        }
        let patient = t.patients.get_mut(&id).ok_or(StoreError::not_found("patient", id))?;
        changes.apply(patient);
        Ok(patient.clone())
    }

    fn delete_patient(&self, id: i32) -> StoreResult<()> {
        let mut t = self.tables();
        if !t.patients.contains_key(&id) {
            return Err(StoreError::not_found("patient", id));
        }
        t.remove_patient(id);
        Ok(())
    }

    fn create_appointment(&self, new: NewAppointment) -> StoreResult<Appointment> {
        new.validate()?;
        let mut t = self.tables();
        if !t.patients.contains_key(&new.patient_id) {
            return Err(missing_reference("appointments_patient_id_fkey"));
        }
        if !t.doctors.contains_key(&new.doctor_id) {
            return Err(missing_reference("appointments_doctor_id_fkey"));
        }
        let appointment = Appointment {
            id: t.allocate_id(),
            patient_id: new.patient_id,
            doctor_id: new.doctor_id,
            appointment_date: new.appointment_date,
            description: new.description,
            status: new.status,
        };
        t.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    fn get_appointment(&self, id: i32) -> StoreResult<Appointment> {
        self.tables()
            .appointments
            .get(&id)
            .cloned()
            .ok_or(StoreError::not_found("appointment", id))
    }

    fn list_appointments(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        Ok(self
            .tables()
            .appointments
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect())
    }

    fn update_appointment(&self, id: i32, changes: AppointmentChanges) -> StoreResult<Appointment> {
        changes.validate()?;
        let mut t = self.tables();
        let appointment = t
            .appointments
            .get_mut(&id)
            .ok_or(StoreError::not_found("appointment", id))?;
        changes.apply(appointment);
        Ok(appointment.clone())
    }

    fn delete_appointment(&self, id: i32) -> StoreResult<()> {
        match self.tables().appointments.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found("appointment", id)),
        }
    }

    fn create_discharge(&self, new: NewDischarge) -> StoreResult<PatientDischargeDetails> {
        new.validate()?;
        let mut t = self.tables();
        if !t.patients.contains_key(&new.patient_id) {
            return Err(missing_reference("patient_discharge_details_patient_id_fkey"));
        }
        if t.discharges.values().any(|d| d.patient_id == new.patient_id) {
            return Err(unique_violation("patient_discharge_details_patient_id_key"));
        }
        let bill = PatientDischargeDetails {
            id: t.allocate_id(),
            patient_id: new.patient_id,
            address: new.address,
            mobile: new.mobile,
            symptoms: new.symptoms,
            release_date: new.release_date,
            day_spent: new.day_spent,
            room_charge: new.room_charge,
            medicine_cost: new.medicine_cost,
            doctor_fee: new.doctor_fee,
            other_charge: new.other_charge,
            total: new.total,
            paid: new.paid,
            provider_order_id: new.provider_order_id,
            provider_payment_id: new.provider_payment_id,
        };
        t.discharges.insert(bill.id, bill.clone());
        Ok(bill)
    }

    fn get_discharge(&self, id: i32) -> StoreResult<PatientDischargeDetails> {
        self.tables()
            .discharges
            .get(&id)
            .cloned()
            .ok_or(StoreError::not_found("discharge", id))
    }

    fn discharge_for_patient(&self, patient_id: i32) -> StoreResult<PatientDischargeDetails> {
        self.tables()
            .discharges
            .values()
            .find(|d| d.patient_id == patient_id)
            .cloned()
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
        let mut t = self.tables();
        let bill = t.discharges.get_mut(&id).ok_or(StoreError::not_found("discharge", id))?;
        changes.apply(bill);
        Ok(bill.clone())
    }

    fn create_account(&self, new: NewAccount) -> StoreResult<Account> {
        new.validate()?;
        let mut t = self.tables();
        t.require_user(new.holder_id, "accounts_holder_id_fkey")?;
        if t.accounts.values().any(|a| a.holder_id == new.holder_id) {
            return Err(unique_violation("accounts_holder_id_key"));
        }
        if t.accounts.values().any(|a| a.account_number == new.account_number) {
            return Err(unique_violation("accounts_account_number_key"));
        }
        let account = Account {
            id: t.allocate_id(),
            holder_id: new.holder_id,
            account_number: new.account_number,
            balance_cents: new.balance_cents,
            date: Utc::now(),
            status: new.status,
        };
        t.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    fn get_account(&self, id: i32) -> StoreResult<Account> {
        self.tables()
            .accounts
            .get(&id)
            .cloned()
            .ok_or(StoreError::not_found("account", id))
    }

    fn account_for_holder(&self, holder_id: i32) -> StoreResult<Account> {
        self.tables()
            .accounts
            .values()
            .find(|a| a.holder_id == holder_id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "account for holder",
                id: holder_id,
            })
    }

    fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        let mut rows: Vec<Account> = self.tables().accounts.values().cloned().collect();
        newest_first(&mut rows, |a| (a.date, a.id));
        Ok(rows)
    }

    fn update_account_status(&self, id: i32, status: AccountStatus) -> StoreResult<Account> {
        let mut t = self.tables();
        let account = t.accounts.get_mut(&id).ok_or(StoreError::not_found("account", id))?;
        account.status = status;
        Ok(account.clone())
    }

    fn create_payment(&self, request: CreatePayment) -> StoreResult<Payment> {
        request.validate()?;
        let mut t = self.tables();
        let account_number = match t.accounts.get(&request.account_id) {
            Some(account) => account.account_number.clone(),
            None => return Err(missing_reference("payments_account_id_fkey")),
        };
        if !t.discharges.contains_key(&request.bill_id) {
            return Err(missing_reference("payments_bill_id_fkey"));
        }
        if t.payments.values().any(|p| p.bill_id == request.bill_id) {
            return Err(unique_violation("payments_bill_id_key"));
        }
        let now = Utc::now();
        let new = NewPayment {
            account_id: request.account_id,
            bill_id: request.bill_id,
            status: request.status,
            transaction_id: transaction::assign(
                request.transaction_id,
                self.transaction_id_style,
                &account_number,
                now,
            ),
            date: now,
            created_at: now,
            updated_at: now,
        };
        new.validate()?;
        if t.payments.values().any(|p| p.transaction_id == new.transaction_id) {
            return Err(unique_violation("payments_transaction_id_key"));
        }
        let payment = Payment {
            id: t.allocate_id(),
            account_id: new.account_id,
            bill_id: new.bill_id,
            date: new.date,
            status: new.status,
            transaction_id: new.transaction_id,
            created_at: new.created_at,
            updated_at: new.updated_at,
        };
        t.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    fn get_payment(&self, id: i32) -> StoreResult<Payment> {
        self.tables()
            .payments
            .get(&id)
            .cloned()
            .ok_or(StoreError::not_found("payment", id))
    }

    fn list_payments(&self, filter: &PaymentFilter) -> StoreResult<Vec<Payment>> {
        let mut rows: Vec<Payment> = self
            .tables()
            .payments
            .values()
            .filter(|p| filter.account_id.is_none_or(|a| p.account_id == a))
            .cloned()
            .collect();
        newest_first(&mut rows, |p| (p.date, p.id));
        Ok(rows)
    }

    fn save_payment(&self, id: i32, status: PaymentStatus) -> StoreResult<Payment> {
        let mut t = self.tables();
        let payment = t.payments.get_mut(&id).ok_or(StoreError::not_found("payment", id))?;
        check_status_change(id, payment.status, status)?;
        payment.status = status;
        payment.updated_at = Utc::now();
        Ok(payment.clone())
    }

    fn settle_payment(&self, id: i32) -> StoreResult<Settlement> {
        let mut t = self.tables();
        let payment = t.payments.get(&id).cloned().ok_or(StoreError::not_found("payment", id))?;
        if payment.status != PaymentStatus::Pending {
            return Err(StoreError::Conflict(format!(
                "payment {} is already {}",
                id, payment.status
            )));
        }
        let mut account = t
            .accounts
            .get(&payment.account_id)
            .cloned()
            .ok_or(StoreError::not_found("account", payment.account_id))?;
        let mut bill = t
            .discharges
            .get(&payment.bill_id)
            .cloned()
            .ok_or(StoreError::not_found("discharge", payment.bill_id))?;
        if bill.paid {
            return Err(bill_already_paid(bill.id));
        }

        let outcome = settlement_outcome(&account, &bill);
        if outcome == PaymentStatus::Completed {
            account.balance_cents -= amount_in_cents(&bill);
            bill.paid = true;
            t.accounts.insert(account.id, account.clone());
            t.discharges.insert(bill.id, bill.clone());
        }
        let mut payment = payment;
        payment.status = outcome;
        payment.updated_at = Utc::now();
        t.payments.insert(payment.id, payment.clone());

        Ok(Settlement {
            payment,
            account,
            bill,
        })
    }
}
