use chrono::NaiveDate;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::{check_non_negative, check_optional, check_required, limits};
use crate::error::ValidationError;
use crate::schema::patient_discharge_details;

/// Final bill drawn up when a patient is released.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = patient_discharge_details)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PatientDischargeDetails {
    pub id: i32,
    pub patient_id: i32,
    pub address: String,
    pub mobile: Option<String>,
    pub symptoms: Option<String>,
    pub release_date: NaiveDate,
    pub day_spent: i32,
    pub room_charge: i32,
    pub medicine_cost: i32,
    pub doctor_fee: i32,
    pub other_charge: i32,
    pub total: i32,
    pub paid: bool,
    pub provider_order_id: Option<String>,
    pub provider_payment_id: Option<String>,
}

impl PatientDischargeDetails {
    pub fn summary(&self, patient_name: &str) -> String {
        format!(
            "Patient: {} - Discharge Date: {}",
            patient_name, self.release_date
        )
    }
}

/// Room charge is per day; the other components are flat.
pub fn charge_total(
    day_spent: i32,
    room_charge: i32,
    medicine_cost: i32,
    doctor_fee: i32,
    other_charge: i32,
) -> Result<i32, ValidationError> {
    let total = i64::from(room_charge) * i64::from(day_spent)
        + i64::from(medicine_cost)
        + i64::from(doctor_fee)
        + i64::from(other_charge);
    i32::try_from(total).map_err(|_| ValidationError::new("total", "charge total overflows"))
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = patient_discharge_details)]
pub struct NewDischarge {
    pub patient_id: i32,
    pub address: String,
    pub mobile: Option<String>,
    pub symptoms: Option<String>,
    pub release_date: NaiveDate,
    pub day_spent: i32,
    pub room_charge: i32,
    pub medicine_cost: i32,
    pub doctor_fee: i32,
    pub other_charge: i32,
    pub total: i32,
    pub paid: bool,
    pub provider_order_id: Option<String>,
    pub provider_payment_id: Option<String>,
}

impl NewDischarge {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_required("address", &self.address, limits::ADDRESS)?;
        check_optional("mobile", self.mobile.as_deref(), limits::MOBILE)?;
        check_optional("symptoms", self.symptoms.as_deref(), limits::SYMPTOMS)?;
        check_non_negative("day_spent", self.day_spent)?;
        check_non_negative("room_charge", self.room_charge)?;
        check_non_negative("medicine_cost", self.medicine_cost)?;
        check_non_negative("doctor_fee", self.doctor_fee)?;
        check_non_negative("other_charge", self.other_charge)?;
        check_non_negative("total", self.total)?;
        check_optional(
            "provider_order_id",
            self.provider_order_id.as_deref(),
            limits::PROVIDER_ID,
        )?;
        check_optional(
            "provider_payment_id",
            self.provider_payment_id.as_deref(),
            limits::PROVIDER_ID,
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDischarge {
    pub patient_id: i32,
    pub address: String,
    pub mobile: Option<String>,
    pub symptoms: Option<String>,
    pub release_date: NaiveDate,
    pub day_spent: i32,
    pub room_charge: i32,
    pub medicine_cost: i32,
    pub doctor_fee: i32,
    pub other_charge: i32,
    /// Stored as given when present; computed from the components otherwise.
    pub total: Option<i32>,
    #[serde(default)]
    pub paid: bool,
    pub provider_order_id: Option<String>,
    pub provider_payment_id: Option<String>,
}

impl TryFrom<CreateDischarge> for NewDischarge {
    type Error = ValidationError;

    fn try_from(body: CreateDischarge) -> Result<Self, Self::Error> {
        let total = match body.total {
            Some(total) => total,
            None => charge_total(
                body.day_spent,
                body.room_charge,
                body.medicine_cost,
                body.doctor_fee,
                body.other_charge,
            )?,
        };
        Ok(NewDischarge {
            patient_id: body.patient_id,
            address: body.address,
            mobile: body.mobile,
            symptoms: body.symptoms,
            release_date: body.release_date,
            day_spent: body.day_spent,
            room_charge: body.room_charge,
            medicine_cost: body.medicine_cost,
            doctor_fee: body.doctor_fee,
            other_charge: body.other_charge,
            total,
            paid: body.paid,
            provider_order_id: body.provider_order_id,
            provider_payment_id: body.provider_payment_id,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, AsChangeset)]
#[diesel(table_name = patient_discharge_details)]
pub struct DischargeChanges {
    pub paid: Option<bool>,
    pub provider_order_id: Option<String>,
    pub provider_payment_id: Option<String>,
}

impl DischargeChanges {
    pub fn is_empty(&self) -> bool {
        self.paid.is_none() && self.provider_order_id.is_none() && self.provider_payment_id.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_optional(
            "provider_order_id",
            self.provider_order_id.as_deref(),
            limits::PROVIDER_ID,
        )?;
        check_optional(
            "provider_payment_id",
            self.provider_payment_id.as_deref(),
            limits::PROVIDER_ID,
        )
    }

    pub fn apply(self, bill: &mut PatientDischargeDetails) {
        if let Some(paid) = self.paid {
            bill.paid = paid;
        }
        if let Some(order_id) = self.provider_order_id {
            bill.provider_order_id = Some(order_id);
        }
        if let Some(payment_id) = self.provider_payment_id {
            bill.provider_payment_id = Some(payment_id);
        }
    }
}
