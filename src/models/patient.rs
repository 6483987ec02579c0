use std::fmt;

use chrono::NaiveDate;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::{check_required, limits, nullable, User};
use crate::error::ValidationError;
use crate::schema::patients;

pub const PATIENT_PICTURE_FOLDER: &str = "profile_pic/PatientProfilePic";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = patients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Patient {
    pub id: i32,
    pub user_id: i32,
    pub profile_pic: Option<String>,
    pub address: String,
    pub mobile: String,
    pub symptoms: String,
    pub assigned_doctor_id: Option<i32>,
    pub admit_date: NaiveDate,
    pub status: bool,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = patients)]
pub struct NewPatient {
    pub user_id: i32,
    pub profile_pic: Option<String>,
    pub address: String,
    pub mobile: String,
    pub symptoms: String,
    pub assigned_doctor_id: Option<i32>,
    pub admit_date: NaiveDate,
    pub status: bool,
}

impl NewPatient {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_required("address", &self.address, limits::ADDRESS)?;
        check_required("mobile", &self.mobile, limits::MOBILE)?;
        check_required("symptoms", &self.symptoms, limits::SYMPTOMS)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePatient {
    pub user_id: i32,
    pub address: String,
    pub mobile: String,
    pub symptoms: String,
    pub assigned_doctor_id: Option<i32>,
    #[serde(default)]
    pub status: bool,
    pub profile_pic_base64: Option<String>,
}

impl CreatePatient {
    /// Builds the row, stamping the admission date.
    pub fn into_new(self, profile_pic: Option<String>, admit_date: NaiveDate) -> NewPatient {
        NewPatient {
            user_id: self.user_id,
            profile_pic,
            address: self.address,
            mobile: self.mobile,
            symptoms: self.symptoms,
            assigned_doctor_id: self.assigned_doctor_id,
            admit_date,
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, AsChangeset)]
#[diesel(table_name = patients)]
pub struct PatientChanges {
    pub address: Option<String>,
    pub mobile: Option<String>,
    pub symptoms: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub assigned_doctor_id: Option<Option<i32>>,
    pub status: Option<bool>,
    #[serde(skip)]
    pub profile_pic: Option<String>,
}

impl PatientChanges {
    pub fn is_empty(&self) -> bool {
        self.address.is_none()
            && self.mobile.is_none()
            && self.symptoms.is_none()
            && self.assigned_doctor_id.is_none()
            && self.status.is_none()
            && self.profile_pic.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(address) = &self.address {
            check_required("address", address, limits::ADDRESS)?;
        }
        if let Some(mobile) = &self.mobile {
            check_required("mobile", mobile, limits::MOBILE)?;
        }
        if let Some(symptoms) = &self.symptoms {
            check_required("symptoms", symptoms, limits::SYMPTOMS)?;
        }
        Ok(())
    }

    pub fn apply(self, patient: &mut Patient) {
        if let Some(address) = self.address {
            patient.address = address;
        }
        if let Some(mobile) = self.mobile {
            patient.mobile = mobile;
        }
        if let Some(symptoms) = self.symptoms {
            patient.symptoms = symptoms;
        }
        if let Some(doctor_id) = self.assigned_doctor_id {
            patient.assigned_doctor_id = doctor_id;
        }
        if let Some(status) = self.status {
            patient.status = status;
        }
        if let Some(profile_pic) = self.profile_pic {
            patient.profile_pic = Some(profile_pic);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientFilter {
    pub status: Option<bool>,
    pub doctor_id: Option<i32>,
}

impl PatientFilter {
    pub fn matches(&self, patient: &Patient) -> bool {
        self.status.is_none_or(|s| patient.status == s)
            && self
                .doctor_id
                .is_none_or(|d| patient.assigned_doctor_id == Some(d))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatientProfile {
    pub patient: Patient,
    pub user: User,
}

impl PatientProfile {
    pub fn name(&self) -> String {
        self.user.full_name()
    }

    pub fn get_id(&self) -> i32 {
        self.user.id
    }
}

impl fmt::Display for PatientProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.patient.symptoms)
    }
}
