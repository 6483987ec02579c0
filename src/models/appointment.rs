use chrono::NaiveDate;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::{check_required, limits};
use crate::error::ValidationError;
use crate::schema::appointments;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = appointments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Appointment {
    pub id: i32,
    pub patient_id: i32,
    pub doctor_id: i32,
    pub appointment_date: NaiveDate,
    pub description: String,
    pub status: bool,
}

impl Appointment {
    pub fn summary(&self, patient_name: &str, doctor_name: &str) -> String {
        format!(
            "Appointment for {} with {} on {}",
            patient_name, doctor_name, self.appointment_date
        )
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = appointments)]
pub struct NewAppointment {
    pub patient_id: i32,
    pub doctor_id: i32,
    pub appointment_date: NaiveDate,
    pub description: String,
    pub status: bool,
}

impl NewAppointment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_required("description", &self.description, limits::DESCRIPTION)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppointment {
    pub patient_id: i32,
    pub doctor_id: i32,
    pub appointment_date: Option<NaiveDate>,
    pub description: String,
    #[serde(default)]
    pub status: bool,
}

impl CreateAppointment {
    /// `today` fills in a missing date.
    pub fn into_new(self, today: NaiveDate) -> NewAppointment {
        NewAppointment {
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            appointment_date: self.appointment_date.unwrap_or(today),
            description: self.description,
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, AsChangeset)]
#[diesel(table_name = appointments)]
pub struct AppointmentChanges {
    pub appointment_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub status: Option<bool>,
}

impl AppointmentChanges {
    pub fn is_empty(&self) -> bool {
        self.appointment_date.is_none() && self.description.is_none() && self.status.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.description {
            Some(description) => check_required("description", description, limits::DESCRIPTION),
            None => Ok(()),
        }
    }

    pub fn apply(self, appointment: &mut Appointment) {
        if let Some(date) = self.appointment_date {
            appointment.appointment_date = date;
        }
        if let Some(description) = self.description {
            appointment.description = description;
        }
        if let Some(status) = self.status {
            appointment.status = status;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentFilter {
    pub patient_id: Option<i32>,
    pub doctor_id: Option<i32>,
    pub status: Option<bool>,
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.patient_id.is_none_or(|p| appointment.patient_id == p)
            && self.doctor_id.is_none_or(|d| appointment.doctor_id == d)
            && self.status.is_none_or(|s| appointment.status == s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_date_defaults_to_today() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let body: CreateAppointment = serde_json::from_str(
            r#"{"patient_id": 1, "doctor_id": 2, "description": "Follow-up"}"#,
        )
        .unwrap();
        let new = body.into_new(today);
        assert_eq!(new.appointment_date, today);
        assert!(!new.status);
    }

    #[test]
    fn description_is_capped() {
        let new = NewAppointment {
            patient_id: 1,
            doctor_id: 2,
            appointment_date: NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
            description: "a".repeat(501),
            status: false,
        };
        assert_eq!(new.validate().unwrap_err().field, "description");
    }

    #[test]
    fn summary_names_both_parties() {
        let appointment = Appointment {
            id: 4,
            patient_id: 1,
            doctor_id: 2,
            appointment_date: NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
            description: "Follow-up".into(),
            status: true,
        };
        assert_eq!(
            appointment.summary("Ann Lee", "Gregory House"),
            "Appointment for Ann Lee with Gregory House on 2024-05-20"
        );
    }
}
