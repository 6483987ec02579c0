use std::fmt;

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::{check_optional, check_required, limits, nullable, Department, User};
use crate::error::ValidationError;
use crate::schema::doctors;

/// Media folder doctor profile pictures are filed under.
pub const DOCTOR_PICTURE_FOLDER: &str = "profile_pic/DoctorProfilePic";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = doctors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Doctor {
    pub id: i32,
    pub user_id: i32,
    pub profile_pic: Option<String>,
    pub address: String,
    pub mobile: Option<String>,
    pub department: Department,
    /// `false` until an administrator approves the registration.
    pub status: bool,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = doctors)]
pub struct NewDoctor {
    pub user_id: i32,
    pub profile_pic: Option<String>,
    pub address: String,
    pub mobile: Option<String>,
    pub department: Department,
    pub status: bool,
}

impl NewDoctor {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_required("address", &self.address, limits::ADDRESS)?;
        check_optional("mobile", self.mobile.as_deref(), limits::MOBILE)?;
        Ok(())
    }
}

// Request body for registering a doctor. The picture arrives base64 encoded
// and is swapped for a media reference before the row is built.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDoctor {
    pub user_id: i32,
    pub address: String,
    pub mobile: Option<String>,
    #[serde(default)]
    pub department: Department,
    #[serde(default)]
    pub status: bool,
    pub profile_pic_base64: Option<String>,
}

impl CreateDoctor {
    pub fn into_new(self, profile_pic: Option<String>) -> NewDoctor {
        NewDoctor {
            user_id: self.user_id,
            profile_pic,
            address: self.address,
            mobile: self.mobile,
            department: self.department,
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, AsChangeset)]
#[diesel(table_name = doctors)]
pub struct DoctorChanges {
    pub address: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub mobile: Option<Option<String>>,
    pub department: Option<Department>,
    pub status: Option<bool>,
    #[serde(skip)]
    pub profile_pic: Option<String>,
}

impl DoctorChanges {
    pub fn is_empty(&self) -> bool {
        self.address.is_none()
            && self.mobile.is_none()
            && self.department.is_none()
            && self.status.is_none()
            && self.profile_pic.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(address) = &self.address {
            check_required("address", address, limits::ADDRESS)?;
        }
        check_optional(
            "mobile",
            self.mobile.as_ref().and_then(|m| m.as_deref()),
            limits::MOBILE,
        )
    }

    pub fn apply(self, doctor: &mut Doctor) {
        if let Some(address) = self.address {
            doctor.address = address;
        }
        if let Some(mobile) = self.mobile {
            doctor.mobile = mobile;
        }
        if let Some(department) = self.department {
            doctor.department = department;
        }
        if let Some(status) = self.status {
            doctor.status = status;
        }
        if let Some(profile_pic) = self.profile_pic {
            doctor.profile_pic = Some(profile_pic);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorFilter {
    pub status: Option<bool>,
}

impl DoctorFilter {
    pub fn matches(&self, doctor: &Doctor) -> bool {
        self.status.is_none_or(|s| doctor.status == s)
    }
}

/// A doctor joined with the user identity it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct DoctorProfile {
    pub doctor: Doctor,
    pub user: User,
}

impl DoctorProfile {
    pub fn name(&self) -> String {
        self.user.full_name()
    }

    pub fn get_id(&self) -> i32 {
        self.user.id
    }
}

impl fmt::Display for DoctorProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.doctor.department)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn profile() -> DoctorProfile {
        DoctorProfile {
            doctor: Doctor {
                id: 7,
                user_id: 3,
                profile_pic: None,
                address: "12 Ward Street".into(),
                mobile: Some("0123456789".into()),
                department: Department::Anesthesiologists,
                status: true,
            },
            user: User {
                id: 3,
                username: "dr.house".into(),
                first_name: "Gregory".into(),
                last_name: "House".into(),
                email: "house@example.org".into(),
                date_joined: Utc::now(),
            },
        }
    }

    #[test]
    fn profile_exposes_user_name_and_id() {
        let p = profile();
        assert_eq!(p.name(), "Gregory House");
        assert_eq!(p.get_id(), 3);
        assert_eq!(p.to_string(), "Gregory House (Anesthesiologists)");
    }

    #[test]
    fn create_defaults_department_and_status() {
        let body: CreateDoctor =
            serde_json::from_str(r#"{"user_id": 3, "address": "12 Ward Street"}"#).unwrap();
        let new = body.into_new(None);
        assert_eq!(new.department, Department::Cardiologist);
        assert!(!new.status);
        assert!(new.validate().is_ok());
    }

    #[test]
    fn address_longer_than_column_is_rejected() {
        let new = NewDoctor {
            user_id: 1,
            profile_pic: None,
            address: "x".repeat(41),
            mobile: None,
            department: Department::Dermatologists,
            status: false,
        };
        assert_eq!(new.validate().unwrap_err().field, "address");
    }

    #[test]
    fn changes_apply_only_present_fields() {
        let mut doctor = profile().doctor;
        let changes = DoctorChanges {
            status: Some(false),
            ..Default::default()
        };
        assert!(!changes.is_empty());
        changes.apply(&mut doctor);
        assert!(!doctor.status);
        assert_eq!(doctor.address, "12 Ward Street");
        assert!(DoctorChanges::default().is_empty());
    }

    #[test]
    fn explicit_null_clears_mobile() {
        let mut doctor = profile().doctor;
        let changes: DoctorChanges = serde_json::from_str(r#"{"mobile": null}"#).unwrap();
        assert_eq!(changes.mobile, Some(None));
        assert!(!changes.is_empty());
        changes.apply(&mut doctor);
        assert_eq!(doctor.mobile, None);

        let untouched: DoctorChanges = serde_json::from_str(r#"{"status": true}"#).unwrap();
        assert_eq!(untouched.mobile, None);
    }
}
