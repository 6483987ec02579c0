pub mod account;
pub mod appointment;
pub mod choices;
pub mod discharge;
pub mod doctor;
pub mod patient;
pub mod payment;
pub mod user;

pub use account::*;
pub use appointment::*;
pub use choices::*;
pub use discharge::*;
pub use doctor::*;
pub use patient::*;
pub use payment::*;
pub use user::*;

use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::error::ValidationError;

/// Date stamped on new patients and on appointments booked without one.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Column widths shared by the migrations and the request validators.
pub mod limits {
    pub const USERNAME: usize = 150;
    pub const NAME: usize = 150;
    pub const EMAIL: usize = 254;
    pub const ADDRESS: usize = 40;
    pub const MOBILE: usize = 20;
    pub const SYMPTOMS: usize = 100;
    pub const DESCRIPTION: usize = 500;
    pub const ACCOUNT_NUMBER: usize = 20;
    pub const TRANSACTION_ID: usize = 100;
    pub const PROVIDER_ID: usize = 100;
}

/// Partial-update fields on nullable columns: absent stays `None`, an
/// explicit `null` becomes `Some(None)`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn check_max_len(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters (got {})", max, len),
        ));
    }
    Ok(())
}

pub(crate) fn check_required(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "may not be blank"));
    }
    check_max_len(field, value, max)
}

pub(crate) fn check_optional(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(v) => check_max_len(field, v, max),
        None => Ok(()),
    }
}

pub(crate) fn check_non_negative(field: &'static str, value: i32) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::new(field, "must not be negative"));
    }
    Ok(())
}
