use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::{check_max_len, check_required, limits};
use crate::error::ValidationError;
use crate::schema::users;

/// Login identity that doctor, patient and account profiles hang off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// First and last name separated by a space, trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Deserialize, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_required("username", &self.username, limits::USERNAME)?;
        check_max_len("first_name", &self.first_name, limits::NAME)?;
        check_max_len("last_name", &self.last_name, limits::NAME)?;
        check_max_len("email", &self.email, limits::EMAIL)?;
        Ok(())
    }
}
