//! Fixed-choice columns stored as their display label in a `VARCHAR` column.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// Each choice enum round-trips through its label, both in SQL and in JSON.
macro_rules! text_choice {
    ($ty:ident, $field:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($label => Ok($ty::$variant),)+
                    other => Err(ValidationError::new(
                        $field,
                        format!("unknown choice '{}'", other),
                    )),
                }
            }
        }

        impl ToSql<Text, Pg> for $ty {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Pg> for $ty {
            fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
                let raw = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
                raw.parse::<$ty>().map_err(|e| e.to_string().into())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Medical specialty a doctor is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum Department {
    #[default]
    Cardiologist,
    Dermatologists,
    EmergencyMedicineSpecialists,
    AllergistsImmunologists,
    Anesthesiologists,
    ColonAndRectalSurgeons,
}

text_choice!(Department, "department", {
    Cardiologist => "Cardiologist",
    Dermatologists => "Dermatologists",
    EmergencyMedicineSpecialists => "Emergency Medicine Specialists",
    AllergistsImmunologists => "Allergists/Immunologists",
    Anesthesiologists => "Anesthesiologists",
    ColonAndRectalSurgeons => "Colon and Rectal Surgeons",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
}

text_choice!(AccountStatus, "status", {
    Active => "Active",
    Inactive => "Inactive",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

text_choice!(PaymentStatus, "status", {
    Pending => "Pending",
    Completed => "Completed",
    Failed => "Failed",
});
