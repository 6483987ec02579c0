use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::{check_optional, check_required, limits, Account, PatientDischargeDetails, PaymentStatus};
use crate::error::ValidationError;
use crate::schema::payments;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Payment {
    pub id: i32,
    pub account_id: i32,
    pub bill_id: i32,
    pub date: DateTime<Utc>,
    pub status: PaymentStatus,
    pub transaction_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// The amount charged is whatever the linked bill totals to.
    pub fn amount(&self, bill: &PatientDischargeDetails) -> i32 {
        bill.total
    }

    pub fn summary(&self, patient_name: &str, bill: &PatientDischargeDetails) -> String {
        format!(
            "{} - {} - {} - {}",
            patient_name,
            self.amount(bill),
            self.status,
            self.transaction_id
        )
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payments)]
pub struct NewPayment {
    pub account_id: i32,
    pub bill_id: i32,
    pub status: PaymentStatus,
    pub transaction_id: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewPayment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_required("transaction_id", &self.transaction_id, limits::TRANSACTION_ID)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePayment {
    pub account_id: i32,
    pub bill_id: i32,
    #[serde(default)]
    pub status: PaymentStatus,
    /// Generated when absent or blank.
    pub transaction_id: Option<String>,
}

impl CreatePayment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_optional("transaction_id", self.transaction_id.as_deref(), limits::TRANSACTION_ID)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentStatusChange {
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentFilter {
    pub account_id: Option<i32>,
}

/// State of the three rows touched by a settlement attempt, after it ran.
#[derive(Debug, Clone, Serialize)]
pub struct Settlement {
    pub payment: Payment,
    pub account: Account,
    pub bill: PatientDischargeDetails,
}

/// Decides how a pending payment resolves against its account.
pub fn settlement_outcome(account: &Account, bill: &PatientDischargeDetails) -> PaymentStatus {
    if account.is_active() && account.balance_cents >= amount_in_cents(bill) {
        PaymentStatus::Completed
    } else {
        PaymentStatus::Failed
    }
}

/// Bill totals are whole currency units; balances are kept in cents.
pub fn amount_in_cents(bill: &PatientDischargeDetails) -> i64 {
    i64::from(bill.total) * 100
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountStatus;
    use chrono::NaiveDate;

    fn bill(total: i32) -> PatientDischargeDetails {
        PatientDischargeDetails {
            id: 1,
            patient_id: 1,
            address: "4 Elm Road".into(),
            mobile: None,
            symptoms: None,
            release_date: NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
            day_spent: 1,
            room_charge: 0,
            medicine_cost: 0,
            doctor_fee: 0,
            other_charge: 0,
            total,
            paid: false,
            provider_order_id: None,
            provider_payment_id: None,
        }
    }

    fn account(balance_cents: i64, status: AccountStatus) -> Account {
        Account {
            id: 1,
            holder_id: 1,
            account_number: "ACC-001".into(),
            balance_cents,
            date: Utc::now(),
            status,
        }
    }

    #[test]
    fn settlement_needs_active_account_with_funds() {
        let b = bill(1_300);
        assert_eq!(
            settlement_outcome(&account(130_000, AccountStatus::Active), &b),
            PaymentStatus::Completed
        );
        assert_eq!(
            settlement_outcome(&account(129_999, AccountStatus::Active), &b),
            PaymentStatus::Failed
        );
        assert_eq!(
            settlement_outcome(&account(1_000_000, AccountStatus::Inactive), &b),
            PaymentStatus::Failed
        );
    }

    #[test]
    fn summary_reports_bill_amount() {
        let now = Utc::now();
        let payment = Payment {
            id: 5,
            account_id: 1,
            bill_id: 1,
            date: now,
            status: PaymentStatus::Pending,
            transaction_id: "ACC-001-20240602140509-a1b2c3".into(),
            created_at: now,
            updated_at: now,
        };
        assert_eq!(
            payment.summary("Ann Lee", &bill(1_300)),
            "Ann Lee - 1300 - Pending - ACC-001-20240602140509-a1b2c3"
        );
    }
}
