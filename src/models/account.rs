use std::fmt;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::{check_required, limits, AccountStatus, User};
use crate::error::ValidationError;
use crate::schema::accounts;

/// Opening balance for accounts created without one: 10000.00.
pub const DEFAULT_BALANCE_CENTS: i64 = 1_000_000;

/// Ten significant digits, two of them after the decimal point.
pub const MAX_BALANCE_CENTS: i64 = 9_999_999_999;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Account {
    pub id: i32,
    pub holder_id: i32,
    pub account_number: String,
    pub balance_cents: i64,
    pub date: DateTime<Utc>,
    pub status: AccountStatus,
}

impl Account {
    pub fn balance(&self) -> String {
        format_cents(self.balance_cents)
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    pub fn summary(&self, holder: &User) -> String {
        format!(
            "{} - {} - {}",
            holder.full_name(),
            self.account_number,
            self.balance()
        )
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = accounts)]
pub struct NewAccount {
    pub holder_id: i32,
    pub account_number: String,
    pub balance_cents: i64,
    pub status: AccountStatus,
}

impl NewAccount {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_required("account_number", &self.account_number, limits::ACCOUNT_NUMBER)?;
        if !(0..=MAX_BALANCE_CENTS).contains(&self.balance_cents) {
            return Err(ValidationError::new("balance", "out of range"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccount {
    pub holder_id: i32,
    pub account_number: String,
    /// Decimal string such as `"2500.50"`.
    pub balance: Option<String>,
    #[serde(default)]
    pub status: AccountStatus,
}

impl CreateAccount {
    pub fn into_new(self, default_balance_cents: i64) -> Result<NewAccount, ValidationError> {
        let balance_cents = match self.balance.as_deref() {
            Some(raw) => parse_amount(raw)?,
            None => default_balance_cents,
        };
        Ok(NewAccount {
            holder_id: self.holder_id,
            account_number: self.account_number,
            balance_cents,
            status: self.status,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountStatusChange {
    pub status: AccountStatus,
}

/// Parses a non-negative amount with at most two decimal places into cents.
pub fn parse_amount(raw: &str) -> Result<i64, ValidationError> {
    let invalid = || ValidationError::new("balance", format!("'{}' is not a valid amount", raw));
    let raw = raw.trim();
    let (whole, frac) = match raw.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (raw, ""),
    };
    if whole.is_empty()
        || frac.len() > 2
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !frac.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }
    let whole: i64 = whole.parse().map_err(|_| invalid())?;
    let frac: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => frac.parse().map_err(|_| invalid())?,
    };
    let cents = whole
        .checked_mul(100)
        .and_then(|c| c.checked_add(frac))
        .ok_or_else(invalid)?;
    if cents > MAX_BALANCE_CENTS {
        return Err(ValidationError::new("balance", "out of range"));
    }
    Ok(cents)
}

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Balance shown alongside the stored cents.
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    #[serde(flatten)]
    pub account: Account,
    pub balance: String,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        let balance = account.balance();
        AccountView { account, balance }
    }
}

impl fmt::Display for AccountView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.account.account_number, self.balance)
    }
}
