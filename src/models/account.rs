//! Account model
//!
//! Accounts form a tree under a single root, following the GnuCash account
//! types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Root,
    Asset,
    Bank,
    Cash,
    Credit,
    Liability,
    Income,
    Expense,
    Equity,
}

impl AccountType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "root" => Some(Self::Root),
            "asset" => Some(Self::Asset),
            "bank" => Some(Self::Bank),
            "cash" => Some(Self::Cash),
            "credit" | "credit_card" => Some(Self::Credit),
            "liability" => Some(Self::Liability),
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            "equity" => Some(Self::Equity),
            _ => None,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Root => "ROOT",
            Self::Asset => "ASSET",
            Self::Bank => "BANK",
            Self::Cash => "CASH",
            Self::Credit => "CREDIT",
            Self::Liability => "LIABILITY",
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
            Self::Equity => "EQUITY",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,

    pub name: String,

    #[serde(rename = "type")]
    pub account_type: AccountType,

    /// Parent account; `None` only for the root account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<AccountId>,

    /// ISO 4217 currency code
    pub currency: String,

    /// Placeholder accounts only group children and hold no splits
    #[serde(default)]
    pub placeholder: bool,

    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        name: impl Into<String>,
        account_type: AccountType,
        parent_id: Option<AccountId>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id: AccountId::new(),
            name: name.into(),
            account_type,
            parent_id,
            currency: currency.into(),
            placeholder: false,
            created_at: Utc::now(),
        }
    }

    pub fn placeholder(mut self) -> Self {
        self.placeholder = true;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Account name cannot be empty".into());
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(format!("Invalid currency code: '{}'", self.currency));
        }
        if self.account_type == AccountType::Root && self.parent_id.is_some() {
            return Err("Root account cannot have a parent".into());
        }
        Ok(())
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.account_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account_type() {
        assert_eq!(AccountType::parse("Bank"), Some(AccountType::Bank));
        assert_eq!(AccountType::parse("credit_card"), Some(AccountType::Credit));
        assert_eq!(AccountType::parse("savings"), None);
    }

    #[test]
    fn test_validate() {
        let account = Account::new("Checking", AccountType::Bank, None, "EUR");
        assert!(account.validate().is_ok());

        let bad_currency = Account::new("Checking", AccountType::Bank, None, "eur");
        assert!(bad_currency.validate().is_err());

        let root = Account::new("Root", AccountType::Root, Some(AccountId::new()), "USD");
        assert!(root.validate().is_err());
    }

    #[test]
    fn test_serialized_type_field() {
        let account = Account::new("Food", AccountType::Expense, None, "USD");
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["type"], "expense");
    }
}
