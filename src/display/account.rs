//! Account display formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::export::csv::FullNames;
use crate::models::{Account, AccountType};

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "Account")]
    full_name: String,
    #[tabled(rename = "Type")]
    account_type: AccountType,
    #[tabled(rename = "Currency")]
    currency: String,
    #[tabled(rename = "")]
    placeholder: &'static str,
}

/// Accounts by full name, root excluded
pub fn format_account_list(accounts: &[Account]) -> String {
    let names = FullNames::new(accounts);
    let mut rows: Vec<AccountRow> = accounts
        .iter()
        .filter(|a| a.account_type != AccountType::Root)
        .map(|a| AccountRow {
            full_name: names.full_name(a.id),
            account_type: a.account_type,
            currency: a.currency.clone(),
            placeholder: if a.placeholder { "placeholder" } else { "" },
        })
        .collect();

    if rows.is_empty() {
        return "No accounts found.\n".to_string();
    }
    rows.sort_by(|a, b| a.full_name.cmp(&b.full_name));

    let mut table = Table::new(rows);
    table.with(Style::psql());
    format!("{}\n", table)
}
