//! Transaction display formatting
//!
//! A register: one line per transaction followed by its splits.

use crate::export::csv::FullNames;
use crate::models::{Account, Transaction};

const DESCRIPTION_WIDTH: usize = 28;

/// Format transactions as a register, newest first
pub fn format_transaction_register(transactions: &[Transaction], accounts: &[Account]) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let names = FullNames::new(accounts);
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));

    let mut output = String::new();
    output.push_str(&format!(
        "{:10}  {:w$}  {:>12}  {}\n",
        "Date",
        "Description",
        "Amount",
        "Flags",
        w = DESCRIPTION_WIDTH
    ));
    output.push_str(&"-".repeat(DESCRIPTION_WIDTH + 34));
    output.push('\n');

    for txn in sorted {
        let mut flags = Vec::new();
        if txn.is_opening_balance {
            flags.push("opening");
        }
        if txn.is_template {
            flags.push("template");
        }
        if !txn.is_balanced() {
            flags.push("unbalanced");
        }

        output.push_str(&format!(
            "{:10}  {:w$}  {:>12}  {}\n",
            txn.date.format("%Y-%m-%d"),
            truncate(&txn.description, DESCRIPTION_WIDTH),
            format!("{} {}", debit_total(txn), txn.currency),
            flags.join(","),
            w = DESCRIPTION_WIDTH
        ));
        for split in &txn.splits {
            output.push_str(&format!(
                "{:10}    {:w$}{:>12}\n",
                "",
                truncate(&names.full_name(split.account_id), DESCRIPTION_WIDTH - 2),
                split.amount.to_string(),
                w = DESCRIPTION_WIDTH - 2
            ));
        }
    }

    output
}

/// Sum of the positive splits, i.e. the amount moved
fn debit_total(txn: &Transaction) -> crate::models::Money {
    txn.splits
        .iter()
        .map(|s| s.amount)
        .filter(|a| a.minor() > 0)
        .sum()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
