//! Transaction repository for one book
//!
//! Manages loading and saving a book's transactions to
//! `books/<bookUID>/transactions.json`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{BooksError, BooksResult};
use crate::models::{AccountId, Transaction, TransactionId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub(crate) struct TransactionData {
    pub(crate) transactions: Vec<Transaction>,
}

/// Repository for transaction persistence
#[derive(Debug)]
pub struct TransactionRepository {
    path: PathBuf,
    data: RwLock<HashMap<TransactionId, Transaction>>,
}

impl TransactionRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> BooksResult<()> {
        let file_data: TransactionData = read_json(&self.path)?;
        let mut data = self.write_lock()?;

        data.clear();
        for txn in file_data.transactions {
            data.insert(txn.id, txn);
        }

        Ok(())
    }

    pub fn save(&self) -> BooksResult<()> {
        let file_data = TransactionData {
            transactions: self.get_all()?,
        };
        write_json_atomic(&self.path, &file_data)
    }

    pub fn get(&self, id: TransactionId) -> BooksResult<Option<Transaction>> {
        Ok(self.read_lock()?.get(&id).cloned())
    }

    /// All transactions, oldest first
    pub fn get_all(&self) -> BooksResult<Vec<Transaction>> {
        let data = self.read_lock()?;
        let mut transactions: Vec<_> = data.values().cloned().collect();
        transactions.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(transactions)
    }

    pub fn get_by_account(&self, account_id: AccountId) -> BooksResult<Vec<Transaction>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|t| t.touches_account(account_id))
            .collect())
    }

    pub fn get_opening_balances(&self) -> BooksResult<Vec<Transaction>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|t| t.is_opening_balance)
            .collect())
    }

    pub fn upsert(&self, txn: Transaction) -> BooksResult<()> {
        self.write_lock()?.insert(txn.id, txn);
        Ok(())
    }

    pub fn bulk_add(&self, transactions: Vec<Transaction>) -> BooksResult<usize> {
        let mut data = self.write_lock()?;
        let count = transactions.len();
        for txn in transactions {
            data.insert(txn.id, txn);
        }
        Ok(count)
    }

    pub fn delete(&self, id: TransactionId) -> BooksResult<bool> {
        Ok(self.write_lock()?.remove(&id).is_some())
    }

    /// Delete everything except template transactions
    pub fn delete_all_non_template(&self) -> BooksResult<usize> {
        let mut data = self.write_lock()?;
        let before = data.len();
        data.retain(|_, t| t.is_template);
        Ok(before - data.len())
    }

    pub fn delete_all(&self) -> BooksResult<usize> {
        let mut data = self.write_lock()?;
        let count = data.len();
        data.clear();
        Ok(count)
    }

    pub fn count(&self) -> BooksResult<usize> {
        Ok(self.read_lock()?.len())
    }

    fn read_lock(&self) -> BooksResult<RwLockReadGuard<'_, HashMap<TransactionId, Transaction>>> {
        self.data
            .read()
            .map_err(|e| BooksError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write_lock(
        &self,
    ) -> BooksResult<RwLockWriteGuard<'_, HashMap<TransactionId, Transaction>>> {
        self.data
            .write()
            .map_err(|e| BooksError::Storage(format!("Failed to acquire write lock: {}", e)))
    }
}
