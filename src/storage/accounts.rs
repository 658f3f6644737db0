//! Account repository for one book
//!
//! Manages loading and saving a book's accounts to
//! `books/<bookUID>/accounts.json`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{BooksError, BooksResult};
use crate::models::{Account, AccountId, AccountType};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub(crate) struct AccountData {
    pub(crate) accounts: Vec<Account>,
}

/// Repository for account persistence
#[derive(Debug)]
pub struct AccountRepository {
    path: PathBuf,
    data: RwLock<HashMap<AccountId, Account>>,
}

impl AccountRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load accounts from disk
    pub fn load(&self) -> BooksResult<()> {
        let file_data: AccountData = read_json(&self.path)?;
        let mut data = self.write_lock()?;

        data.clear();
        for account in file_data.accounts {
            data.insert(account.id, account);
        }

        Ok(())
    }

    /// Save accounts to disk
    pub fn save(&self) -> BooksResult<()> {
        let file_data = AccountData {
            accounts: self.get_all()?,
        };
        write_json_atomic(&self.path, &file_data)
    }

    pub fn get(&self, id: AccountId) -> BooksResult<Option<Account>> {
        Ok(self.read_lock()?.get(&id).cloned())
    }

    /// All accounts, ordered by type then name
    pub fn get_all(&self) -> BooksResult<Vec<Account>> {
        let data = self.read_lock()?;
        let mut accounts: Vec<_> = data.values().cloned().collect();
        accounts.sort_by(|a, b| {
            (a.account_type as u8)
                .cmp(&(b.account_type as u8))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(accounts)
    }

    /// Get an account by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> BooksResult<Option<Account>> {
        Ok(self
            .read_lock()?
            .values()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    /// Find by name or full account id
    pub fn find(&self, identifier: &str) -> BooksResult<Option<Account>> {
        if let Some(account) = self.get_by_name(identifier)? {
            return Ok(Some(account));
        }
        match identifier.parse::<AccountId>() {
            Ok(id) => self.get(id),
            Err(_) => Ok(None),
        }
    }

    pub fn root_account(&self) -> BooksResult<Option<Account>> {
        Ok(self
            .read_lock()?
            .values()
            .find(|a| a.account_type == AccountType::Root)
            .cloned())
    }

    pub fn upsert(&self, account: Account) -> BooksResult<()> {
        self.write_lock()?.insert(account.id, account);
        Ok(())
    }

    pub fn bulk_add(&self, accounts: Vec<Account>) -> BooksResult<usize> {
        let mut data = self.write_lock()?;
        let count = accounts.len();
        for account in accounts {
            data.insert(account.id, account);
        }
        Ok(count)
    }

    /// Remove every account, returning how many were removed
    pub fn delete_all(&self) -> BooksResult<usize> {
        let mut data = self.write_lock()?;
        let count = data.len();
        data.clear();
        Ok(count)
    }

    pub fn count(&self) -> BooksResult<usize> {
        Ok(self.read_lock()?.len())
    }

    fn read_lock(&self) -> BooksResult<RwLockReadGuard<'_, HashMap<AccountId, Account>>> {
        self.data
            .read()
            .map_err(|e| BooksError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write_lock(&self) -> BooksResult<RwLockWriteGuard<'_, HashMap<AccountId, Account>>> {
        self.data
            .write()
            .map_err(|e| BooksError::Storage(format!("Failed to acquire write lock: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_repo() -> (AccountRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let repo = AccountRepository::new(temp_dir.path().join("accounts.json"));
        (repo, temp_dir)
    }

    #[test]
    fn test_save_and_load() {
        let (repo, temp) = create_repo();
        let root = Account::new("Root Account", AccountType::Root, None, "USD").placeholder();
        let bank = Account::new("Checking", AccountType::Bank, Some(root.id), "USD");
        repo.bulk_add(vec![root.clone(), bank.clone()]).unwrap();
        repo.save().unwrap();

        let reloaded = AccountRepository::new(temp.path().join("accounts.json"));
        reloaded.load().unwrap();
        assert_eq!(reloaded.count().unwrap(), 2);
        assert_eq!(reloaded.root_account().unwrap(), Some(root));
        assert_eq!(reloaded.get(bank.id).unwrap(), Some(bank));
    }

    #[test]
    fn test_find_by_name_or_id() {
        let (repo, _temp) = create_repo();
        let bank = Account::new("Checking", AccountType::Bank, None, "USD");
        repo.upsert(bank.clone()).unwrap();

        assert_eq!(repo.find("checking").unwrap(), Some(bank.clone()));
        assert_eq!(repo.find(&bank.id.to_string()).unwrap(), Some(bank));
        assert_eq!(repo.find("Savings").unwrap(), None);
    }

    #[test]
    fn test_delete_all() {
        let (repo, _temp) = create_repo();
        repo.upsert(Account::new("A", AccountType::Cash, None, "USD"))
            .unwrap();
        repo.upsert(Account::new("B", AccountType::Cash, None, "USD"))
            .unwrap();

        assert_eq!(repo.delete_all().unwrap(), 2);
        assert_eq!(repo.count().unwrap(), 0);
    }
}
