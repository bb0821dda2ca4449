//! Account Storage
//! Mission: Persist accounts behind a repository trait with soft-delete semantics

use crate::auth::models::{Account, AccountRole};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Account repository abstraction.
///
/// Soft-deleted accounts must stay queryable by email so duplicate-signup
/// and re-login checks keep working. The failure-counter operations are
/// atomic in the backend so concurrent failed logins against the same
/// account cannot lose updates.
pub trait AccountRepository: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Insert or replace the record with this email.
    fn save(&self, account: &Account) -> Result<()>;

    /// Atomically increment the consecutive-failure counter, returning the
    /// new value.
    fn record_failure(&self, email: &str) -> Result<u32>;

    /// Reset the consecutive-failure counter to zero.
    fn reset_failures(&self, email: &str) -> Result<()>;
}

/// SQLite-backed account store.
pub struct SqliteAccountStore {
    db_path: String,
}

impl SqliteAccountStore {
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    /// Open a connection that waits out concurrent writers instead of
    /// surfacing an immediate `SQLITE_BUSY`.
    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    fn init_db(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                failed_logins INTEGER NOT NULL DEFAULT 0,
                nickname TEXT NOT NULL,
                address TEXT NOT NULL,
                avatar_path TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        info!("Account store ready at {}", self.db_path);
        Ok(())
    }

    fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
        let id: String = row.get(0)?;
        let role: String = row.get(3)?;
        Ok(Account {
            id: Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::nil()),
            email: row.get(1)?,
            password_hash: row.get(2)?,
            role: AccountRole::from_str(&role).unwrap_or(AccountRole::Deleted),
            failed_logins: row.get(4)?,
            nickname: row.get(5)?,
            address: row.get(6)?,
            avatar_path: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}

impl AccountRepository for SqliteAccountStore {
    fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, email, password_hash, role, failed_logins,
                    nickname, address, avatar_path, created_at
             FROM accounts WHERE email = ?1",
        )?;

        stmt.query_row(params![email], Self::row_to_account)
            .optional()
            .context("Failed to query account")
    }

    fn save(&self, account: &Account) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO accounts
                (id, email, password_hash, role, failed_logins,
                 nickname, address, avatar_path, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(email) DO UPDATE SET
                id = excluded.id,
                password_hash = excluded.password_hash,
                role = excluded.role,
                failed_logins = excluded.failed_logins,
                nickname = excluded.nickname,
                address = excluded.address,
                avatar_path = excluded.avatar_path,
                created_at = excluded.created_at",
            params![
                account.id.to_string(),
                account.email,
                account.password_hash,
                account.role.as_str(),
                account.failed_logins,
                account.nickname,
                account.address,
                account.avatar_path,
                account.created_at,
            ],
        )
        .context("Failed to save account")?;

        Ok(())
    }

    fn record_failure(&self, email: &str) -> Result<u32> {
        let conn = self.open()?;
        conn.query_row(
            "UPDATE accounts SET failed_logins = failed_logins + 1
             WHERE email = ?1
             RETURNING failed_logins",
            params![email],
            |row| row.get(0),
        )
        .context("Failed to record login failure")
    }

    fn reset_failures(&self, email: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "UPDATE accounts SET failed_logins = 0 WHERE email = ?1",
            params![email],
        )
        .context("Failed to reset login failures")?;
        Ok(())
    }
}

/// In-memory account store for tests and local development.
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountRepository for MemoryAccountStore {
    fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        Ok(self.accounts.lock().get(email).cloned())
    }

    fn save(&self, account: &Account) -> Result<()> {
        self.accounts
            .lock()
            .insert(account.email.clone(), account.clone());
        Ok(())
    }

    fn record_failure(&self, email: &str) -> Result<u32> {
        let mut accounts = self.accounts.lock();
        let account = accounts
            .get_mut(email)
            .context("Account not found for failure record")?;
        account.failed_logins += 1;
        Ok(account.failed_logins)
    }

    fn reset_failures(&self, email: &str) -> Result<()> {
        let mut accounts = self.accounts.lock();
        let account = accounts
            .get_mut(email)
            .context("Account not found for failure reset")?;
        account.failed_logins = 0;
        Ok(())
    }
}
