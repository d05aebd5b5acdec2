mod schema;
mod store;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, TransactionBehavior};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::EngineResult;
use crate::models::*;

pub(crate) use store::{Store, WalletPatch};

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        conn.busy_timeout(Duration::from_secs(5))
            .context("Failed to set busy timeout")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Create missing tables, then bring `schema_version` up to date. A fresh
    /// database starts at the current version; older ones replay every
    /// migration from their stored version onwards.
    fn migrate(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(schema::SCHEMA_V1)?;

        let stored: Option<i32> =
            tx.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
        match stored {
            None => {
                tx.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    params![schema::CURRENT_VERSION],
                )?;
            }
            Some(stored) if stored < schema::CURRENT_VERSION => {
                for (from, sql) in schema::MIGRATIONS.iter().filter(|(from, _)| *from >= stored) {
                    tx.execute_batch(sql)
                        .with_context(|| format!("Migration from version {from} failed"))?;
                }
                tx.execute(
                    "UPDATE schema_version SET version = ?1",
                    params![schema::CURRENT_VERSION],
                )?;
                tracing::info!(from = stored, to = schema::CURRENT_VERSION, "migrated schema");
            }
            Some(_) => {}
        }
        tx.commit()?;
        Ok(())
    }

    #[cfg(test)]
    fn schema_version(&self) -> Result<i32> {
        Ok(self
            .conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?)
    }

    /// Read access outside of any write transaction.
    pub(crate) fn store(&self) -> Store<'_> {
        Store::new(&self.conn)
    }

    /// Run `f` inside one immediate SQLite transaction. Everything `f` writes
    /// is committed together, or rolled back when it returns an error.
    pub(crate) fn atomically<T>(
        &mut self,
        f: impl FnOnce(&Store<'_>) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&Store::new(&tx))?;
        tx.commit()?;
        Ok(value)
    }

    // ── Queries ───────────────────────────────────────────────

    pub(crate) fn wallets(&self, uid: Option<&str>) -> EngineResult<Vec<Wallet>> {
        self.store().list_wallets(uid)
    }

    pub(crate) fn transactions(&self, filter: &TransactionFilter) -> EngineResult<Vec<Transaction>> {
        self.store().list_transactions(filter)
    }

    /// Balance, income and expense totals across the owner's wallets.
    pub(crate) fn overview(&self, uid: Option<&str>) -> EngineResult<Overview> {
        Ok(Overview::from_wallets(&self.wallets(uid)?))
    }

    /// Write the matching transactions to `path` as CSV, newest first. The
    /// header row is written even when nothing matches.
    pub(crate) fn export_to_csv(&self, path: &Path, filter: &TransactionFilter) -> Result<usize> {
        let txns = self.transactions(filter)?;
        let names: HashMap<i64, String> = self
            .wallets(None)?
            .into_iter()
            .map(|w| (w.id, w.name))
            .collect();

        let mut wtr = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        wtr.write_record([
            "id",
            "date",
            "type",
            "amount",
            "wallet",
            "category",
            "description",
        ])?;
        for txn in &txns {
            let wallet = names.get(&txn.wallet_id).map(String::as_str).unwrap_or("");
            wtr.write_record([
                txn.id.to_string().as_str(),
                txn.date.to_string().as_str(),
                txn.kind.as_str(),
                txn.amount.to_string().as_str(),
                wallet,
                txn.category.as_deref().unwrap_or(""),
                txn.description.as_str(),
            ])?;
        }
        wtr.flush()?;
        tracing::info!(rows = txns.len(), path = %path.display(), "exported transactions");
        Ok(txns.len())
    }
}

#[cfg(test)]
mod tests;
