//! Wallet and transaction records on top of a SQLite connection.
//!
//! A [`Store`] borrows either the plain connection (reads) or an open
//! `rusqlite::Transaction` (everything the engine writes), so the same
//! read/upsert/delete calls serve both.
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{EngineError, EngineResult};
use crate::models::*;

const WALLET_COLUMNS: &str =
    "id, name, image, uid, amount, total_income, total_expenses, version, created_at";

const TRANSACTION_COLUMNS: &str =
    "id, type, amount, wallet_id, category, description, date, receipt_image, uid, created_at";

/// Partial wallet update. `None` leaves the stored column untouched.
#[derive(Debug, Clone, Default)]
pub(crate) struct WalletPatch {
    pub name: Option<String>,
    pub image: Option<String>,
    pub uid: Option<String>,
    pub balances: Option<Balances>,
}

/// New balance fields plus the revision they were computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Balances {
    pub amount: Decimal,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub expected_version: i64,
}

impl Balances {
    pub(crate) fn of(wallet: &Wallet) -> Self {
        Self {
            amount: wallet.amount,
            total_income: wallet.total_income,
            total_expenses: wallet.total_expenses,
            expected_version: wallet.version,
        }
    }
}

pub(crate) struct Store<'c> {
    conn: &'c Connection,
}

impl<'c> Store<'c> {
    pub(crate) fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    // ── Wallets ───────────────────────────────────────────────

    pub(crate) fn get_wallet(&self, id: i64) -> EngineResult<Option<Wallet>> {
        let result = self.conn.query_row(
            &format!("SELECT {WALLET_COLUMNS} FROM wallets WHERE id = ?1"),
            params![id],
            wallet_from_row,
        );
        match result {
            Ok(w) => Ok(Some(w)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert (`id == None`) or merge the supplied fields into an existing
    /// wallet. Balance fields are only written when the stored revision still
    /// matches `Balances::expected_version`; the revision is then bumped.
    pub(crate) fn upsert_wallet(&self, id: Option<i64>, patch: &WalletPatch) -> EngineResult<i64> {
        let Some(id) = id else {
            let balances = patch.balances.unwrap_or(Balances {
                amount: Decimal::ZERO,
                total_income: Decimal::ZERO,
                total_expenses: Decimal::ZERO,
                expected_version: 0,
            });
            self.conn.execute(
                "INSERT INTO wallets (name, image, uid, amount, total_income, total_expenses, version, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
                params![
                    patch.name.as_deref().unwrap_or_default(),
                    patch.image,
                    patch.uid.as_deref().unwrap_or_default(),
                    balances.amount.to_string(),
                    balances.total_income.to_string(),
                    balances.total_expenses.to_string(),
                    timestamp(),
                ],
            )?;
            let id = self.conn.last_insert_rowid();
            tracing::debug!(wallet = id, "inserted wallet");
            return Ok(id);
        };

        let updated = self.conn.execute(
            "UPDATE wallets SET name = COALESCE(?1, name), image = COALESCE(?2, image), uid = COALESCE(?3, uid)
             WHERE id = ?4",
            params![patch.name, patch.image, patch.uid, id],
        )?;
        if updated == 0 {
            return Err(EngineError::NotFound(format!("wallet {id}")));
        }

        if let Some(b) = patch.balances {
            let updated = self.conn.execute(
                "UPDATE wallets SET amount = ?1, total_income = ?2, total_expenses = ?3, version = version + 1
                 WHERE id = ?4 AND version = ?5",
                params![
                    b.amount.to_string(),
                    b.total_income.to_string(),
                    b.total_expenses.to_string(),
                    id,
                    b.expected_version,
                ],
            )?;
            if updated == 0 {
                return Err(EngineError::Conflict(format!(
                    "wallet {id} changed since revision {}",
                    b.expected_version
                )));
            }
            tracing::debug!(
                wallet = id,
                revision = b.expected_version + 1,
                amount = %b.amount,
                "wrote wallet balances"
            );
        }
        Ok(id)
    }

    /// Write the balance fields of `wallet`, expecting `wallet.version` to
    /// still be the stored revision.
    pub(crate) fn write_balances(&self, wallet: &Wallet) -> EngineResult<()> {
        let patch = WalletPatch {
            balances: Some(Balances::of(wallet)),
            ..WalletPatch::default()
        };
        self.upsert_wallet(Some(wallet.id), &patch)?;
        Ok(())
    }

    pub(crate) fn delete_wallet(&self, id: i64) -> EngineResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM wallets WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    pub(crate) fn wallet_transaction_count(&self, wallet_id: i64) -> EngineResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE wallet_id = ?1",
            params![wallet_id],
            |row| row.get(0),
        )?)
    }

    /// Wallets, newest first, optionally limited to one owner.
    pub(crate) fn list_wallets(&self, uid: Option<&str>) -> EngineResult<Vec<Wallet>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets
             WHERE ?1 IS NULL OR uid = ?1
             ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![uid], wallet_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    // ── Transactions ──────────────────────────────────────────

    pub(crate) fn get_transaction(&self, id: i64) -> EngineResult<Option<Transaction>> {
        let result = self.conn.query_row(
            &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1"),
            params![id],
            transaction_from_row,
        );
        match result {
            Ok(t) => Ok(Some(t)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert (`id == None`) or merge the supplied payload fields into an
    /// existing transaction. Inserts need type, amount and wallet; the date
    /// defaults to today.
    pub(crate) fn upsert_transaction(
        &self,
        id: Option<i64>,
        payload: &TransactionPayload,
    ) -> EngineResult<i64> {
        let kind = payload.kind.map(|k| k.as_str());
        let amount = payload.amount.map(|a| a.to_string());
        let date = payload.date.map(|d| d.to_string());

        let Some(id) = id else {
            let kind = kind.ok_or_else(|| missing("type"))?;
            let amount = amount.ok_or_else(|| missing("amount"))?;
            let wallet_id = payload.wallet_id.ok_or_else(|| missing("wallet"))?;
            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive().to_string());
            self.conn.execute(
                "INSERT INTO transactions (type, amount, wallet_id, category, description, date, receipt_image, uid, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    kind,
                    amount,
                    wallet_id,
                    payload.category,
                    payload.description.as_deref().unwrap_or_default(),
                    date,
                    payload.receipt_image,
                    payload.uid.as_deref().unwrap_or_default(),
                    timestamp(),
                ],
            )?;
            let id = self.conn.last_insert_rowid();
            tracing::debug!(transaction = id, "inserted transaction");
            return Ok(id);
        };

        let updated = self.conn.execute(
            "UPDATE transactions SET
                type = COALESCE(?1, type),
                amount = COALESCE(?2, amount),
                wallet_id = COALESCE(?3, wallet_id),
                category = COALESCE(?4, category),
                description = COALESCE(?5, description),
                date = COALESCE(?6, date),
                receipt_image = COALESCE(?7, receipt_image),
                uid = COALESCE(?8, uid)
             WHERE id = ?9",
            params![
                kind,
                amount,
                payload.wallet_id,
                payload.category,
                payload.description,
                date,
                payload.receipt_image,
                payload.uid,
                id,
            ],
        )?;
        if updated == 0 {
            return Err(EngineError::NotFound(format!("transaction {id}")));
        }
        tracing::debug!(transaction = id, "updated transaction");
        Ok(id)
    }

    pub(crate) fn delete_transaction(&self, id: i64) -> EngineResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    pub(crate) fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> EngineResult<Vec<Transaction>> {
        let mut sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions t WHERE 1=1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(uid) = &filter.uid {
            sql.push_str(&format!(" AND t.uid = ?{}", param_values.len() + 1));
            param_values.push(Box::new(uid.clone()));
        }
        if let Some(wid) = filter.wallet_id {
            sql.push_str(&format!(" AND t.wallet_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(wid));
        }
        if let Some(kind) = filter.kind {
            sql.push_str(&format!(" AND t.type = ?{}", param_values.len() + 1));
            param_values.push(Box::new(kind.as_str()));
        }
        if let Some(m) = &filter.month {
            sql.push_str(&format!(" AND substr(t.date, 1, 7) = ?{}", param_values.len() + 1));
            param_values.push(Box::new(m.clone()));
        }

        sql.push_str(" ORDER BY t.date DESC, t.id DESC");

        if let Some(l) = filter.limit {
            sql.push_str(&format!(" LIMIT {l}"));
        }

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), transaction_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

fn missing(field: &str) -> EngineError {
    EngineError::InvalidInput(format!("{field} is required"))
}

fn wallet_from_row(row: &Row<'_>) -> rusqlite::Result<Wallet> {
    Ok(Wallet {
        id: row.get(0)?,
        name: row.get(1)?,
        image: row.get(2)?,
        uid: row.get(3)?,
        amount: decimal_at(row, 4)?,
        total_income: decimal_at(row, 5)?,
        total_expenses: decimal_at(row, 6)?,
        version: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let kind: String = row.get(1)?;
    let kind = TransactionType::parse(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            Type::Text,
            format!("unknown transaction type {kind:?}").into(),
        )
    })?;
    let date: String = row.get(6)?;
    let date = NaiveDate::from_str(&date)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;
    Ok(Transaction {
        id: row.get(0)?,
        kind,
        amount: decimal_at(row, 2)?,
        wallet_id: row.get(3)?,
        category: row.get(4)?,
        description: row.get(5)?,
        date,
        receipt_image: row.get(7)?,
        uid: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Money is stored as TEXT to keep exact decimal values.
fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
