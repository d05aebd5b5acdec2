//! Entry points that keep wallets and transactions in step.
//!
//! Each operation validates its input, reads the current records, asks
//! [`crate::reconcile`] for a plan and then writes the wallets followed by
//! the transaction record. All of it runs inside one SQLite transaction, so
//! a rejected or failed operation leaves both tables untouched.
use rust_decimal::Decimal;

use crate::db::{Database, Store, WalletPatch};
use crate::error::{EngineError, EngineResult};
use crate::models::*;
use crate::reconcile::{self, Effect, Reconciliation};

pub(crate) struct Engine<'db> {
    db: &'db mut Database,
}

impl<'db> Engine<'db> {
    pub(crate) fn new(db: &'db mut Database) -> Self {
        Self { db }
    }

    // ── Transactions ──────────────────────────────────────────

    /// Create a transaction (`payload.id == None`) or edit an existing one,
    /// moving its money effect between wallets as needed. Returns the stored
    /// record.
    pub(crate) fn create_or_update_transaction(
        &mut self,
        payload: TransactionPayload,
    ) -> EngineResult<Transaction> {
        let effect = match validate(&payload) {
            Ok(effect) => effect,
            Err(e) => {
                tracing::warn!("rejected transaction: {e}");
                return Err(e);
            }
        };

        let result = self.db.atomically(|store| {
            let reconciliation = match payload.id {
                None => {
                    let wallet = require_wallet(store, effect.wallet_id)?;
                    Reconciliation::Create(reconcile::apply_new_transaction(
                        &wallet,
                        effect.amount,
                        effect.kind,
                    )?)
                }
                Some(id) => {
                    let old = store
                        .get_transaction(id)?
                        .ok_or_else(|| EngineError::NotFound(format!("transaction {id}")))?;
                    let old_effect = Effect::of(&old);
                    if old_effect == effect {
                        Reconciliation::MetadataOnly
                    } else {
                        let old_wallet = require_wallet(store, old.wallet_id)?;
                        let new_wallet = if effect.wallet_id == old.wallet_id {
                            None
                        } else {
                            Some(require_wallet(store, effect.wallet_id)?)
                        };
                        reconcile::plan_edit(old_effect, effect, &old_wallet, new_wallet.as_ref())?
                    }
                }
            };
            tracing::debug!(?reconciliation, "planned transaction write");

            execute(store, &reconciliation)?;
            let written = store.upsert_transaction(payload.id, &payload);
            let id = paired_write(written, &reconciliation)?;
            store
                .get_transaction(id)?
                .ok_or_else(|| EngineError::NotFound(format!("transaction {id}")))
        });

        match &result {
            Ok(txn) => tracing::info!(
                transaction = txn.id,
                wallet = txn.wallet_id,
                kind = %txn.kind,
                amount = %txn.amount,
                "saved transaction"
            ),
            Err(e) => tracing::warn!("transaction not saved: {e}"),
        }
        result
    }

    /// Delete a transaction and take its effect back out of `wallet_id`.
    pub(crate) fn delete_transaction(
        &mut self,
        transaction_id: i64,
        wallet_id: i64,
    ) -> EngineResult<()> {
        let result = self.db.atomically(|store| {
            let txn = store
                .get_transaction(transaction_id)?
                .ok_or_else(|| EngineError::NotFound(format!("transaction {transaction_id}")))?;
            if txn.wallet_id != wallet_id {
                return Err(EngineError::InvalidInput(format!(
                    "transaction {transaction_id} belongs to wallet {}, not {wallet_id}",
                    txn.wallet_id
                )));
            }
            let wallet = require_wallet(store, txn.wallet_id)?;
            let reconciliation = reconcile::plan_delete(&txn, &wallet)?;
            tracing::debug!(?reconciliation, "planned transaction delete");

            execute(store, &reconciliation)?;
            let removed = store.delete_transaction(transaction_id)?.then_some(());
            paired_write(
                removed.ok_or_else(|| {
                    EngineError::NotFound(format!("transaction {transaction_id}"))
                }),
                &reconciliation,
            )
        });

        match &result {
            Ok(()) => tracing::info!(
                transaction = transaction_id,
                wallet = wallet_id,
                "deleted transaction"
            ),
            Err(e) => tracing::warn!("transaction not deleted: {e}"),
        }
        result
    }

    // ── Wallets ───────────────────────────────────────────────

    /// Create a wallet with zero balances, or rename / re-icon an existing
    /// one. Balances never change through this path.
    pub(crate) fn create_or_update_wallet(&mut self, payload: WalletPayload) -> EngineResult<Wallet> {
        let name = match payload.name.as_deref().map(str::trim) {
            Some("") => {
                return Err(EngineError::InvalidInput("wallet name must not be empty".into()))
            }
            Some(name) => Some(name.to_string()),
            None if payload.id.is_none() => {
                return Err(EngineError::InvalidInput("wallet name is required".into()))
            }
            None => None,
        };
        let patch = WalletPatch {
            name,
            image: payload.image,
            uid: payload.uid,
            balances: None,
        };

        let wallet = self.db.atomically(|store| {
            let id = store.upsert_wallet(payload.id, &patch)?;
            require_wallet(store, id)
        })?;
        tracing::info!(wallet = wallet.id, name = %wallet.name, "saved wallet");
        Ok(wallet)
    }

    /// Remove an empty wallet. Wallets that still hold transactions are
    /// refused; their transactions have to be deleted or moved first.
    pub(crate) fn delete_wallet(&mut self, wallet_id: i64) -> EngineResult<()> {
        self.db.atomically(|store| {
            require_wallet(store, wallet_id)?;
            let count = store.wallet_transaction_count(wallet_id)?;
            if count > 0 {
                return Err(EngineError::CannotDelete(format!(
                    "wallet {wallet_id} still holds {count} transaction(s)"
                )));
            }
            store.delete_wallet(wallet_id)?;
            Ok(())
        })?;
        tracing::info!(wallet = wallet_id, "deleted wallet");
        Ok(())
    }
}

/// Required fields of a create/edit payload, reduced to its money effect.
fn validate(payload: &TransactionPayload) -> EngineResult<Effect> {
    let amount = payload
        .amount
        .ok_or_else(|| EngineError::InvalidInput("amount is required".into()))?;
    if amount <= Decimal::ZERO {
        return Err(EngineError::InvalidInput(format!(
            "amount must be positive, got {amount}"
        )));
    }
    let wallet_id = payload
        .wallet_id
        .ok_or_else(|| EngineError::InvalidInput("wallet is required".into()))?;
    let kind = payload
        .kind
        .ok_or_else(|| EngineError::InvalidInput("transaction type is required".into()))?;
    let has_category = payload
        .category
        .as_deref()
        .is_some_and(|c| !c.trim().is_empty());
    if kind == TransactionType::Expense && !has_category {
        return Err(EngineError::InvalidInput(
            "category is required for expenses".into(),
        ));
    }
    Ok(Effect {
        wallet_id,
        kind,
        amount,
    })
}

fn require_wallet(store: &Store<'_>, id: i64) -> EngineResult<Wallet> {
    store
        .get_wallet(id)?
        .ok_or_else(|| EngineError::NotFound(format!("wallet {id}")))
}

fn execute(store: &Store<'_>, reconciliation: &Reconciliation) -> EngineResult<()> {
    for (delta, wallet) in reconciliation.steps() {
        store.write_balances(wallet)?;
        tracing::debug!(
            wallet = delta.wallet_id,
            change = %delta.amount,
            aggregate_change = %delta.aggregate_delta,
            total = %wallet.total(delta.aggregate),
            "moved wallet balance"
        );
    }
    Ok(())
}

/// Result of the transaction-record write that follows the wallet writes.
///
/// If the wallets were already written and the record write found nothing to
/// touch, the pair is inconsistent: raise the integrity alarm and fail so
/// the surrounding SQLite transaction rolls the wallet writes back.
fn paired_write<T>(result: EngineResult<T>, reconciliation: &Reconciliation) -> EngineResult<T> {
    match result {
        Err(EngineError::NotFound(what)) if !reconciliation.wallet_writes().is_empty() => {
            tracing::error!(
                target: "integrity",
                record = %what,
                "wallet balances written but transaction record missing; rolling back"
            );
            Err(EngineError::Inconsistent(format!(
                "{what} vanished after its wallet was updated"
            )))
        }
        other => other,
    }
}
