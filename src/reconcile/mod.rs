//! Balance reconciliation.
//!
//! Everything here is pure: given wallet snapshots and the old/new money
//! effect of a transaction, compute the wallet states that have to be
//! written. Nothing is persisted; the engine executes the returned plan.
//!
//! A plan carries whole wallet states rather than bare deltas. Each state's
//! `version` is the revision its write expects to find in the store, so a
//! plan that touches the same wallet twice chains the second write onto the
//! revision produced by the first.
use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{Aggregate, Transaction, TransactionType, Wallet};

/// The part of a transaction that moves money.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Effect {
    pub wallet_id: i64,
    pub kind: TransactionType,
    pub amount: Decimal,
}

impl Effect {
    pub(crate) fn of(txn: &Transaction) -> Self {
        Self {
            wallet_id: txn.wallet_id,
            kind: txn.kind,
            amount: txn.amount,
        }
    }
}

/// Change to one wallet: `amount += amount`, `total(aggregate) += aggregate_delta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WalletDelta {
    pub wallet_id: i64,
    pub amount: Decimal,
    pub aggregate: Aggregate,
    pub aggregate_delta: Decimal,
}

impl WalletDelta {
    fn apply(kind: TransactionType, wallet_id: i64, amount: Decimal) -> Self {
        let signed = match kind {
            TransactionType::Income => amount,
            TransactionType::Expense => -amount,
        };
        Self {
            wallet_id,
            amount: signed,
            aggregate: kind.aggregate(),
            aggregate_delta: amount,
        }
    }

    fn revert(kind: TransactionType, wallet_id: i64, amount: Decimal) -> Self {
        let forward = Self::apply(kind, wallet_id, amount);
        Self {
            amount: -forward.amount,
            aggregate_delta: -forward.aggregate_delta,
            ..forward
        }
    }

    /// `wallet` with this delta applied. Fails instead of overflowing.
    pub(crate) fn applied_to(&self, wallet: &Wallet) -> EngineResult<Wallet> {
        let mut next = wallet.clone();
        next.amount = next
            .amount
            .checked_add(self.amount)
            .ok_or_else(|| overflow(wallet))?;
        let total = next.total_mut(self.aggregate);
        *total = total
            .checked_add(self.aggregate_delta)
            .ok_or_else(|| overflow(wallet))?;
        Ok(next)
    }
}

/// Undo a previously applied effect.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RevertPlan {
    pub delta: WalletDelta,
    /// State to write; `version` is the revision the write expects.
    pub wallet: Wallet,
}

/// Apply a new effect.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ApplyPlan {
    pub delta: WalletDelta,
    /// State to write; `version` is the revision the write expects.
    pub wallet: Wallet,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Reconciliation {
    /// Type, amount and wallet are unchanged; no wallet is touched.
    MetadataOnly,
    Create(ApplyPlan),
    Edit { revert: RevertPlan, apply: ApplyPlan },
    Delete(RevertPlan),
}

impl Reconciliation {
    /// Each delta with the wallet state it produces, in write order.
    pub(crate) fn steps(&self) -> Vec<(&WalletDelta, &Wallet)> {
        match self {
            Self::MetadataOnly => Vec::new(),
            Self::Create(apply) => vec![(&apply.delta, &apply.wallet)],
            Self::Edit { revert, apply } => vec![
                (&revert.delta, &revert.wallet),
                (&apply.delta, &apply.wallet),
            ],
            Self::Delete(revert) => vec![(&revert.delta, &revert.wallet)],
        }
    }

    /// Wallet states to persist, in write order.
    pub(crate) fn wallet_writes(&self) -> Vec<&Wallet> {
        self.steps().into_iter().map(|(_, wallet)| wallet).collect()
    }
}

/// Apply a new transaction of `amount` to `wallet`.
///
/// Rejects an expense the wallet cannot cover.
pub(crate) fn apply_new_transaction(
    wallet: &Wallet,
    amount: Decimal,
    kind: TransactionType,
) -> EngineResult<ApplyPlan> {
    if amount <= Decimal::ZERO {
        return Err(EngineError::InvalidInput(format!(
            "amount must be positive, got {amount}"
        )));
    }
    if kind == TransactionType::Expense && wallet.amount < amount {
        return Err(insufficient(wallet, amount));
    }
    let delta = WalletDelta::apply(kind, wallet.id, amount);
    Ok(ApplyPlan {
        wallet: delta.applied_to(wallet)?,
        delta,
    })
}

/// Undo a transaction of `amount` previously applied to `wallet`.
///
/// No balance floor is checked here; callers decide whether a negative
/// result is acceptable.
pub(crate) fn revert_transaction(
    wallet: &Wallet,
    amount: Decimal,
    kind: TransactionType,
) -> EngineResult<RevertPlan> {
    let delta = WalletDelta::revert(kind, wallet.id, amount);
    Ok(RevertPlan {
        wallet: delta.applied_to(wallet)?,
        delta,
    })
}

/// Plan an edit that moves `old` to `new`.
///
/// `new_wallet` is the fresh snapshot of the target wallet and is only
/// consulted when the edit moves the transaction to another wallet.
///
/// Guards, by case:
/// - same wallet (type kept or changed): a new expense must fit in the
///   wallet as it stands now, and the wallet after revert+apply must not be
///   negative.
/// - other wallet (type kept or changed): the old wallet after the revert
///   must not be negative, and the new wallet must cover a new expense.
pub(crate) fn plan_edit(
    old: Effect,
    new: Effect,
    old_wallet: &Wallet,
    new_wallet: Option<&Wallet>,
) -> EngineResult<Reconciliation> {
    if old == new {
        return Ok(Reconciliation::MetadataOnly);
    }
    if new.amount <= Decimal::ZERO {
        return Err(EngineError::InvalidInput(format!(
            "amount must be positive, got {}",
            new.amount
        )));
    }

    let revert = revert_transaction(old_wallet, old.amount, old.kind)?;

    if old.wallet_id == new.wallet_id {
        if new.kind == TransactionType::Expense && old_wallet.amount < new.amount {
            return Err(insufficient(old_wallet, new.amount));
        }
        let mut base = revert.wallet.clone();
        base.version += 1;
        let delta = WalletDelta::apply(new.kind, new.wallet_id, new.amount);
        let applied = delta.applied_to(&base)?;
        if applied.amount < Decimal::ZERO {
            return Err(EngineError::InsufficientBalance(format!(
                "wallet {} ({}) would end at {} after this edit",
                old_wallet.id, old_wallet.name, applied.amount
            )));
        }
        return Ok(Reconciliation::Edit {
            revert,
            apply: ApplyPlan {
                delta,
                wallet: applied,
            },
        });
    }

    let new_wallet = new_wallet
        .filter(|w| w.id == new.wallet_id)
        .ok_or_else(|| EngineError::NotFound(format!("wallet {}", new.wallet_id)))?;

    if revert.wallet.amount < Decimal::ZERO {
        return Err(EngineError::InsufficientBalance(format!(
            "wallet {} ({}) has already spent the funds of this transaction",
            old_wallet.id, old_wallet.name
        )));
    }
    let apply = apply_new_transaction(new_wallet, new.amount, new.kind)?;
    Ok(Reconciliation::Edit { revert, apply })
}

/// Plan the deletion of `txn` from `wallet`.
///
/// Refuses to delete an income whose funds the wallet no longer holds.
pub(crate) fn plan_delete(txn: &Transaction, wallet: &Wallet) -> EngineResult<Reconciliation> {
    if txn.wallet_id != wallet.id {
        return Err(EngineError::InvalidInput(format!(
            "transaction {} belongs to wallet {}, not {}",
            txn.id, txn.wallet_id, wallet.id
        )));
    }
    let revert = revert_transaction(wallet, txn.amount, txn.kind)?;
    if txn.is_income() && revert.wallet.amount < Decimal::ZERO {
        return Err(EngineError::CannotDelete(format!(
            "removing income {} would leave wallet {} ({}) at {}",
            txn.id, wallet.id, wallet.name, revert.wallet.amount
        )));
    }
    Ok(Reconciliation::Delete(revert))
}

fn overflow(wallet: &Wallet) -> EngineError {
    EngineError::InvalidInput(format!(
        "amount out of range for wallet {} ({})",
        wallet.id, wallet.name
    ))
}

fn insufficient(wallet: &Wallet, amount: Decimal) -> EngineError {
    EngineError::InsufficientBalance(format!(
        "wallet {} ({}) holds {}, needs {}",
        wallet.id, wallet.name, wallet.amount, amount
    ))
}
