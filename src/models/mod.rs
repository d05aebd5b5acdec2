mod transaction;
mod wallet;

pub(crate) use transaction::{Transaction, TransactionFilter, TransactionPayload, TransactionType};
pub(crate) use wallet::{Aggregate, Overview, Wallet, WalletPayload};

#[cfg(test)]
mod tests;
