use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::Aggregate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "in" => Some(Self::Income),
            "expense" | "out" => Some(Self::Expense),
            _ => None,
        }
    }

    pub fn aggregate(&self) -> Aggregate {
        match self {
            Self::Income => Aggregate::Income,
            Self::Expense => Aggregate::Expense,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Transaction {
    pub id: i64,
    pub kind: TransactionType,
    /// Always positive; the direction comes from `kind`.
    pub amount: Decimal,
    pub wallet_id: i64,
    pub category: Option<String>,
    pub description: String,
    pub date: NaiveDate,
    pub receipt_image: Option<String>,
    pub uid: String,
    pub created_at: String,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    /// Signed contribution to the wallet balance.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

/// A create or edit request. `id == None` creates a new transaction;
/// otherwise only the supplied optional fields of the stored record change.
#[derive(Debug, Clone, Default)]
pub(crate) struct TransactionPayload {
    pub id: Option<i64>,
    pub kind: Option<TransactionType>,
    pub amount: Option<Decimal>,
    pub wallet_id: Option<i64>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub receipt_image: Option<String>,
    pub uid: Option<String>,
}

impl TransactionPayload {
    #[cfg(test)]
    pub fn income(wallet_id: i64, amount: Decimal) -> Self {
        Self {
            kind: Some(TransactionType::Income),
            amount: Some(amount),
            wallet_id: Some(wallet_id),
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn expense(wallet_id: i64, amount: Decimal, category: impl Into<String>) -> Self {
        Self {
            kind: Some(TransactionType::Expense),
            amount: Some(amount),
            wallet_id: Some(wallet_id),
            category: Some(category.into()),
            ..Self::default()
        }
    }

    /// Turn this payload into an edit of `id`.
    pub fn editing(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

/// Selection for transaction listings and exports.
#[derive(Debug, Clone, Default)]
pub(crate) struct TransactionFilter {
    pub uid: Option<String>,
    pub wallet_id: Option<i64>,
    pub kind: Option<TransactionType>,
    /// Format: "YYYY-MM"
    pub month: Option<String>,
    pub limit: Option<u32>,
}
