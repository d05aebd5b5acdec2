use rust_decimal::Decimal;

/// The lifetime total a transaction feeds into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Aggregate {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Wallet {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub uid: String,
    pub amount: Decimal,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    /// Revision of the balance fields, bumped on every committed write.
    pub version: i64,
    pub created_at: String,
}

impl Wallet {
    pub fn total(&self, aggregate: Aggregate) -> Decimal {
        match aggregate {
            Aggregate::Income => self.total_income,
            Aggregate::Expense => self.total_expenses,
        }
    }

    pub fn total_mut(&mut self, aggregate: Aggregate) -> &mut Decimal {
        match aggregate {
            Aggregate::Income => &mut self.total_income,
            Aggregate::Expense => &mut self.total_expenses,
        }
    }

    /// `amount == total_income - total_expenses`
    pub fn is_balanced(&self) -> bool {
        self.amount == self.total_income - self.total_expenses
    }
}

/// Fields a caller may supply when creating or renaming a wallet.
///
/// Balances are not part of the payload: a new wallet always starts at
/// zero and only the engine moves money afterwards.
#[derive(Debug, Clone, Default)]
pub(crate) struct WalletPayload {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub uid: Option<String>,
}

impl WalletPayload {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Running totals summed over a set of wallets. Sums saturate at the
/// decimal range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Overview {
    pub balance: Decimal,
    pub income: Decimal,
    pub expenses: Decimal,
}

impl Overview {
    pub fn from_wallets(wallets: &[Wallet]) -> Self {
        wallets.iter().fold(Self::default(), |acc, w| Self {
            balance: acc.balance.saturating_add(w.amount),
            income: acc.income.saturating_add(w.total_income),
            expenses: acc.expenses.saturating_add(w.total_expenses),
        })
    }
}
