#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;

// ── Transaction ───────────────────────────────────────────────

fn make_txn(kind: TransactionType, amount: Decimal) -> Transaction {
    Transaction {
        id: 1,
        kind,
        amount,
        wallet_id: 1,
        category: None,
        description: "Test".into(),
        date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        receipt_image: None,
        uid: String::new(),
        created_at: String::new(),
    }
}

#[test]
fn test_income() {
    let txn = make_txn(TransactionType::Income, dec!(100.00));
    assert!(txn.is_income());
    assert_eq!(txn.kind.aggregate(), Aggregate::Income);
    assert_eq!(txn.signed_amount(), dec!(100.00));
}

#[test]
fn test_expense() {
    let txn = make_txn(TransactionType::Expense, dec!(50.00));
    assert!(!txn.is_income());
    assert_eq!(txn.kind.aggregate(), Aggregate::Expense);
    assert_eq!(txn.signed_amount(), dec!(-50.00));
}

// ── TransactionType ───────────────────────────────────────────

#[test]
fn test_transaction_type_parse() {
    assert_eq!(TransactionType::parse("income"), Some(TransactionType::Income));
    assert_eq!(TransactionType::parse("INCOME"), Some(TransactionType::Income));
    assert_eq!(TransactionType::parse(" expense "), Some(TransactionType::Expense));
    assert_eq!(TransactionType::parse("out"), Some(TransactionType::Expense));
    assert_eq!(TransactionType::parse("transfer"), None);
    assert_eq!(TransactionType::parse(""), None);
}

#[test]
fn test_transaction_type_roundtrip() {
    for t in [TransactionType::Income, TransactionType::Expense] {
        assert_eq!(TransactionType::parse(t.as_str()), Some(t));
        assert_eq!(format!("{t}"), t.as_str());
    }
}

#[test]
fn test_transaction_type_aggregate() {
    assert_eq!(TransactionType::Income.aggregate(), Aggregate::Income);
    assert_eq!(TransactionType::Expense.aggregate(), Aggregate::Expense);
}

// ── TransactionPayload ────────────────────────────────────────

#[test]
fn test_payload_builders() {
    let p = TransactionPayload::expense(3, dec!(12.5), "Groceries").editing(9);
    assert_eq!(p.id, Some(9));
    assert_eq!(p.wallet_id, Some(3));
    assert_eq!(p.kind, Some(TransactionType::Expense));
    assert_eq!(p.category.as_deref(), Some("Groceries"));

    let p = TransactionPayload::income(3, dec!(1));
    assert!(p.id.is_none());
    assert!(p.category.is_none());
}

// ── Wallet ────────────────────────────────────────────────────

fn make_wallet(amount: Decimal, income: Decimal, expenses: Decimal) -> Wallet {
    Wallet {
        id: 1,
        name: "Cash".into(),
        image: None,
        uid: String::new(),
        amount,
        total_income: income,
        total_expenses: expenses,
        version: 0,
        created_at: String::new(),
    }
}

#[test]
fn test_wallet_totals_accessors() {
    let mut w = make_wallet(dec!(70), dec!(100), dec!(30));
    assert_eq!(w.total(Aggregate::Income), dec!(100));
    assert_eq!(w.total(Aggregate::Expense), dec!(30));

    *w.total_mut(Aggregate::Expense) += dec!(5);
    assert_eq!(w.total_expenses, dec!(35));
    assert_eq!(w.total_income, dec!(100));
}

#[test]
fn test_wallet_is_balanced() {
    assert!(make_wallet(dec!(70), dec!(100), dec!(30)).is_balanced());
    assert!(make_wallet(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO).is_balanced());
    assert!(!make_wallet(dec!(71), dec!(100), dec!(30)).is_balanced());
}

#[test]
fn test_overview_sums_wallets() {
    let wallets = vec![
        make_wallet(dec!(70), dec!(100), dec!(30)),
        make_wallet(dec!(20.50), dec!(25), dec!(4.50)),
    ];
    let overview = Overview::from_wallets(&wallets);
    assert_eq!(overview.balance, dec!(90.50));
    assert_eq!(overview.income, dec!(125));
    assert_eq!(overview.expenses, dec!(34.50));

    assert_eq!(Overview::from_wallets(&[]), Overview::default());
}

#[test]
fn test_overview_saturates() {
    let wallets = vec![
        make_wallet(Decimal::MAX, Decimal::MAX, Decimal::ZERO),
        make_wallet(dec!(1), dec!(1), Decimal::ZERO),
    ];
    let overview = Overview::from_wallets(&wallets);
    assert_eq!(overview.balance, Decimal::MAX);
    assert_eq!(overview.income, Decimal::MAX);
}
