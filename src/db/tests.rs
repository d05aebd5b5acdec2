#![allow(clippy::unwrap_used)]

use super::*;
use crate::error::{EngineError, ErrorKind};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn insert_wallet(db: &Database, name: &str, uid: &str) -> i64 {
    let patch = WalletPatch {
        name: Some(name.into()),
        uid: Some(uid.into()),
        ..WalletPatch::default()
    };
    db.store().upsert_wallet(None, &patch).unwrap()
}

fn expense_on(wallet_id: i64, amount: Decimal, date: &str) -> TransactionPayload {
    TransactionPayload {
        date: Some(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()),
        ..TransactionPayload::expense(wallet_id, amount, "Food")
    }
}

// ── Schema ────────────────────────────────────────────────────

#[test]
fn test_reopen_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallets.db");

    let id = {
        let db = Database::open(&path).unwrap();
        insert_wallet(&db, "Cash", "u1")
    };

    let db = Database::open(&path).unwrap();
    let wallet = db.store().get_wallet(id).unwrap().unwrap();
    assert_eq!(wallet.name, "Cash");
}

#[test]
fn test_schema_version_recorded_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallets.db");

    let db = Database::open(&path).unwrap();
    assert_eq!(db.schema_version().unwrap(), schema::CURRENT_VERSION);
    drop(db);

    let db = Database::open(&path).unwrap();
    assert_eq!(db.schema_version().unwrap(), schema::CURRENT_VERSION);
    let rows: i64 = db
        .conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn test_older_schema_version_is_raised() {
    let mut db = Database::open_in_memory().unwrap();
    db.conn
        .execute("UPDATE schema_version SET version = 0", [])
        .unwrap();
    db.migrate().unwrap();
    assert_eq!(db.schema_version().unwrap(), schema::CURRENT_VERSION);
}

// ── Wallet store ──────────────────────────────────────────────

#[test]
fn test_wallet_insert_defaults() {
    let db = Database::open_in_memory().unwrap();
    let id = insert_wallet(&db, "Cash", "u1");
    let w = db.store().get_wallet(id).unwrap().unwrap();
    assert_eq!(w.id, id);
    assert_eq!(w.uid, "u1");
    assert!(w.image.is_none());
    assert_eq!(w.amount, Decimal::ZERO);
    assert_eq!(w.version, 0);
    assert!(w.is_balanced());
}

#[test]
fn test_wallet_not_found() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.store().get_wallet(99999).unwrap().is_none());
    let err = db
        .store()
        .upsert_wallet(Some(99999), &WalletPatch::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!db.store().delete_wallet(99999).unwrap());
}

#[test]
fn test_wallet_partial_merge() {
    let db = Database::open_in_memory().unwrap();
    let id = insert_wallet(&db, "Cash", "u1");
    let patch = WalletPatch {
        image: Some("icons/cash.png".into()),
        ..WalletPatch::default()
    };
    db.store().upsert_wallet(Some(id), &patch).unwrap();

    let w = db.store().get_wallet(id).unwrap().unwrap();
    assert_eq!(w.name, "Cash");
    assert_eq!(w.uid, "u1");
    assert_eq!(w.image.as_deref(), Some("icons/cash.png"));
    assert_eq!(w.version, 0);
}

#[test]
fn test_wallet_balances_compare_and_swap() {
    let db = Database::open_in_memory().unwrap();
    let id = insert_wallet(&db, "Cash", "u1");
    let store = db.store();

    let mut w = store.get_wallet(id).unwrap().unwrap();
    w.amount = dec!(10.50);
    w.total_income = dec!(10.50);
    store.write_balances(&w).unwrap();

    let fresh = store.get_wallet(id).unwrap().unwrap();
    assert_eq!(fresh.amount, dec!(10.50));
    assert_eq!(fresh.version, 1);

    // `w` still carries revision 0.
    w.amount = dec!(99);
    let err = store.write_balances(&w).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.is_retryable());
    assert_eq!(store.get_wallet(id).unwrap().unwrap().amount, dec!(10.50));
}

#[test]
fn test_list_wallets_by_owner_newest_first() {
    let db = Database::open_in_memory().unwrap();
    let a = insert_wallet(&db, "A", "u1");
    let _ = insert_wallet(&db, "B", "u2");
    let c = insert_wallet(&db, "C", "u1");

    let mine: Vec<i64> = db.wallets(Some("u1")).unwrap().iter().map(|w| w.id).collect();
    assert_eq!(mine, vec![c, a]);
    assert_eq!(db.wallets(None).unwrap().len(), 3);
    assert!(db.wallets(Some("nobody")).unwrap().is_empty());
}

#[test]
fn test_overview() {
    let db = Database::open_in_memory().unwrap();
    let store = db.store();
    for (name, amount, income, expenses) in [
        ("A", dec!(70), dec!(100), dec!(30)),
        ("B", dec!(5.25), dec!(10), dec!(4.75)),
    ] {
        let id = insert_wallet(&db, name, "u1");
        let mut w = store.get_wallet(id).unwrap().unwrap();
        w.amount = amount;
        w.total_income = income;
        w.total_expenses = expenses;
        store.write_balances(&w).unwrap();
    }
    let overview = db.overview(Some("u1")).unwrap();
    assert_eq!(overview.balance, dec!(75.25));
    assert_eq!(overview.income, dec!(110));
    assert_eq!(overview.expenses, dec!(34.75));
    assert_eq!(db.overview(Some("u2")).unwrap(), Overview::default());
}

// ── Transaction store ─────────────────────────────────────────

#[test]
fn test_transaction_insert_and_get() {
    let db = Database::open_in_memory().unwrap();
    let w = insert_wallet(&db, "Cash", "u1");
    let id = db
        .store()
        .upsert_transaction(None, &expense_on(w, dec!(4.50), "2024-01-15"))
        .unwrap();

    let t = db.store().get_transaction(id).unwrap().unwrap();
    assert_eq!(t.kind, TransactionType::Expense);
    assert_eq!(t.amount, dec!(4.50));
    assert_eq!(t.wallet_id, w);
    assert_eq!(t.category.as_deref(), Some("Food"));
    assert_eq!(t.description, "");
    assert_eq!(t.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    assert!(!t.created_at.is_empty());
}

#[test]
fn test_transaction_insert_requires_effect_fields() {
    let db = Database::open_in_memory().unwrap();
    let err = db
        .store()
        .upsert_transaction(None, &TransactionPayload::default())
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidInput("type is required".into()));
}

#[test]
fn test_transaction_insert_unknown_wallet_violates_foreign_key() {
    let db = Database::open_in_memory().unwrap();
    let err = db
        .store()
        .upsert_transaction(None, &TransactionPayload::income(404, dec!(1)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
}

#[test]
fn test_transaction_update_merges() {
    let db = Database::open_in_memory().unwrap();
    let w = insert_wallet(&db, "Cash", "u1");
    let store = db.store();
    let id = store
        .upsert_transaction(
            None,
            &TransactionPayload {
                description: Some("Coffee".into()),
                ..expense_on(w, dec!(3), "2024-01-02")
            },
        )
        .unwrap();

    let patch = TransactionPayload {
        amount: Some(dec!(3.75)),
        ..TransactionPayload::default()
    };
    store.upsert_transaction(Some(id), &patch).unwrap();

    let t = store.get_transaction(id).unwrap().unwrap();
    assert_eq!(t.amount, dec!(3.75));
    assert_eq!(t.description, "Coffee");
    assert_eq!(t.kind, TransactionType::Expense);
    assert_eq!(t.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());

    let err = store.upsert_transaction(Some(id + 1), &patch).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_transaction_delete() {
    let db = Database::open_in_memory().unwrap();
    let w = insert_wallet(&db, "Cash", "u1");
    let id = db
        .store()
        .upsert_transaction(None, &expense_on(w, dec!(1), "2024-01-01"))
        .unwrap();
    assert_eq!(db.store().wallet_transaction_count(w).unwrap(), 1);
    assert!(db.store().delete_transaction(id).unwrap());
    assert!(!db.store().delete_transaction(id).unwrap());
    assert_eq!(db.store().wallet_transaction_count(w).unwrap(), 0);
}

#[test]
fn test_transaction_filters() {
    let db = Database::open_in_memory().unwrap();
    let w1 = insert_wallet(&db, "W1", "u1");
    let w2 = insert_wallet(&db, "W2", "u2");
    let store = db.store();
    store
        .upsert_transaction(None, &expense_on(w1, dec!(5), "2024-01-10"))
        .unwrap();
    store
        .upsert_transaction(None, &expense_on(w1, dec!(6), "2024-02-01"))
        .unwrap();
    store
        .upsert_transaction(
            None,
            &TransactionPayload {
                uid: Some("u2".into()),
                date: NaiveDate::from_ymd_opt(2024, 1, 20),
                ..TransactionPayload::income(w2, dec!(7))
            },
        )
        .unwrap();

    let all = db.transactions(&TransactionFilter::default()).unwrap();
    let dates: Vec<String> = all.iter().map(|t| t.date.to_string()).collect();
    assert_eq!(dates, vec!["2024-02-01", "2024-01-20", "2024-01-10"]);

    let january = TransactionFilter {
        month: Some("2024-01".into()),
        ..TransactionFilter::default()
    };
    assert_eq!(db.transactions(&january).unwrap().len(), 2);

    let short_month = TransactionFilter {
        month: Some("2024-1".into()),
        ..TransactionFilter::default()
    };
    assert!(db.transactions(&short_month).unwrap().is_empty());

    let w1_only = TransactionFilter {
        wallet_id: Some(w1),
        ..TransactionFilter::default()
    };
    assert_eq!(db.transactions(&w1_only).unwrap().len(), 2);

    let incomes = TransactionFilter {
        kind: Some(TransactionType::Income),
        ..TransactionFilter::default()
    };
    assert_eq!(db.transactions(&incomes).unwrap()[0].amount, dec!(7));

    let by_owner = TransactionFilter {
        uid: Some("u2".into()),
        ..TransactionFilter::default()
    };
    assert_eq!(db.transactions(&by_owner).unwrap().len(), 1);

    let latest = TransactionFilter {
        limit: Some(1),
        ..TransactionFilter::default()
    };
    let latest = db.transactions(&latest).unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].amount, dec!(6));
}

// ── Atomic writes ─────────────────────────────────────────────

#[test]
fn test_atomically_rolls_back_on_error() {
    let mut db = Database::open_in_memory().unwrap();
    let w = insert_wallet(&db, "Cash", "u1");

    let result: EngineResult<()> = db.atomically(|store| {
        let mut wallet = store.get_wallet(w)?.unwrap();
        wallet.amount = dec!(50);
        wallet.total_income = dec!(50);
        store.write_balances(&wallet)?;
        store.upsert_transaction(None, &TransactionPayload::income(w, dec!(50)))?;
        Err(EngineError::Inconsistent("forced".into()))
    });
    assert!(result.is_err());

    let wallet = db.store().get_wallet(w).unwrap().unwrap();
    assert_eq!(wallet.amount, Decimal::ZERO);
    assert_eq!(wallet.version, 0);
    assert_eq!(db.store().wallet_transaction_count(w).unwrap(), 0);
}

#[test]
fn test_atomically_commits() {
    let mut db = Database::open_in_memory().unwrap();
    let w = insert_wallet(&db, "Cash", "u1");
    let id = db
        .atomically(|store| store.upsert_transaction(None, &TransactionPayload::income(w, dec!(1))))
        .unwrap();
    assert!(db.store().get_transaction(id).unwrap().is_some());
}

// ── Export ────────────────────────────────────────────────────

#[test]
fn test_export_to_csv() {
    let db = Database::open_in_memory().unwrap();
    let w = insert_wallet(&db, "Checking", "u1");
    let store = db.store();
    store
        .upsert_transaction(
            None,
            &TransactionPayload {
                description: Some("Corner shop, milk".into()),
                ..expense_on(w, dec!(2.40), "2024-03-02")
            },
        )
        .unwrap();
    store
        .upsert_transaction(None, &expense_on(w, dec!(9), "2024-04-01"))
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("march.csv");
    let filter = TransactionFilter {
        month: Some("2024-03".into()),
        ..TransactionFilter::default()
    };
    let count = db.export_to_csv(&path, &filter).unwrap();
    assert_eq!(count, 1);

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "id,date,type,amount,wallet,category,description");
    assert_eq!(lines[1], "1,2024-03-02,expense,2.40,Checking,Food,\"Corner shop, milk\"");
    assert_eq!(lines.len(), 2);
}

#[test]
fn test_export_nothing_writes_header_only() {
    let db = Database::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    let count = db
        .export_to_csv(&path, &TransactionFilter::default())
        .unwrap();
    assert_eq!(count, 0);

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.trim_end(), "id,date,type,amount,wallet,category,description");
}
