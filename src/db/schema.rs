pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS wallets (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL,
    image           TEXT,
    uid             TEXT NOT NULL DEFAULT '',
    amount          TEXT NOT NULL DEFAULT '0',
    total_income    TEXT NOT NULL DEFAULT '0',
    total_expenses  TEXT NOT NULL DEFAULT '0',
    version         INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transactions (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    type           TEXT NOT NULL CHECK (type IN ('income', 'expense')),
    amount         TEXT NOT NULL,
    wallet_id      INTEGER NOT NULL REFERENCES wallets(id),
    category       TEXT,
    description    TEXT NOT NULL DEFAULT '',
    date           TEXT NOT NULL,
    receipt_image  TEXT,
    uid            TEXT NOT NULL DEFAULT '',
    created_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_wallets_uid ON wallets(uid);
CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
CREATE INDEX IF NOT EXISTS idx_transactions_wallet ON transactions(wallet_id);
CREATE INDEX IF NOT EXISTS idx_transactions_uid ON transactions(uid);
"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[];
