use anyhow::{Context, Result};
use std::path::Path;

use super::args::{flag, parse_amount, parse_date, parse_id, parse_month, positionals};
use crate::db::Database;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::models::*;

pub(crate) fn as_cli(args: &[String], db: &mut Database) -> Result<()> {
    match args[1].as_str() {
        "wallet" | "w" => cli_wallet(&args[2..], db),
        "wallets" => cli_wallets(&args[2..], db),
        "add" | "a" => cli_add(&args[2..], db),
        "edit" | "e" => cli_edit(&args[2..], db),
        "delete" | "rm" => cli_delete(&args[2..], db),
        "list" | "ls" => cli_list(&args[2..], db),
        "overview" | "o" => cli_overview(&args[2..], db),
        "export" => cli_export(&args[2..], db),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("walletkeeper {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

pub(crate) fn print_usage() {
    println!("walletkeeper — wallets and transactions kept in balance");
    println!();
    println!("Usage: walletkeeper <command>");
    println!();
    println!("Wallets:");
    println!("  wallet add <name>             Create a wallet with zero balance");
    println!("    --uid <id> --image <ref>");
    println!("  wallet rename <id> <name>     Rename a wallet");
    println!("  wallet delete <id>            Delete a wallet that holds no transactions");
    println!("  wallets [--uid <id>]          List wallets, newest first");
    println!();
    println!("Transactions:");
    println!("  add <income|expense> <amount> --wallet <id>");
    println!("    --category <name>           Required for expenses");
    println!("    --desc <text> --date <YYYY-MM-DD> --uid <id> --receipt <ref>");
    println!("  edit <id> <income|expense> <amount> --wallet <id> [same flags as add]");
    println!("  delete <id> --wallet <id>     Delete a transaction and revert its effect");
    println!("  list                          Recent transactions");
    println!("    --wallet <id> --month <YYYY-MM> --uid <id> --limit <n>");
    println!();
    println!("Reports:");
    println!("  overview [--uid <id>]         Total balance, income and expenses");
    println!("  export [path]                 Export transactions to CSV");
    println!("    --month <YYYY-MM>");
    println!();
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
    println!();
    println!("Environment: WALLETKEEPER_DB (database path), WALLETKEEPER_LOG (log filter)");
}

/// Engine rejections carry their kind so scripts can tell them apart.
fn rejected(e: EngineError) -> anyhow::Error {
    let hint = if e.is_retryable() { " (try again)" } else { "" };
    anyhow::anyhow!("[{}] {e}{hint}", e.kind())
}

// ── Wallets ───────────────────────────────────────────────────

fn cli_wallet(args: &[String], db: &mut Database) -> Result<()> {
    let pos = positionals(args);
    let mut engine = Engine::new(db);
    match pos.as_slice() {
        ["add", name, ..] => {
            let payload = WalletPayload {
                image: flag(args, "--image").map(String::from),
                uid: flag(args, "--uid").map(String::from),
                ..WalletPayload::new(*name)
            };
            let wallet = engine.create_or_update_wallet(payload).map_err(rejected)?;
            println!("Created wallet {} ({})", wallet.id, wallet.name);
        }
        ["rename", id, name, ..] => {
            let payload = WalletPayload {
                id: Some(parse_id(id, "wallet")?),
                ..WalletPayload::new(*name)
            };
            let wallet = engine.create_or_update_wallet(payload).map_err(rejected)?;
            println!("Renamed wallet {} to {}", wallet.id, wallet.name);
        }
        ["delete", id, ..] => {
            let id = parse_id(id, "wallet")?;
            engine.delete_wallet(id).map_err(rejected)?;
            println!("Deleted wallet {id}");
        }
        _ => anyhow::bail!(
            "Usage: walletkeeper wallet add <name> | rename <id> <name> | delete <id>"
        ),
    }
    Ok(())
}

fn cli_wallets(args: &[String], db: &mut Database) -> Result<()> {
    let wallets = db.wallets(flag(args, "--uid"))?;
    if wallets.is_empty() {
        println!("No wallets");
        return Ok(());
    }

    println!(
        "{:<4} {:<20} {:>12} {:>12} {:>12}",
        "ID", "Name", "Balance", "Income", "Expenses"
    );
    println!("{}", "─".repeat(64));
    for w in &wallets {
        println!(
            "{:<4} {:<20} {:>12.2} {:>12.2} {:>12.2}",
            w.id, w.name, w.amount, w.total_income, w.total_expenses
        );
    }
    Ok(())
}

// ── Transactions ──────────────────────────────────────────────

/// Build a payload from `<type> <amount>` plus the optional flags.
fn transaction_payload(kind: &str, amount: &str, args: &[String]) -> Result<TransactionPayload> {
    let kind = TransactionType::parse(kind)
        .with_context(|| format!("Unknown transaction type '{kind}', expected income or expense"))?;
    Ok(TransactionPayload {
        id: None,
        kind: Some(kind),
        amount: Some(parse_amount(amount)?),
        wallet_id: flag(args, "--wallet")
            .map(|w| parse_id(w, "wallet"))
            .transpose()?,
        category: flag(args, "--category").map(String::from),
        description: flag(args, "--desc").map(String::from),
        date: flag(args, "--date").map(parse_date).transpose()?,
        receipt_image: flag(args, "--receipt").map(String::from),
        uid: flag(args, "--uid").map(String::from),
    })
}

fn cli_add(args: &[String], db: &mut Database) -> Result<()> {
    let pos = positionals(args);
    let [kind, amount, ..] = pos.as_slice() else {
        anyhow::bail!(
            "Usage: walletkeeper add <income|expense> <amount> --wallet <id> [--category <name>]"
        );
    };
    let payload = transaction_payload(kind, amount, args)?;
    let txn = Engine::new(db)
        .create_or_update_transaction(payload)
        .map_err(rejected)?;
    println!(
        "Recorded {} {} as transaction {}",
        txn.kind, txn.amount, txn.id
    );
    Ok(())
}

fn cli_edit(args: &[String], db: &mut Database) -> Result<()> {
    let pos = positionals(args);
    let [id, kind, amount, ..] = pos.as_slice() else {
        anyhow::bail!(
            "Usage: walletkeeper edit <id> <income|expense> <amount> --wallet <id> [--category <name>]"
        );
    };
    let payload = transaction_payload(kind, amount, args)?.editing(parse_id(id, "transaction")?);
    let txn = Engine::new(db)
        .create_or_update_transaction(payload)
        .map_err(rejected)?;
    println!("Updated transaction {}", txn.id);
    Ok(())
}

fn cli_delete(args: &[String], db: &mut Database) -> Result<()> {
    let pos = positionals(args);
    let (Some(id), Some(wallet)) = (pos.first(), flag(args, "--wallet")) else {
        anyhow::bail!("Usage: walletkeeper delete <id> --wallet <id>");
    };
    let id = parse_id(id, "transaction")?;
    Engine::new(db)
        .delete_transaction(id, parse_id(wallet, "wallet")?)
        .map_err(rejected)?;
    println!("Deleted transaction {id}");
    Ok(())
}

fn cli_list(args: &[String], db: &mut Database) -> Result<()> {
    let filter = TransactionFilter {
        uid: flag(args, "--uid").map(String::from),
        wallet_id: flag(args, "--wallet")
            .map(|w| parse_id(w, "wallet"))
            .transpose()?,
        kind: None,
        month: flag(args, "--month").map(parse_month).transpose()?,
        limit: Some(
            flag(args, "--limit")
                .map(|l| l.parse().with_context(|| format!("Invalid limit: '{l}'")))
                .transpose()?
                .unwrap_or(20),
        ),
    };
    let txns = db.transactions(&filter)?;
    if txns.is_empty() {
        println!("No transactions");
        return Ok(());
    }

    println!(
        "{:<5} {:<10} {:>12} {:<6} {:<16} Description",
        "ID", "Date", "Amount", "Wallet", "Category"
    );
    println!("{}", "─".repeat(70));
    for t in &txns {
        println!(
            "{:<5} {:<10} {:>12.2} {:<6} {:<16} {}",
            t.id,
            t.date,
            t.signed_amount(),
            t.wallet_id,
            t.category.as_deref().unwrap_or("-"),
            t.description,
        );
    }
    Ok(())
}

// ── Reports ───────────────────────────────────────────────────

fn cli_overview(args: &[String], db: &mut Database) -> Result<()> {
    let uid = flag(args, "--uid");
    let overview = db.overview(uid)?;
    let wallets = db.wallets(uid)?;

    println!("walletkeeper — overview");
    println!("{}", "─".repeat(40));
    println!("  Balance:    {:.2}", overview.balance);
    println!("  Income:     {:.2}", overview.income);
    println!("  Expenses:   {:.2}", overview.expenses);
    println!("  Wallets:    {}", wallets.len());

    let drifted: Vec<&Wallet> = wallets.iter().filter(|w| !w.is_balanced()).collect();
    if !drifted.is_empty() {
        println!();
        println!("Wallets whose balance does not match income - expenses:");
        for w in drifted {
            println!("  {} ({})", w.name, w.id);
        }
    }
    Ok(())
}

fn cli_export(args: &[String], db: &mut Database) -> Result<()> {
    let month = flag(args, "--month").map(parse_month).transpose()?;

    let output_path = positionals(args)
        .first()
        .map(|a| shellexpand(a))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            match &month {
                Some(m) => format!("{home}/walletkeeper-export-{m}.csv"),
                None => format!("{home}/walletkeeper-export.csv"),
            }
        });

    let filter = TransactionFilter {
        month,
        ..TransactionFilter::default()
    };
    let count = db.export_to_csv(Path::new(&output_path), &filter)?;
    if count == 0 {
        println!("No transactions matched; wrote header only to {output_path}");
    } else {
        println!("Exported {count} transactions to {output_path}");
    }
    Ok(())
}

fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}
