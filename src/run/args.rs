use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Value following `--name`, if present.
pub(crate) fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

/// Arguments that are neither `--flags` nor the value after one.
pub(crate) fn positionals(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            iter.next();
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

/// Parse a user-typed amount. Accepts `$` and thousands separators.
pub(crate) fn parse_amount(s: &str) -> Result<Decimal> {
    let cleaned = s.replace(['$', ','], "");
    Decimal::from_str(cleaned.trim()).with_context(|| format!("Failed to parse '{s}' as an amount"))
}

pub(crate) fn parse_id(s: &str, what: &str) -> Result<i64> {
    s.trim()
        .parse()
        .with_context(|| format!("Invalid {what} id: '{s}'"))
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD"))
}

/// Parse a `YYYY-MM` month, normalised to two-digit months.
pub(crate) fn parse_month(s: &str) -> Result<String> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{s}', expected YYYY-MM"))?;
    Ok(first.format("%Y-%m").to_string())
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
