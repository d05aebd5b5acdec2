#![allow(clippy::unwrap_used)]

use super::*;
use rust_decimal_macros::dec;

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_flag_lookup() {
    let a = args(&["expense", "12", "--wallet", "3", "--category", "Food"]);
    assert_eq!(flag(&a, "--wallet"), Some("3"));
    assert_eq!(flag(&a, "--category"), Some("Food"));
    assert_eq!(flag(&a, "--desc"), None);
}

#[test]
fn test_flag_without_value() {
    let a = args(&["list", "--month"]);
    assert_eq!(flag(&a, "--month"), None);
}

#[test]
fn test_positionals_skip_flag_values() {
    let a = args(&["7", "--wallet", "3", "expense", "--desc", "x y", "12.50"]);
    assert_eq!(positionals(&a), vec!["7", "expense", "12.50"]);
    assert!(positionals(&[]).is_empty());
}

#[test]
fn test_parse_amount() {
    assert_eq!(parse_amount("100.50").unwrap(), dec!(100.50));
    assert_eq!(parse_amount("$1,234.56").unwrap(), dec!(1234.56));
    assert_eq!(parse_amount(" 7 ").unwrap(), dec!(7));
    assert_eq!(parse_amount("-3").unwrap(), dec!(-3));
    assert!(parse_amount("abc").is_err());
    assert!(parse_amount("").is_err());
}

#[test]
fn test_parse_id() {
    assert_eq!(parse_id("42", "wallet").unwrap(), 42);
    let err = parse_id("x", "wallet").unwrap_err();
    assert_eq!(err.to_string(), "Invalid wallet id: 'x'");
}

#[test]
fn test_parse_date() {
    assert_eq!(
        parse_date("2024-02-29").unwrap(),
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
    );
    assert!(parse_date("2023-02-29").is_err());
    assert!(parse_date("02/01/2024").is_err());
}

#[test]
fn test_parse_month() {
    assert_eq!(parse_month("2024-03").unwrap(), "2024-03");
    assert_eq!(parse_month(" 2024-1 ").unwrap(), "2024-01");
    assert!(parse_month("2024-13").is_err());
    assert!(parse_month("2024").is_err());
    assert!(parse_month("march").is_err());
    assert!(parse_month("2024-03-15").is_err());
}
