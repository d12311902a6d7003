//! Lenient field deserializers for taxpayer facts.
//!
//! Absent, null or non-numeric monetary fields become zero; numeric strings
//! are parsed; negative amounts clamp to zero and amounts above
//! [`MAX_AMOUNT`] clamp to it. Flags that are absent or not
//! booleans become `false`. None of these conditions is an error.

use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::types::Money;

/// Largest accepted amount. Sums and products of amounts this size stay
/// well inside `Decimal` range.
pub const MAX_AMOUNT: Money = dec!(1_000_000_000_000_000);

pub fn money_from_value(value: &Value) -> Money {
    let parsed = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                n.as_f64().and_then(Decimal::from_f64)
            }
        }
        Value::String(s) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',' && *c != '$').collect();
            Decimal::from_str(&cleaned)
                .or_else(|_| Decimal::from_scientific(&cleaned))
                .ok()
        }
        _ => None,
    };
    parsed
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO)
        .min(MAX_AMOUNT)
}

pub fn money<'de, D>(deserializer: D) -> Result<Money, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(money_from_value(&value))
}

pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(matches!(value, Value::Bool(true)))
}

/// Whole non-negative count such as an age. Fractions truncate.
pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(money_from_value(&value).trunc().to_u32().unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_and_numeric_strings() {
        assert_eq!(money_from_value(&json!(60000)), dec!(60_000));
        assert_eq!(money_from_value(&json!(1234.5)), dec!(1_234.5));
        assert_eq!(money_from_value(&json!("2500.25")), dec!(2_500.25));
        assert_eq!(money_from_value(&json!(" $12,000 ")), dec!(12_000));
    }

    #[test]
    fn test_non_numeric_and_missing_become_zero() {
        assert_eq!(money_from_value(&Value::Null), Decimal::ZERO);
        assert_eq!(money_from_value(&json!("n/a")), Decimal::ZERO);
        assert_eq!(money_from_value(&json!(true)), Decimal::ZERO);
        assert_eq!(money_from_value(&json!({"amount": 5})), Decimal::ZERO);
        assert_eq!(money_from_value(&json!([1, 2])), Decimal::ZERO);
    }

    #[test]
    fn test_negative_amounts_clamp_to_zero() {
        assert_eq!(money_from_value(&json!(-500)), Decimal::ZERO);
        assert_eq!(money_from_value(&json!("-12.5")), Decimal::ZERO);
    }

    #[test]
    fn test_huge_amounts_clamp_to_ceiling() {
        assert_eq!(money_from_value(&json!(5e28)), MAX_AMOUNT);
        assert_eq!(money_from_value(&json!("79228162514264337593543950335")), MAX_AMOUNT);
        assert_eq!(money_from_value(&json!(u64::MAX)), MAX_AMOUNT);
        assert_eq!(money_from_value(&json!(999_999_999_999_999i64)), dec!(999_999_999_999_999));
    }

    #[derive(Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "count")]
        age: u32,
        #[serde(default, deserialize_with = "flag")]
        covered: bool,
    }

    #[test]
    fn test_count_and_flag() {
        let p: Fields = serde_json::from_value(json!({"age": "67.9", "covered": "yes"})).unwrap();
        assert_eq!(p.age, 67);
        assert!(!p.covered);
        let p: Fields = serde_json::from_value(json!({"covered": true})).unwrap();
        assert_eq!(p.age, 0);
        assert!(p.covered);
    }
}
