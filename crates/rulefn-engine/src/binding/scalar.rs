//! Scalar values and textual coercion

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared type of a scalar parameter or collection element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    Text,
    Integer,
    Decimal,
    Boolean,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::Text => write!(f, "text"),
            ScalarType::Integer => write!(f, "integer"),
            ScalarType::Decimal => write!(f, "decimal"),
            ScalarType::Boolean => write!(f, "boolean"),
        }
    }
}

/// A bound scalar value
///
/// Ordered so that set parameters iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Boolean(bool),
}

impl Scalar {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Scalar::Text(_) => ScalarType::Text,
            Scalar::Integer(_) => ScalarType::Integer,
            Scalar::Decimal(_) => ScalarType::Decimal,
            Scalar::Boolean(_) => ScalarType::Boolean,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Scalar::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Scalar::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Scalar::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Parse the textual representation of `value` into `target`
    ///
    /// Strings are parsed as-is, every other JSON value through its JSON text,
    /// so `5`, `"5"` and `5` all become `Integer(5)`.
    pub fn coerce(value: &Value, target: ScalarType) -> Result<Scalar, CoercionError> {
        Scalar::parse(&textual(value), target)
    }

    /// Parse text into `target`
    pub fn parse(text: &str, target: ScalarType) -> Result<Scalar, CoercionError> {
        let failed = || CoercionError {
            target,
            text: text.to_string(),
        };

        match target {
            ScalarType::Text => Ok(Scalar::Text(text.to_string())),
            ScalarType::Integer => text.parse::<i64>().map(Scalar::Integer).map_err(|_| failed()),
            ScalarType::Decimal => parse_decimal(text).map(Scalar::Decimal).ok_or_else(failed),
            ScalarType::Boolean => {
                if text.eq_ignore_ascii_case("true") {
                    Ok(Scalar::Boolean(true))
                } else if text.eq_ignore_ascii_case("false") {
                    Ok(Scalar::Boolean(false))
                } else {
                    Err(failed())
                }
            }
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(text) => write!(f, "{}", text),
            Scalar::Integer(n) => write!(f, "{}", n),
            Scalar::Decimal(d) => write!(f, "{}", d),
            Scalar::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Text(text) => Value::String(text),
            Scalar::Integer(n) => Value::from(n),
            Scalar::Decimal(d) => serde_json::Number::from_str(&d.to_string())
                .map(Value::Number)
                .unwrap_or_else(|_| Value::String(d.to_string())),
            Scalar::Boolean(b) => Value::Bool(b),
        }
    }
}

/// Text that could not be parsed into a scalar type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot convert {text:?} to {target}")]
pub struct CoercionError {
    pub target: ScalarType,
    pub text: String,
}

/// Declared shape of a collection parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// Ordered sequence, duplicates kept
    List,
    /// Unique elements
    Set,
}

/// A bound collection of scalars
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collection {
    List(Vec<Scalar>),
    Set(BTreeSet<Scalar>),
}

impl Collection {
    /// Collect `items` into the declared kind
    pub fn from_items(kind: CollectionKind, items: impl IntoIterator<Item = Scalar>) -> Self {
        match kind {
            CollectionKind::List => Collection::List(items.into_iter().collect()),
            CollectionKind::Set => Collection::Set(items.into_iter().collect()),
        }
    }

    pub fn kind(&self) -> CollectionKind {
        match self {
            Collection::List(_) => CollectionKind::List,
            Collection::Set(_) => CollectionKind::Set,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Collection::List(items) => items.len(),
            Collection::Set(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &Scalar> + '_> {
        match self {
            Collection::List(items) => Box::new(items.iter()),
            Collection::Set(items) => Box::new(items.iter()),
        }
    }
}

/// Textual representation of a JSON value
pub(crate) fn textual(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_integer_from_number_and_text() {
        assert_eq!(
            Scalar::coerce(&json!(42), ScalarType::Integer),
            Ok(Scalar::Integer(42))
        );
        assert_eq!(
            Scalar::coerce(&json!("-7"), ScalarType::Integer),
            Ok(Scalar::Integer(-7))
        );
    }

    #[test]
    fn test_coerce_integer_rejects_non_numeric() {
        let err = Scalar::coerce(&json!("forty two"), ScalarType::Integer).unwrap_err();
        assert_eq!(err.target, ScalarType::Integer);
        assert_eq!(err.text, "forty two");
        assert!(Scalar::coerce(&json!(1.5), ScalarType::Integer).is_err());
    }

    #[test]
    fn test_coerce_decimal() {
        assert_eq!(
            Scalar::coerce(&json!("19.99"), ScalarType::Decimal),
            Ok(Scalar::Decimal(Decimal::new(1999, 2)))
        );
        assert_eq!(
            Scalar::coerce(&json!(3), ScalarType::Decimal),
            Ok(Scalar::Decimal(Decimal::from(3)))
        );
        assert_eq!(
            Scalar::coerce(&json!("1.5e2"), ScalarType::Decimal),
            Ok(Scalar::Decimal(Decimal::from(150)))
        );
        assert!(Scalar::coerce(&json!("abc"), ScalarType::Decimal).is_err());
    }

    #[test]
    fn test_coerce_text_uses_textual_representation() {
        assert_eq!(
            Scalar::coerce(&json!("gold"), ScalarType::Text),
            Ok(Scalar::Text("gold".into()))
        );
        assert_eq!(
            Scalar::coerce(&json!(12), ScalarType::Text),
            Ok(Scalar::Text("12".into()))
        );
        assert_eq!(
            Scalar::coerce(&json!(true), ScalarType::Text),
            Ok(Scalar::Text("true".into()))
        );
    }

    #[test]
    fn test_coerce_boolean() {
        assert_eq!(
            Scalar::coerce(&json!(true), ScalarType::Boolean),
            Ok(Scalar::Boolean(true))
        );
        assert_eq!(
            Scalar::coerce(&json!("FALSE"), ScalarType::Boolean),
            Ok(Scalar::Boolean(false))
        );
        assert!(Scalar::coerce(&json!("yes"), ScalarType::Boolean).is_err());
    }

    #[test]
    fn test_collection_kinds() {
        let items = vec![Scalar::Integer(3), Scalar::Integer(1), Scalar::Integer(3)];

        let list = Collection::from_items(CollectionKind::List, items.clone());
        assert_eq!(list.len(), 3);
        assert_eq!(list.kind(), CollectionKind::List);

        let set = Collection::from_items(CollectionKind::Set, items);
        assert_eq!(set.len(), 2);
        let ordered: Vec<_> = set.iter().cloned().collect();
        assert_eq!(ordered, vec![Scalar::Integer(1), Scalar::Integer(3)]);
    }

    #[test]
    fn test_scalar_into_value() {
        assert_eq!(Value::from(Scalar::Integer(5)), json!(5));
        assert_eq!(Value::from(Scalar::Decimal(Decimal::new(25, 1))), json!(2.5));
        assert_eq!(Value::from(Scalar::Text("a".into())), json!("a"));
    }
}
