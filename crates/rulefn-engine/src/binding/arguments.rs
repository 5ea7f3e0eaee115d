//! Bound arguments handed to operations

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;

use rust_decimal::Decimal;

use super::scalar::{Collection, Scalar};
use super::ParamMap;
use crate::reliability::OperationFailure;

static EMPTY_SET: BTreeSet<Scalar> = BTreeSet::new();

/// One bound argument
pub enum Argument<'a> {
    /// The whole parameter map
    Map(&'a ParamMap),
    Scalar(Scalar),
    Collection(Collection),
    Structured(Box<dyn Any + Send + Sync>),
    /// Optional parameter with no value in the map
    Absent,
}

impl Argument<'_> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Argument::Absent)
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Argument::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Argument::Collection(collection) => Some(collection),
            _ => None,
        }
    }
}

impl fmt::Debug for Argument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Map(map) => f.debug_tuple("Map").field(&map.len()).finish(),
            Argument::Scalar(scalar) => f.debug_tuple("Scalar").field(scalar).finish(),
            Argument::Collection(collection) => {
                f.debug_tuple("Collection").field(collection).finish()
            }
            Argument::Structured(_) => f.write_str("Structured(..)"),
            Argument::Absent => f.write_str("Absent"),
        }
    }
}

/// Positional arguments of one operation, also addressable by parameter name
///
/// Typed accessors return `None` (or an empty slice) when the argument is
/// absent or was declared with a different kind. The `require_*` variants turn
/// that into an `InvalidInput` failure so operations can use `?`.
#[derive(Debug, Default)]
pub struct Arguments<'a> {
    names: Vec<String>,
    values: Vec<Argument<'a>>,
}

impl<'a> Arguments<'a> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            names: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, name: &str, value: Argument<'a>) {
        self.names.push(name.to_string());
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Argument at a parameter position
    pub fn get(&self, index: usize) -> Option<&Argument<'a>> {
        self.values.get(index)
    }

    /// Argument of the parameter declared as `name`
    pub fn by_name(&self, name: &str) -> Option<&Argument<'a>> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|index| self.values.get(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Argument<'a>)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    fn scalar(&self, name: &str) -> Option<&Scalar> {
        self.by_name(name).and_then(Argument::as_scalar)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.scalar(name).and_then(Scalar::as_text)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.scalar(name).and_then(Scalar::as_integer)
    }

    pub fn decimal(&self, name: &str) -> Option<Decimal> {
        self.scalar(name).and_then(Scalar::as_decimal)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.scalar(name).and_then(Scalar::as_boolean)
    }

    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.by_name(name).and_then(Argument::as_collection)
    }

    /// Elements of a list parameter, empty when absent
    pub fn list(&self, name: &str) -> &[Scalar] {
        match self.collection(name) {
            Some(Collection::List(items)) => items,
            _ => &[],
        }
    }

    /// Elements of a set parameter, empty when absent
    pub fn set(&self, name: &str) -> &BTreeSet<Scalar> {
        match self.collection(name) {
            Some(Collection::Set(items)) => items,
            _ => &EMPTY_SET,
        }
    }

    pub fn map(&self, name: &str) -> Option<&'a ParamMap> {
        match self.by_name(name) {
            Some(Argument::Map(map)) => Some(*map),
            _ => None,
        }
    }

    pub fn structured<T: Any>(&self, name: &str) -> Option<&T> {
        match self.by_name(name) {
            Some(Argument::Structured(value)) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn require_text(&self, name: &str) -> Result<&str, OperationFailure> {
        self.text(name).ok_or_else(|| missing(name, "text"))
    }

    pub fn require_integer(&self, name: &str) -> Result<i64, OperationFailure> {
        self.integer(name).ok_or_else(|| missing(name, "integer"))
    }

    pub fn require_decimal(&self, name: &str) -> Result<Decimal, OperationFailure> {
        self.decimal(name).ok_or_else(|| missing(name, "decimal"))
    }

    pub fn require_boolean(&self, name: &str) -> Result<bool, OperationFailure> {
        self.boolean(name).ok_or_else(|| missing(name, "boolean"))
    }

    pub fn require_structured<T: Any>(&self, name: &str) -> Result<&T, OperationFailure> {
        self.structured::<T>(name)
            .ok_or_else(|| missing(name, std::any::type_name::<T>()))
    }
}

fn missing(name: &str, expected: &str) -> OperationFailure {
    OperationFailure::invalid_input(format!("argument {} is not a bound {}", name, expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::CollectionKind;

    fn sample(map: &ParamMap) -> Arguments<'_> {
        let mut args = Arguments::with_capacity(5);
        args.push("name", Argument::Scalar(Scalar::Text("ada".into())));
        args.push("age", Argument::Scalar(Scalar::Integer(36)));
        args.push(
            "tags",
            Argument::Collection(Collection::from_items(
                CollectionKind::Set,
                vec![Scalar::Text("b".into()), Scalar::Text("a".into())],
            )),
        );
        args.push("scores", Argument::Absent);
        args.push("context", Argument::Map(map));
        args
    }

    #[test]
    fn test_typed_accessors() {
        let map = ParamMap::new();
        let args = sample(&map);

        assert_eq!(args.len(), 5);
        assert_eq!(args.text("name"), Some("ada"));
        assert_eq!(args.integer("age"), Some(36));
        assert_eq!(args.text("age"), None);
        assert_eq!(args.set("tags").len(), 2);
        assert!(args.map("context").is_some());
        assert!(args.get(3).unwrap().is_absent());
    }

    #[test]
    fn test_absent_list_reads_as_empty() {
        let map = ParamMap::new();
        let args = sample(&map);

        assert!(args.list("scores").is_empty());
        assert!(args.list("missing").is_empty());
        assert_eq!(args.collection("scores"), None);
    }

    #[test]
    fn test_absent_set_reads_as_empty() {
        let map = ParamMap::new();
        let args = sample(&map);

        assert!(args.set("scores").is_empty());
        assert!(args.set("missing").is_empty());
        assert!(args.set("name").is_empty());
    }

    #[test]
    fn test_require_reports_invalid_input() {
        let map = ParamMap::new();
        let args = sample(&map);

        assert_eq!(args.require_integer("age").unwrap(), 36);
        let failure = args.require_decimal("age").unwrap_err();
        assert_eq!(failure.kind(), &crate::reliability::FailureKind::InvalidInput);
        assert_eq!(failure.message(), "argument age is not a bound decimal");
    }

    #[test]
    fn test_iter_preserves_declaration_order() {
        let map = ParamMap::new();
        let args = sample(&map);
        let names: Vec<_> = args.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["name", "age", "tags", "scores", "context"]);
    }
}
