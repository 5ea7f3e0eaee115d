//! Formal parameter declarations

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::scalar::{CollectionKind, ScalarType};
use super::ParamMap;
use crate::error::ValidationError;
use crate::function::short_type_name;

/// Element type of a map parameter's keys or values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    /// Untyped, accepts any JSON value
    Any,
    Scalar(ScalarType),
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Any => write!(f, "any"),
            ElementType::Scalar(scalar) => write!(f, "{}", scalar),
        }
    }
}

/// A field-level constraint violation found on a structured parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub path: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Field-level checks run on structured parameters declared with
/// [`ParameterSpec::validated`]
///
/// # Example
///
/// ```
/// use rulefn_engine::{FieldViolation, Validate};
///
/// #[derive(Default)]
/// struct Order {
///     sku: String,
///     quantity: i64,
/// }
///
/// impl Validate for Order {
///     fn validate(&self) -> Result<(), FieldViolation> {
///         if self.sku.is_empty() {
///             return Err(FieldViolation::new("sku", "must not be empty"));
///         }
///         if self.quantity <= 0 {
///             return Err(FieldViolation::new("quantity", "must be positive"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Validate {
    /// Return the first violated constraint
    fn validate(&self) -> Result<(), FieldViolation> {
        Ok(())
    }
}

/// Types that can be bound from a parameter map
///
/// Implemented for every `Default + Serialize + DeserializeOwned + Validate`
/// type; the serde field names are the map keys that get copied.
pub trait Structured: Default + Serialize + DeserializeOwned + Validate + Send + Sync + 'static {}

impl<T> Structured for T where T: Default + Serialize + DeserializeOwned + Validate + Send + Sync + 'static
{}

type BindFn =
    dyn Fn(&str, &ParamMap, bool) -> Result<Box<dyn Any + Send + Sync>, ValidationError> + Send + Sync;

/// Type-erased binder for one structured parameter type
#[derive(Clone)]
pub struct StructuredBinder {
    type_name: &'static str,
    bind: Arc<BindFn>,
}

impl StructuredBinder {
    pub fn of<T: Structured>() -> Self {
        Self {
            type_name: short_type_name::<T>(),
            bind: Arc::new(bind_structured::<T>),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn bind(
        &self,
        param: &str,
        map: &ParamMap,
        validate: bool,
    ) -> Result<Box<dyn Any + Send + Sync>, ValidationError> {
        (self.bind)(param, map, validate)
    }
}

impl fmt::Debug for StructuredBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredBinder")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Start from `T::default()` and overlay every non-null map entry
///
/// Keys naming no field of `T` are dropped by deserialization, so fields the
/// type skips when serializing still bind.
fn bind_structured<T: Structured>(
    param: &str,
    map: &ParamMap,
    validate: bool,
) -> Result<Box<dyn Any + Send + Sync>, ValidationError> {
    let structured_error = |message: String| ValidationError::Structured {
        param: param.to_string(),
        type_name: short_type_name::<T>().to_string(),
        message,
    };

    let mut fields = match serde_json::to_value(T::default()) {
        Ok(Value::Object(fields)) => fields,
        Ok(other) => {
            return Err(structured_error(format!(
                "default value is not an object: {}",
                other
            )))
        }
        Err(err) => return Err(structured_error(err.to_string())),
    };

    for (key, value) in map {
        if !value.is_null() {
            fields.insert(key.clone(), value.clone());
        }
    }

    let instance: T = serde_json::from_value(Value::Object(fields))
        .map_err(|err| structured_error(err.to_string()))?;

    if validate {
        instance
            .validate()
            .map_err(|violation| ValidationError::Constraint {
                path: violation.path,
                message: violation.message,
            })?;
    }

    Ok(Box::new(instance))
}

/// Declared kind of a formal parameter
#[derive(Debug, Clone)]
pub enum ParamKind {
    /// Receives the whole parameter map
    Map { key: ElementType, value: ElementType },
    Scalar(ScalarType),
    Collection {
        kind: CollectionKind,
        element: ScalarType,
    },
    Structured(StructuredBinder),
}

/// Declaration of one formal parameter of an operation
///
/// # Example
///
/// ```
/// use rulefn_engine::ParameterSpec;
///
/// let params = vec![
///     ParameterSpec::text("customer_id").bound_to("customerId").required(),
///     ParameterSpec::decimal("amount").required(),
///     ParameterSpec::integer_list("coupon_ids"),
///     ParameterSpec::map("context"),
/// ];
/// assert_eq!(params[0].bound_name(), "customerId");
/// ```
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    name: String,
    bind_name: Option<String>,
    required: bool,
    validate: bool,
    kind: ParamKind,
}

impl ParameterSpec {
    /// Declare a parameter of the given kind
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            bind_name: None,
            required: false,
            validate: false,
            kind,
        }
    }

    /// Pass-through map of text keys to untyped values
    pub fn map(name: impl Into<String>) -> Self {
        Self::typed_map(name, ElementType::Scalar(ScalarType::Text), ElementType::Any)
    }

    /// Map with explicit key/value types
    ///
    /// Only `<text, any>` can be bound; other declarations fail validation.
    pub fn typed_map(name: impl Into<String>, key: ElementType, value: ElementType) -> Self {
        Self::new(name, ParamKind::Map { key, value })
    }

    pub fn scalar(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self::new(name, ParamKind::Scalar(scalar))
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarType::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarType::Integer)
    }

    pub fn decimal(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarType::Decimal)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarType::Boolean)
    }

    pub fn collection(name: impl Into<String>, kind: CollectionKind, element: ScalarType) -> Self {
        Self::new(name, ParamKind::Collection { kind, element })
    }

    pub fn list(name: impl Into<String>, element: ScalarType) -> Self {
        Self::collection(name, CollectionKind::List, element)
    }

    pub fn set(name: impl Into<String>, element: ScalarType) -> Self {
        Self::collection(name, CollectionKind::Set, element)
    }

    pub fn text_list(name: impl Into<String>) -> Self {
        Self::list(name, ScalarType::Text)
    }

    pub fn integer_list(name: impl Into<String>) -> Self {
        Self::list(name, ScalarType::Integer)
    }

    pub fn decimal_list(name: impl Into<String>) -> Self {
        Self::list(name, ScalarType::Decimal)
    }

    /// Structured parameter populated from the map's matching keys
    pub fn structured<T: Structured>(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Structured(StructuredBinder::of::<T>()))
    }

    /// Look the value up under `key` instead of the parameter name
    ///
    /// A blank key keeps the parameter name.
    pub fn bound_to(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.bind_name = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    /// Fail binding when the value is absent
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Run [`Validate`] on the populated structured value
    pub fn validated(mut self) -> Self {
        self.validate = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key looked up in the parameter map
    pub fn bound_name(&self) -> &str {
        self.bind_name.as_deref().unwrap_or(&self.name)
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_validated(&self) -> bool {
        self.validate
    }

    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct Address {
        city: String,
        zip: Option<String>,
        floor: i64,
    }

    impl Validate for Address {
        fn validate(&self) -> Result<(), FieldViolation> {
            if self.city.is_empty() {
                return Err(FieldViolation::new("city", "must not be empty"));
            }
            Ok(())
        }
    }

    fn params(value: Value) -> ParamMap {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_bound_name_defaults_to_name() {
        let spec = ParameterSpec::text("city");
        assert_eq!(spec.bound_name(), "city");
        assert!(!spec.is_required());

        let spec = ParameterSpec::text("city").bound_to("  ");
        assert_eq!(spec.bound_name(), "city");

        let spec = ParameterSpec::text("city").bound_to("cityName").required();
        assert_eq!(spec.bound_name(), "cityName");
        assert!(spec.is_required());
    }

    #[test]
    fn test_structured_copies_matching_fields() {
        let binder = StructuredBinder::of::<Address>();
        assert_eq!(binder.type_name(), "Address");

        let map = params(json!({"city": "Lyon", "zip": null, "unknown": 1}));
        let bound = binder.bind("address", &map, false).unwrap();
        let address = bound.downcast_ref::<Address>().unwrap();

        assert_eq!(
            address,
            &Address {
                city: "Lyon".into(),
                zip: None,
                floor: 0
            }
        );
    }

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct Contact {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        email: Option<String>,
        #[serde(default, skip_serializing)]
        phone: Option<String>,
    }

    impl Validate for Contact {}

    #[test]
    fn test_structured_binds_fields_skipped_when_serializing() {
        let binder = StructuredBinder::of::<Contact>();
        let map = params(json!({
            "phone": "555-0100",
            "email": "ada@example.com",
            "name": "ada",
            "extra": true
        }));

        let bound = binder.bind("contact", &map, false).unwrap();
        assert_eq!(
            bound.downcast_ref::<Contact>().unwrap(),
            &Contact {
                name: "ada".into(),
                email: Some("ada@example.com".into()),
                phone: Some("555-0100".into()),
            }
        );
    }

    #[test]
    fn test_structured_type_mismatch() {
        let binder = StructuredBinder::of::<Address>();
        let map = params(json!({"floor": "ground"}));

        let err = binder.bind("address", &map, false).unwrap_err();
        assert!(matches!(err, ValidationError::Structured { ref param, .. } if param == "address"));
    }

    #[test]
    fn test_structured_validation_reports_first_violation() {
        let binder = StructuredBinder::of::<Address>();
        let map = params(json!({"floor": 2}));

        assert!(binder.bind("address", &map, false).is_ok());
        let err = binder.bind("address", &map, true).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Constraint {
                path: "city".into(),
                message: "must not be empty".into()
            }
        );
    }
}
