//! Parameter binding: parameter map → positional arguments

use serde_json::Value;

use super::arguments::{Argument, Arguments};
use super::param::{ElementType, ParamKind, ParameterSpec};
use super::scalar::{textual, Collection, CollectionKind, Scalar, ScalarType};
use super::ParamMap;
use crate::error::ValidationError;

/// Bind `map` to `params`, producing one argument per parameter
///
/// Binding stops at the first parameter that fails; nothing is invoked with a
/// partially bound argument list.
pub fn bind<'a>(params: &[ParameterSpec], map: &'a ParamMap) -> Result<Arguments<'a>, ValidationError> {
    let mut args = Arguments::with_capacity(params.len());
    for param in params {
        let value = bind_one(param, map)?;
        args.push(param.name(), value);
    }
    Ok(args)
}

fn bind_one<'a>(param: &ParameterSpec, map: &'a ParamMap) -> Result<Argument<'a>, ValidationError> {
    match param.kind() {
        ParamKind::Map { key, value } => bind_map(param, *key, *value, map),
        ParamKind::Scalar(target) => {
            let Some(value) = lookup(param, map)? else {
                return Ok(Argument::Absent);
            };
            Scalar::coerce(value, *target)
                .map(Argument::Scalar)
                .map_err(|err| ValidationError::coercion(param.bound_name(), err.target, err.text))
        }
        ParamKind::Collection { kind, element } => {
            let Some(value) = lookup(param, map)? else {
                return Ok(Argument::Absent);
            };
            bind_collection(param, *kind, *element, value).map(Argument::Collection)
        }
        ParamKind::Structured(binder) => binder
            .bind(param.name(), map, param.is_validated())
            .map(Argument::Structured),
    }
}

fn bind_map<'a>(
    param: &ParameterSpec,
    key: ElementType,
    value: ElementType,
    map: &'a ParamMap,
) -> Result<Argument<'a>, ValidationError> {
    if key != ElementType::Scalar(ScalarType::Text) || value != ElementType::Any {
        return Err(ValidationError::UnsupportedMapType {
            param: param.name().to_string(),
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(Argument::Map(map))
}

/// Value under the parameter's bound name; null counts as absent
fn lookup<'a>(param: &ParameterSpec, map: &'a ParamMap) -> Result<Option<&'a Value>, ValidationError> {
    let value = map.get(param.bound_name()).filter(|v| !v.is_null());
    if value.is_none() && param.is_required() {
        return Err(ValidationError::missing(param.bound_name()));
    }
    Ok(value)
}

fn bind_collection(
    param: &ParameterSpec,
    kind: CollectionKind,
    element: ScalarType,
    value: &Value,
) -> Result<Collection, ValidationError> {
    let Value::Array(items) = value else {
        return Err(ValidationError::ExpectedCollection {
            param: param.bound_name().to_string(),
            value: value.to_string(),
        });
    };

    let elements = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            coerce_element(item, element).ok_or_else(|| {
                ValidationError::coercion(
                    format!("{}[{}]", param.bound_name(), index),
                    element,
                    textual(item),
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Collection::from_items(kind, elements))
}

/// Numeric elements are re-parsed from text; text and boolean elements are
/// taken as they are
fn coerce_element(item: &Value, element: ScalarType) -> Option<Scalar> {
    match element {
        ScalarType::Integer | ScalarType::Decimal => Scalar::coerce(item, element).ok(),
        ScalarType::Text => Some(Scalar::Text(textual(item))),
        ScalarType::Boolean => item.as_bool().map(Scalar::Boolean),
    }
}
