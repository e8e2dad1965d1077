// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::Result;
use tfevar::{Number, Value};

#[test]
fn constructors() -> Result<()> {
    assert_eq!(Value::new_object(), Value::from_json_str("{}")?);
    assert_eq!(Value::new_array(), Value::from_json_str("[]")?);
    assert_eq!(Value::from("abc"), Value::from_json_str("\"abc\"")?);
    assert_eq!(Value::Null, Value::from_json_str("null")?);
    Ok(())
}

#[test]
fn json_round_trip() -> Result<()> {
    let v = Value::from_json_str(r#"{"a": [1, 2.5, true, null], "b": {"c": "d"}}"#)?;
    let json = v.to_json_str()?;
    assert_eq!(Value::from_json_str(&json)?, v);
    Ok(())
}

#[test]
fn serialize_number() -> Result<()> {
    // Integer values are serialized without a fractional part.
    assert_eq!(serde_json::to_string(&Value::from(1.0))?, "1");
    assert_eq!(serde_json::to_string(&Value::from(-1.0))?, "-1");

    // Fractional parts survive.
    assert_eq!(serde_json::to_string(&Value::from(1.1))?, "1.1");
    assert_eq!(serde_json::to_string(&Value::from(-1.1))?, "-1.1");

    Ok(())
}

#[test]
fn number_display() {
    assert_eq!(Number::from(8300i64).to_string(), "8300");
    assert_eq!(Number::from(2.0).to_string(), "2");
    assert_eq!(Number::from(-12.5).to_string(), "-12.5");
}

#[test]
fn number_comparisons() {
    assert_eq!(Number::from(1i64), Number::from(1.0));
    assert!(Number::from(1i64) < Number::from(1.5));
    assert!(Number::from(2.5) > Number::from(2i64));
    assert!(Number::from(1i64).is_integer());
    assert!(Number::from(2.0).is_integer());
    assert!(!Number::from(2.5).is_integer());
    assert_eq!(Number::from(7.0).as_i64(), Some(7));
    assert_eq!(Number::from(7.5).as_i64(), None);
}

#[test]
fn undefined_is_distinct_from_null() -> Result<()> {
    assert!(Value::Undefined.is_undefined());
    assert!(!Value::Undefined.is_null());
    assert!(Value::Null.is_null());
    assert_ne!(Value::Undefined, Value::Null);

    // undefined displays as a special string
    assert_eq!(serde_json::to_string(&Value::Undefined)?, "\"<undefined>\"");
    Ok(())
}

#[test]
fn primitives() {
    assert!(Value::Null.is_primitive());
    assert!(Value::Undefined.is_primitive());
    assert!(Value::from("a").is_primitive());
    assert!(Value::from(1i64).is_primitive());
    assert!(Value::Bool(true).is_primitive());
    assert!(!Value::new_array().is_primitive());
    assert!(!Value::new_object().is_primitive());
}

#[test]
fn accessors() -> Result<()> {
    let v = Value::from_json_str(r#"{"b": true, "n": 1, "s": "x", "a": [1]}"#)?;

    assert_eq!(*v["b"].as_bool()?, true);
    assert_eq!(v["n"].as_number()?.as_i64(), Some(1));
    assert_eq!(v["s"].as_string()?.as_ref(), "x");
    assert_eq!(v["a"].as_array()?.len(), 1);
    assert!(v["missing"].is_undefined());
    assert!(v[42].is_undefined());
    assert!(v["s"].as_bool().is_err());

    let mut v = v;
    v.as_object_mut()?.insert("z".into(), Value::Null);
    assert!(v["z"].is_null());

    let mut a = Value::new_array();
    a.as_array_mut()?.push(Value::from(2i64));
    assert_eq!(a[0], Value::from(2i64));

    Ok(())
}
