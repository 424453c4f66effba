// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON wire form of parameter values.
//!
//! Scalars and bool/string arrays are plain JSON. Numeric arrays travel as
//! Java array objects holding little-endian base64 data:
//!
//! ```text
//! {"clazz": "[I", "data": "FAAAAA=="}
//! ```

use super::value::ParamValue;
use crate::error::CodecError;
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Map, Number, Value};

pub const CLASS_BYTE_ARRAY: &str = "[B";
pub const CLASS_INT_ARRAY: &str = "[I";
pub const CLASS_LONG_ARRAY: &str = "[J";
pub const CLASS_FLOAT_ARRAY: &str = "[F";
pub const CLASS_DOUBLE_ARRAY: &str = "[D";
pub const CLASS_STRING_ARRAY: &str = "[Ljava.lang.String;";

/// Fixed-width element that packs into a little-endian byte stream.
trait LeBytes: Sized {
    const WIDTH: usize;
    fn put(&self, out: &mut Vec<u8>);
    fn take(chunk: &[u8]) -> Self;
}

macro_rules! le_bytes {
    ($($t:ty),*) => {$(
        impl LeBytes for $t {
            const WIDTH: usize = std::mem::size_of::<$t>();

            fn put(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn take(chunk: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(chunk);
                <$t>::from_le_bytes(raw)
            }
        }
    )*};
}

le_bytes!(i32, i64, f32, f64);

fn pack<T: LeBytes>(values: &[T]) -> String {
    let mut bytes = Vec::with_capacity(values.len() * T::WIDTH);
    for value in values {
        value.put(&mut bytes);
    }
    general_purpose::STANDARD.encode(bytes)
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>, CodecError> {
    general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| CodecError::Base64(e.to_string()))
}

fn unpack<T: LeBytes>(encoded: &str) -> Result<Vec<T>, CodecError> {
    let bytes = decode_base64(encoded)?;
    if bytes.len() % T::WIDTH != 0 {
        return Err(CodecError::Misaligned {
            len: bytes.len(),
            width: T::WIDTH,
        });
    }
    Ok(bytes.chunks_exact(T::WIDTH).map(T::take).collect())
}

fn java_array(clazz: &str, data: String) -> Value {
    json!({ "clazz": clazz, "data": data })
}

/// Encode a value into its JSON wire form.
pub fn to_json(value: &ParamValue) -> Value {
    match value {
        ParamValue::Null => Value::Null,
        ParamValue::Bool(v) => Value::Bool(*v),
        ParamValue::Int(v) => Value::from(*v),
        ParamValue::Long(v) => Value::from(*v),
        ParamValue::Float(v) => Value::from(*v),
        ParamValue::Double(v) => Value::from(*v),
        ParamValue::String(v) => Value::String(v.clone()),
        ParamValue::EmptyArray => Value::Array(Vec::new()),
        ParamValue::BoolArray(v) => Value::from(v.clone()),
        ParamValue::StringArray(v) => Value::from(v.clone()),
        ParamValue::IntArray(v) => java_array(CLASS_INT_ARRAY, pack(v)),
        ParamValue::LongArray(v) => java_array(CLASS_LONG_ARRAY, pack(v)),
        ParamValue::FloatArray(v) => java_array(CLASS_FLOAT_ARRAY, pack(v)),
        ParamValue::DoubleArray(v) => java_array(CLASS_DOUBLE_ARRAY, pack(v)),
        ParamValue::ByteArray(v) => {
            java_array(CLASS_BYTE_ARRAY, general_purpose::STANDARD.encode(v))
        }
    }
}

/// Decode a JSON wire value.
pub fn from_json(value: &Value) -> Result<ParamValue, CodecError> {
    match value {
        Value::Null => Ok(ParamValue::Null),
        Value::Bool(v) => Ok(ParamValue::Bool(*v)),
        Value::Number(n) => number(n),
        Value::String(s) => Ok(ParamValue::String(s.clone())),
        Value::Array(items) => plain_array(items),
        Value::Object(obj) => java_object(obj),
    }
}

fn number(n: &Number) -> Result<ParamValue, CodecError> {
    if let Some(v) = n.as_i64() {
        Ok(ParamValue::Long(v))
    } else if let Some(v) = n.as_f64() {
        Ok(ParamValue::Double(v))
    } else {
        Err(CodecError::Unsupported(n.to_string()))
    }
}

fn plain_array(items: &[Value]) -> Result<ParamValue, CodecError> {
    if items.is_empty() {
        return Ok(ParamValue::EmptyArray);
    }
    if items.iter().all(Value::is_boolean) {
        return Ok(ParamValue::BoolArray(
            items.iter().filter_map(Value::as_bool).collect(),
        ));
    }
    if items.iter().all(Value::is_string) {
        return Ok(ParamValue::StringArray(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect(),
        ));
    }
    if items.iter().all(Value::is_i64) {
        return Ok(ParamValue::LongArray(
            items.iter().filter_map(Value::as_i64).collect(),
        ));
    }
    if items.iter().all(Value::is_number) {
        return Ok(ParamValue::DoubleArray(
            items.iter().filter_map(Value::as_f64).collect(),
        ));
    }
    Err(CodecError::Heterogeneous)
}

fn java_object(obj: &Map<String, Value>) -> Result<ParamValue, CodecError> {
    let clazz = obj
        .get("clazz")
        .and_then(Value::as_str)
        .ok_or_else(|| CodecError::Unsupported("object without 'clazz'".into()))?;
    let data = obj
        .get("data")
        .or_else(|| obj.get("signal"))
        .ok_or_else(|| CodecError::Unsupported(format!("'{clazz}' object without data")))?;

    if clazz == CLASS_STRING_ARRAY {
        return match from_json(data)? {
            ParamValue::EmptyArray => Ok(ParamValue::StringArray(Vec::new())),
            strings @ ParamValue::StringArray(_) => Ok(strings),
            _ => Err(CodecError::Heterogeneous),
        };
    }

    let encoded = data
        .as_str()
        .ok_or_else(|| CodecError::Base64(format!("'{clazz}' payload is not a string")))?;
    match clazz {
        CLASS_INT_ARRAY => unpack(encoded).map(ParamValue::IntArray),
        CLASS_LONG_ARRAY => unpack(encoded).map(ParamValue::LongArray),
        CLASS_FLOAT_ARRAY => unpack(encoded).map(ParamValue::FloatArray),
        CLASS_DOUBLE_ARRAY => unpack(encoded).map(ParamValue::DoubleArray),
        CLASS_BYTE_ARRAY => decode_base64(encoded).map(ParamValue::ByteArray),
        other => Err(CodecError::UnsupportedClass(other.to_string())),
    }
}
