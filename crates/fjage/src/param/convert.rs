// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conversions between Rust types and [`ParamValue`].
//!
//! Integral requests accept int and long values (range checked). Floating
//! requests also accept integral values. Nothing converts between scalars and
//! arrays, and `EmptyArray` fits every array type.

use super::value::{ParamType, ParamValue, ScalarKind};

/// Rust type that can be written to a parameter.
pub trait IntoParam {
    const TYPE: ParamType;

    fn into_param(self) -> ParamValue;
}

/// Rust type that can be read from a parameter.
pub trait FromParam: Sized {
    const TYPE: ParamType;

    /// Convert `value`, handing it back unchanged when it does not fit.
    fn from_param(value: ParamValue) -> Result<Self, ParamValue>;
}

macro_rules! into_param {
    ($($t:ty => $variant:ident, $ty:expr;)*) => {$(
        impl IntoParam for $t {
            const TYPE: ParamType = $ty;

            fn into_param(self) -> ParamValue {
                ParamValue::$variant(self)
            }
        }
    )*};
}

into_param! {
    bool => Bool, ParamType::Scalar(ScalarKind::Bool);
    i32 => Int, ParamType::Scalar(ScalarKind::Int);
    i64 => Long, ParamType::Scalar(ScalarKind::Long);
    f32 => Float, ParamType::Scalar(ScalarKind::Float);
    f64 => Double, ParamType::Scalar(ScalarKind::Double);
    String => String, ParamType::Scalar(ScalarKind::String);
    Vec<bool> => BoolArray, ParamType::Array(ScalarKind::Bool);
    Vec<i32> => IntArray, ParamType::Array(ScalarKind::Int);
    Vec<i64> => LongArray, ParamType::Array(ScalarKind::Long);
    Vec<f32> => FloatArray, ParamType::Array(ScalarKind::Float);
    Vec<f64> => DoubleArray, ParamType::Array(ScalarKind::Double);
    Vec<String> => StringArray, ParamType::Array(ScalarKind::String);
    Vec<u8> => ByteArray, ParamType::Array(ScalarKind::Byte);
}

impl FromParam for bool {
    const TYPE: ParamType = ParamType::Scalar(ScalarKind::Bool);

    fn from_param(value: ParamValue) -> Result<Self, ParamValue> {
        match value {
            ParamValue::Bool(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl FromParam for i32 {
    const TYPE: ParamType = ParamType::Scalar(ScalarKind::Int);

    fn from_param(value: ParamValue) -> Result<Self, ParamValue> {
        match value {
            ParamValue::Int(v) => Ok(v),
            ParamValue::Long(v) => i32::try_from(v).map_err(|_| ParamValue::Long(v)),
            other => Err(other),
        }
    }
}

impl FromParam for i64 {
    const TYPE: ParamType = ParamType::Scalar(ScalarKind::Long);

    fn from_param(value: ParamValue) -> Result<Self, ParamValue> {
        match value {
            ParamValue::Int(v) => Ok(i64::from(v)),
            ParamValue::Long(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl FromParam for f32 {
    const TYPE: ParamType = ParamType::Scalar(ScalarKind::Float);

    fn from_param(value: ParamValue) -> Result<Self, ParamValue> {
        match value {
            ParamValue::Float(v) => Ok(v),
            ParamValue::Double(v) => Ok(v as f32),
            ParamValue::Int(v) => Ok(v as f32),
            ParamValue::Long(v) => Ok(v as f32),
            other => Err(other),
        }
    }
}

impl FromParam for f64 {
    const TYPE: ParamType = ParamType::Scalar(ScalarKind::Double);

    fn from_param(value: ParamValue) -> Result<Self, ParamValue> {
        match value {
            ParamValue::Float(v) => Ok(f64::from(v)),
            ParamValue::Double(v) => Ok(v),
            ParamValue::Int(v) => Ok(f64::from(v)),
            ParamValue::Long(v) => Ok(v as f64),
            other => Err(other),
        }
    }
}

impl FromParam for String {
    const TYPE: ParamType = ParamType::Scalar(ScalarKind::String);

    fn from_param(value: ParamValue) -> Result<Self, ParamValue> {
        match value {
            ParamValue::String(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl FromParam for Vec<bool> {
    const TYPE: ParamType = ParamType::Array(ScalarKind::Bool);

    fn from_param(value: ParamValue) -> Result<Self, ParamValue> {
        match value {
            ParamValue::EmptyArray => Ok(Vec::new()),
            ParamValue::BoolArray(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl FromParam for Vec<i32> {
    const TYPE: ParamType = ParamType::Array(ScalarKind::Int);

    fn from_param(value: ParamValue) -> Result<Self, ParamValue> {
        match value {
            ParamValue::EmptyArray => Ok(Vec::new()),
            ParamValue::IntArray(v) => Ok(v),
            ParamValue::LongArray(v) => {
                let narrowed: Result<Vec<i32>, _> = v.iter().map(|x| i32::try_from(*x)).collect();
                narrowed.map_err(|_| ParamValue::LongArray(v))
            }
            other => Err(other),
        }
    }
}

impl FromParam for Vec<i64> {
    const TYPE: ParamType = ParamType::Array(ScalarKind::Long);

    fn from_param(value: ParamValue) -> Result<Self, ParamValue> {
        match value {
            ParamValue::EmptyArray => Ok(Vec::new()),
            ParamValue::IntArray(v) => Ok(v.into_iter().map(i64::from).collect()),
            ParamValue::LongArray(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl FromParam for Vec<f32> {
    const TYPE: ParamType = ParamType::Array(ScalarKind::Float);

    fn from_param(value: ParamValue) -> Result<Self, ParamValue> {
        match value {
            ParamValue::EmptyArray => Ok(Vec::new()),
            ParamValue::FloatArray(v) => Ok(v),
            ParamValue::DoubleArray(v) => Ok(v.into_iter().map(|x| x as f32).collect()),
            ParamValue::IntArray(v) => Ok(v.into_iter().map(|x| x as f32).collect()),
            ParamValue::LongArray(v) => Ok(v.into_iter().map(|x| x as f32).collect()),
            other => Err(other),
        }
    }
}

impl FromParam for Vec<f64> {
    const TYPE: ParamType = ParamType::Array(ScalarKind::Double);

    fn from_param(value: ParamValue) -> Result<Self, ParamValue> {
        match value {
            ParamValue::EmptyArray => Ok(Vec::new()),
            ParamValue::FloatArray(v) => Ok(v.into_iter().map(f64::from).collect()),
            ParamValue::DoubleArray(v) => Ok(v),
            ParamValue::IntArray(v) => Ok(v.into_iter().map(f64::from).collect()),
            ParamValue::LongArray(v) => Ok(v.into_iter().map(|x| x as f64).collect()),
            other => Err(other),
        }
    }
}

impl FromParam for Vec<String> {
    const TYPE: ParamType = ParamType::Array(ScalarKind::String);

    fn from_param(value: ParamValue) -> Result<Self, ParamValue> {
        match value {
            ParamValue::EmptyArray => Ok(Vec::new()),
            ParamValue::StringArray(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl FromParam for Vec<u8> {
    const TYPE: ParamType = ParamType::Array(ScalarKind::Byte);

    fn from_param(value: ParamValue) -> Result<Self, ParamValue> {
        match value {
            ParamValue::EmptyArray => Ok(Vec::new()),
            ParamValue::ByteArray(v) => Ok(v),
            other => Err(other),
        }
    }
}

/// Convert `value` into the same kind as `template`, if it fits.
pub fn coerce_like(template: &ParamValue, value: ParamValue) -> Option<ParamValue> {
    fn conv<T: FromParam + IntoParam>(value: ParamValue) -> Option<ParamValue> {
        T::from_param(value).ok().map(IntoParam::into_param)
    }

    match template {
        ParamValue::Bool(_) => conv::<bool>(value),
        ParamValue::Int(_) => conv::<i32>(value),
        ParamValue::Long(_) => conv::<i64>(value),
        ParamValue::Float(_) => conv::<f32>(value),
        ParamValue::Double(_) => conv::<f64>(value),
        ParamValue::String(_) => conv::<String>(value),
        ParamValue::BoolArray(_) => conv::<Vec<bool>>(value),
        ParamValue::IntArray(_) => conv::<Vec<i32>>(value),
        ParamValue::LongArray(_) => conv::<Vec<i64>>(value),
        ParamValue::FloatArray(_) => conv::<Vec<f32>>(value),
        ParamValue::DoubleArray(_) => conv::<Vec<f64>>(value),
        ParamValue::StringArray(_) => conv::<Vec<String>>(value),
        ParamValue::ByteArray(_) => conv::<Vec<u8>>(value),
        ParamValue::Null | ParamValue::EmptyArray => Some(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_requests() {
        assert_eq!(i32::from_param(ParamValue::Long(20)), Ok(20));
        assert_eq!(i64::from_param(ParamValue::Int(-3)), Ok(-3));
        let big = ParamValue::Long(i64::from(i32::MAX) + 1);
        assert_eq!(i32::from_param(big.clone()), Err(big));
        assert!(i32::from_param(ParamValue::Double(1.0)).is_err());
        assert!(i64::from_param(ParamValue::String("1".into())).is_err());
    }

    #[test]
    fn test_floating_requests_widen_integers() {
        assert_eq!(f32::from_param(ParamValue::Double(27.0)), Ok(27.0));
        assert_eq!(f64::from_param(ParamValue::Long(5)), Ok(5.0));
        assert_eq!(
            Vec::<f32>::from_param(ParamValue::LongArray(vec![1, 2])),
            Ok(vec![1.0, 2.0])
        );
    }

    #[test]
    fn test_scalar_array_mismatch() {
        assert!(i32::from_param(ParamValue::IntArray(vec![1])).is_err());
        assert!(Vec::<i32>::from_param(ParamValue::Int(1)).is_err());
        assert!(String::from_param(ParamValue::StringArray(vec![])).is_err());
        assert!(bool::from_param(ParamValue::Long(1)).is_err());
    }

    #[test]
    fn test_empty_array_fits_everything() {
        assert_eq!(Vec::<bool>::from_param(ParamValue::EmptyArray), Ok(vec![]));
        assert_eq!(Vec::<String>::from_param(ParamValue::EmptyArray), Ok(vec![]));
        assert_eq!(Vec::<f64>::from_param(ParamValue::EmptyArray), Ok(vec![]));
    }

    #[test]
    fn test_long_array_narrowing() {
        assert_eq!(
            Vec::<i32>::from_param(ParamValue::LongArray(vec![20, -1])),
            Ok(vec![20, -1])
        );
        let wide = ParamValue::LongArray(vec![0, i64::MAX]);
        assert_eq!(Vec::<i32>::from_param(wide.clone()), Err(wide));
    }

    #[test]
    fn test_coerce_like() {
        assert_eq!(
            coerce_like(&ParamValue::Int(0), ParamValue::Long(7)),
            Some(ParamValue::Int(7))
        );
        assert_eq!(
            coerce_like(&ParamValue::Float(0.0), ParamValue::Double(2.5)),
            Some(ParamValue::Float(2.5))
        );
        assert_eq!(coerce_like(&ParamValue::Int(0), ParamValue::Double(2.5)), None);
        assert_eq!(
            coerce_like(&ParamValue::IntArray(vec![]), ParamValue::EmptyArray),
            Some(ParamValue::IntArray(vec![]))
        );
    }
}
