// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Parameter values, types and indices.

use std::fmt;

/// Element kind of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    Long,
    Float,
    Double,
    String,
    Byte,
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Byte => "byte",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type requested by a caller: a scalar or a homogeneous array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Scalar(ScalarKind),
    Array(ScalarKind),
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::Array(kind) => write!(f, "{kind}[]"),
        }
    }
}

/// Decoded parameter value.
///
/// Integral JSON numbers decode as `Long` and fractional ones as `Double`;
/// the narrower variants appear when values are built locally or decoded from
/// typed Java arrays.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParamValue {
    #[default]
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    /// An array with no elements and hence no known element kind.
    EmptyArray,
    BoolArray(Vec<bool>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
    StringArray(Vec<String>),
    ByteArray(Vec<u8>),
}

impl ParamValue {
    /// Type of this value; `None` for `Null` and `EmptyArray`.
    pub fn param_type(&self) -> Option<ParamType> {
        use ParamType::{Array, Scalar};
        let ty = match self {
            Self::Null | Self::EmptyArray => return None,
            Self::Bool(_) => Scalar(ScalarKind::Bool),
            Self::Int(_) => Scalar(ScalarKind::Int),
            Self::Long(_) => Scalar(ScalarKind::Long),
            Self::Float(_) => Scalar(ScalarKind::Float),
            Self::Double(_) => Scalar(ScalarKind::Double),
            Self::String(_) => Scalar(ScalarKind::String),
            Self::BoolArray(_) => Array(ScalarKind::Bool),
            Self::IntArray(_) => Array(ScalarKind::Int),
            Self::LongArray(_) => Array(ScalarKind::Long),
            Self::FloatArray(_) => Array(ScalarKind::Float),
            Self::DoubleArray(_) => Array(ScalarKind::Double),
            Self::StringArray(_) => Array(ScalarKind::String),
            Self::ByteArray(_) => Array(ScalarKind::Byte),
        };
        Some(ty)
    }

    /// Human readable type name, used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::EmptyArray => "[]".to_string(),
            other => other
                .param_type()
                .map(|ty| ty.to_string())
                .unwrap_or_default(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::EmptyArray) || matches!(self.param_type(), Some(ParamType::Array(_)))
    }

    /// Number of elements of an array value.
    pub fn len(&self) -> Option<usize> {
        let len = match self {
            Self::EmptyArray => 0,
            Self::BoolArray(v) => v.len(),
            Self::IntArray(v) => v.len(),
            Self::LongArray(v) => v.len(),
            Self::FloatArray(v) => v.len(),
            Self::DoubleArray(v) => v.len(),
            Self::StringArray(v) => v.len(),
            Self::ByteArray(v) => v.len(),
            _ => return None,
        };
        Some(len)
    }

    /// Element `index` of an array value, as a scalar.
    pub fn element(&self, index: usize) -> Option<ParamValue> {
        match self {
            Self::BoolArray(v) => v.get(index).copied().map(Self::Bool),
            Self::IntArray(v) => v.get(index).copied().map(Self::Int),
            Self::LongArray(v) => v.get(index).copied().map(Self::Long),
            Self::FloatArray(v) => v.get(index).copied().map(Self::Float),
            Self::DoubleArray(v) => v.get(index).copied().map(Self::Double),
            Self::StringArray(v) => v.get(index).cloned().map(Self::String),
            Self::ByteArray(v) => v.get(index).copied().map(|b| Self::Int(i32::from(b))),
            _ => None,
        }
    }
}

/// Which part of a parameter a request addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamIndex {
    /// The whole parameter (`-1` on the wire).
    #[default]
    Whole,
    /// One element of a vector-valued parameter.
    Element(u32),
}

impl ParamIndex {
    /// Map a raw wire/C index: every negative value selects the whole parameter.
    pub fn from_raw(raw: i64) -> Self {
        if raw < 0 {
            Self::Whole
        } else {
            Self::Element(u32::try_from(raw).unwrap_or(u32::MAX))
        }
    }

    pub fn as_raw(self) -> i64 {
        match self {
            Self::Whole => -1,
            Self::Element(index) => i64::from(index),
        }
    }

    pub fn element(self) -> Option<u32> {
        match self {
            Self::Whole => None,
            Self::Element(index) => Some(index),
        }
    }
}

impl From<i32> for ParamIndex {
    fn from(raw: i32) -> Self {
        Self::from_raw(i64::from(raw))
    }
}
