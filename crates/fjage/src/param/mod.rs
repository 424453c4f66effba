// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Remote parameter access.
//!
//! Agents expose named parameters, scalar or vector valued, some read-only.
//! A get or set is one `ParameterReq` message answered by one
//! `ParameterRsp`. Every Rust type goes through the same path:
//!
//! ```text
//! T --IntoParam--> ParamValue --codec--> JSON --> agent
//! T <--FromParam-- ParamValue <--codec-- JSON <-- agent
//! ```

mod access;
pub mod codec;
mod convert;
pub mod marshal;
mod request;
mod value;

pub use convert::{coerce_like, FromParam, IntoParam};
pub use request::{ParameterRequest, ParameterResponse, PARAMETER_REQ, PARAMETER_RSP};
pub use value::{ParamIndex, ParamType, ParamValue, ScalarKind};
