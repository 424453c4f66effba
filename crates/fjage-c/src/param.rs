// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Parameter get/set entry points.
//!
//! Every entry point is a thin adapter over one of four generic helpers
//! ([`get_scalar`], [`set_value`], [`get_array`], [`set_array`]), which run
//! the typed [`Gateway`](fjage::Gateway) calls on the gateway's runtime.
//!
//! Return conventions:
//! - scalar get: the value, or `defval` on any failure
//! - set: `0` on success, `-1` on any failure (including read-only)
//! - array get: the number of elements copied (at most `maxlen`), or `-1`
//!
//! `ndx` selects one element of a vector parameter; a negative `ndx`
//! addresses the whole parameter.
//!
//! # Safety
//!
//! For every function here: `gw` must be NULL or a live gateway handle;
//! `aid`, `param` and string values must be NULL or valid NUL-terminated
//! strings; array pointers must be NULL or point to at least `len` (or
//! `maxlen`) elements, writable for gets. Buffers are not retained after
//! the call returns.

use std::os::raw::{c_char, c_int, c_long};
use std::ptr;
use std::slice;

use fjage::param::marshal::{marshal_into, marshal_out};
use fjage::{AgentId, FromParam, IntoParam, ParamIndex};

use crate::aid::{agent_arg, FjageAid};
use crate::{cstr_arg, error, invalid, malloc_cstring, wrapper, FjageGw, GatewayWrapper};

// =============================================================================
// Generic helpers
// =============================================================================

/// Validated arguments of one parameter call.
struct ParamCall<'a> {
    function: &'static str,
    wrapper: &'a GatewayWrapper,
    agent: AgentId,
    param: &'a str,
    index: ParamIndex,
}

impl<'a> ParamCall<'a> {
    unsafe fn new(
        function: &'static str,
        gw: FjageGw,
        aid: FjageAid,
        param: *const c_char,
        ndx: c_int,
    ) -> Option<Self> {
        Some(Self {
            function,
            wrapper: wrapper(function, gw)?,
            agent: agent_arg(function, aid)?,
            param: cstr_arg(function, param)?,
            index: ParamIndex::from_raw(i64::from(ndx)),
        })
    }

    fn get<T: FromParam>(&self) -> fjage::Result<T> {
        let gateway = &self.wrapper.gateway;
        self.wrapper
            .block_on(gateway.get_param(&self.agent, self.param, self.index))
    }

    fn set<T>(&self, value: T) -> c_int
    where
        T: IntoParam + FromParam + PartialEq + Clone,
    {
        let gateway = &self.wrapper.gateway;
        let result = self
            .wrapper
            .block_on(gateway.set_param(&self.agent, self.param, self.index, value));
        error::status(self.function, result.map(drop))
    }
}

unsafe fn get_scalar<T: FromParam>(
    function: &'static str,
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    ndx: c_int,
    defval: T,
) -> T {
    let Some(call) = ParamCall::new(function, gw, aid, param, ndx) else {
        return defval;
    };
    match call.get() {
        Ok(value) => {
            error::clear();
            value
        }
        Err(e) => {
            error::record(function, &e);
            defval
        }
    }
}

unsafe fn set_value<T>(
    function: &'static str,
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    ndx: c_int,
    value: T,
) -> c_int
where
    T: IntoParam + FromParam + PartialEq + Clone,
{
    match ParamCall::new(function, gw, aid, param, ndx) {
        Some(call) => call.set(value),
        None => -1,
    }
}

/// Caller buffer of `len` elements. NULL is accepted only when `len` is 0.
pub(crate) unsafe fn out_slice<'a, T>(
    function: &str,
    buf: *mut T,
    len: c_int,
) -> Option<&'a mut [T]> {
    match usize::try_from(len) {
        Err(_) => {
            invalid(function, "negative buffer length");
            None
        }
        Ok(0) => Some(&mut []),
        Ok(_) if buf.is_null() => {
            invalid(function, "null buffer");
            None
        }
        Ok(len) => Some(slice::from_raw_parts_mut(buf, len)),
    }
}

unsafe fn array_arg<'a, T>(function: &str, value: *const T, len: c_int) -> Option<&'a [T]> {
    match usize::try_from(len) {
        Err(_) => {
            invalid(function, "negative array length");
            None
        }
        Ok(0) => Some(&[]),
        Ok(_) if value.is_null() => {
            invalid(function, "null array");
            None
        }
        Ok(len) => Some(slice::from_raw_parts(value, len)),
    }
}

#[allow(clippy::too_many_arguments)]
unsafe fn get_array<T, U>(
    function: &'static str,
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    buf: *mut U,
    maxlen: c_int,
    ndx: c_int,
    convert: impl FnMut(T) -> U,
) -> c_int
where
    Vec<T>: FromParam,
{
    let Some(call) = ParamCall::new(function, gw, aid, param, ndx) else {
        return -1;
    };
    let Some(slots) = out_slice(function, buf, maxlen) else {
        return -1;
    };
    match call.get::<Vec<T>>() {
        Ok(values) => {
            error::clear();
            // at most maxlen, so it fits
            marshal_into(values, slots, convert) as c_int
        }
        Err(e) => {
            error::record(function, &e);
            -1
        }
    }
}

#[allow(clippy::too_many_arguments)]
unsafe fn set_array<T, V>(
    function: &'static str,
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    value: *const T,
    len: c_int,
    ndx: c_int,
    convert: impl FnMut(&T) -> V,
) -> c_int
where
    Vec<V>: IntoParam + FromParam + PartialEq + Clone,
{
    let Some(call) = ParamCall::new(function, gw, aid, param, ndx) else {
        return -1;
    };
    let Some(items) = array_arg(function, value, len) else {
        return -1;
    };
    call.set(marshal_out(items, convert))
}

// =============================================================================
// Scalars
// =============================================================================

/// Read an `int` parameter, or `defval` on failure.
///
/// ```c
/// int addr = fjage_param_get_int(gw, node, "address", -1, 0);
/// ```
///
/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_get_int(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    ndx: c_int,
    defval: c_int,
) -> c_int {
    get_scalar("fjage_param_get_int", gw, aid, param, ndx, defval)
}

/// Write an `int` parameter. Returns `0`, or `-1` if the agent did not
/// accept the value.
///
/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_set_int(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    value: c_int,
    ndx: c_int,
) -> c_int {
    set_value("fjage_param_set_int", gw, aid, param, ndx, value)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_get_long(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    ndx: c_int,
    defval: c_long,
) -> c_long {
    let value = get_scalar("fjage_param_get_long", gw, aid, param, ndx, i64::from(defval));
    c_long::try_from(value).unwrap_or(defval)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_set_long(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    value: c_long,
    ndx: c_int,
) -> c_int {
    set_value("fjage_param_set_long", gw, aid, param, ndx, i64::from(value))
}

/// Read a `float` parameter. Integral values are widened.
///
/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_get_float(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    ndx: c_int,
    defval: f32,
) -> f32 {
    get_scalar("fjage_param_get_float", gw, aid, param, ndx, defval)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_set_float(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    value: f32,
    ndx: c_int,
) -> c_int {
    set_value("fjage_param_set_float", gw, aid, param, ndx, value)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_get_double(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    ndx: c_int,
    defval: f64,
) -> f64 {
    get_scalar("fjage_param_get_double", gw, aid, param, ndx, defval)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_set_double(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    value: f64,
    ndx: c_int,
) -> c_int {
    set_value("fjage_param_set_double", gw, aid, param, ndx, value)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_get_bool(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    ndx: c_int,
    defval: bool,
) -> bool {
    get_scalar("fjage_param_get_bool", gw, aid, param, ndx, defval)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_set_bool(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    value: bool,
    ndx: c_int,
) -> c_int {
    set_value("fjage_param_set_bool", gw, aid, param, ndx, value)
}

// =============================================================================
// Strings
// =============================================================================

/// Write a string parameter.
///
/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_set_string(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    value: *const c_char,
    ndx: c_int,
) -> c_int {
    const FN: &str = "fjage_param_set_string";
    let Some(value) = cstr_arg(FN, value) else {
        return -1;
    };
    set_value(FN, gw, aid, param, ndx, value.to_string())
}

/// Read a string parameter into `strval`.
///
/// Copies at most `len` bytes and adds a NUL when there is room for it.
/// Returns the number of bytes copied, or the full length when `strval` is
/// NULL, or `-1` on failure.
///
/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_get_string(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    ndx: c_int,
    strval: *mut c_char,
    len: c_int,
) -> c_int {
    const FN: &str = "fjage_param_get_string";
    let Some(call) = ParamCall::new(FN, gw, aid, param, ndx) else {
        return -1;
    };
    let Ok(capacity) = usize::try_from(len) else {
        invalid(FN, "negative buffer length");
        return -1;
    };
    let value = match call.get::<String>() {
        Ok(value) => value,
        Err(e) => {
            error::record(FN, &e);
            return -1;
        }
    };
    error::clear();
    if strval.is_null() {
        return c_int::try_from(value.len()).unwrap_or(c_int::MAX);
    }
    let n = value.len().min(capacity);
    ptr::copy_nonoverlapping(value.as_ptr(), strval.cast::<u8>(), n);
    if n < capacity {
        *strval.add(n) = 0;
    }
    // n <= len
    n as c_int
}

// =============================================================================
// Arrays
// =============================================================================

/// Read an `int` array parameter into `value`.
///
/// Copies at most `maxlen` elements and returns how many were copied; a
/// longer remote array is truncated. Returns `-1` on failure.
///
/// ```c
/// int buf[4];
/// int n = fjage_param_get_int_array(gw, node, "vectorParam", buf, 4, -1);
/// ```
///
/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_get_int_array(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    value: *mut c_int,
    maxlen: c_int,
    ndx: c_int,
) -> c_int {
    get_array("fjage_param_get_int_array", gw, aid, param, value, maxlen, ndx, |v: i32| v)
}

/// Write `len` elements of `value` as an `int` array parameter.
///
/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_set_int_array(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    value: *const c_int,
    len: c_int,
    ndx: c_int,
) -> c_int {
    set_array("fjage_param_set_int_array", gw, aid, param, value, len, ndx, |&v| v)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_get_long_array(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    value: *mut c_long,
    maxlen: c_int,
    ndx: c_int,
) -> c_int {
    get_array("fjage_param_get_long_array", gw, aid, param, value, maxlen, ndx, |v: i64| {
        v as c_long
    })
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_set_long_array(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    value: *const c_long,
    len: c_int,
    ndx: c_int,
) -> c_int {
    set_array("fjage_param_set_long_array", gw, aid, param, value, len, ndx, |&v| {
        i64::from(v)
    })
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_get_float_array(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    value: *mut f32,
    maxlen: c_int,
    ndx: c_int,
) -> c_int {
    get_array("fjage_param_get_float_array", gw, aid, param, value, maxlen, ndx, |v: f32| v)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_set_float_array(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    value: *const f32,
    len: c_int,
    ndx: c_int,
) -> c_int {
    set_array("fjage_param_set_float_array", gw, aid, param, value, len, ndx, |&v| v)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_get_double_array(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    value: *mut f64,
    maxlen: c_int,
    ndx: c_int,
) -> c_int {
    get_array("fjage_param_get_double_array", gw, aid, param, value, maxlen, ndx, |v: f64| v)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_set_double_array(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    value: *const f64,
    len: c_int,
    ndx: c_int,
) -> c_int {
    set_array("fjage_param_set_double_array", gw, aid, param, value, len, ndx, |&v| v)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_get_bool_array(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    value: *mut bool,
    maxlen: c_int,
    ndx: c_int,
) -> c_int {
    get_array("fjage_param_get_bool_array", gw, aid, param, value, maxlen, ndx, |v: bool| v)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_set_bool_array(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    value: *const bool,
    len: c_int,
    ndx: c_int,
) -> c_int {
    set_array("fjage_param_set_bool_array", gw, aid, param, value, len, ndx, |&v| v)
}

/// Read a string array parameter.
///
/// Each copied element is a new `malloc`-allocated string owned by the
/// caller, to be released with `fjage_string_free`.
///
/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_get_string_array(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    value: *mut *mut c_char,
    maxlen: c_int,
    ndx: c_int,
) -> c_int {
    get_array("fjage_param_get_string_array", gw, aid, param, value, maxlen, ndx, |s: String| {
        malloc_cstring(&s)
    })
}

/// Write a string array parameter. A NULL element fails the call.
///
/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_param_set_string_array(
    gw: FjageGw,
    aid: FjageAid,
    param: *const c_char,
    value: *const *const c_char,
    len: c_int,
    ndx: c_int,
) -> c_int {
    const FN: &str = "fjage_param_set_string_array";
    let Some(call) = ParamCall::new(FN, gw, aid, param, ndx) else {
        return -1;
    };
    let Some(items) = array_arg(FN, value, len) else {
        return -1;
    };
    let strings: Option<Vec<String>> = marshal_out(items, |&s| cstr_arg(FN, s).map(str::to_string))
        .into_iter()
        .collect();
    match strings {
        Some(strings) => call.set(strings),
        None => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_arguments_fail() {
        unsafe {
            assert_eq!(fjage_param_get_int(ptr::null_mut(), c"a".as_ptr(), c"p".as_ptr(), -1, 7), 7);
            assert_eq!(
                fjage_param_set_int(ptr::null_mut(), c"a".as_ptr(), c"p".as_ptr(), 1, -1),
                -1
            );
            assert_eq!(
                fjage_param_get_int_array(
                    ptr::null_mut(),
                    c"a".as_ptr(),
                    c"p".as_ptr(),
                    ptr::null_mut(),
                    0,
                    -1
                ),
                -1
            );
            assert_eq!(
                fjage_param_get_string(
                    ptr::null_mut(),
                    c"a".as_ptr(),
                    c"p".as_ptr(),
                    -1,
                    ptr::null_mut(),
                    0
                ),
                -1
            );
        }
        assert_eq!(
            crate::fjage_last_error(),
            crate::FjageErrorCode::FjageInvalidArgument as c_int
        );
    }

    #[test]
    fn test_buffer_arguments() {
        unsafe {
            assert!(out_slice::<i32>("t", ptr::null_mut(), 0).is_some());
            assert!(out_slice::<i32>("t", ptr::null_mut(), 2).is_none());
            assert!(out_slice::<i32>("t", ptr::null_mut(), -1).is_none());

            let items = [1, 2, 3];
            assert_eq!(array_arg("t", items.as_ptr(), 2), Some(&items[..2]));
            assert!(array_arg::<i32>("t", ptr::null(), 1).is_none());
            assert!(array_arg("t", items.as_ptr(), -3).is_none());
        }
    }
}
