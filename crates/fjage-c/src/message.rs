// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Messages and messaging through C.
//!
//! A [`FjageMsg`] is created with [`fjage_msg_create`], filled with the
//! `fjage_msg_add_*` setters and handed to [`fjage_send`] or
//! [`fjage_request`], which take ownership of it. Messages returned by
//! [`fjage_request`] and [`fjage_receive`] belong to the caller and are
//! released with [`fjage_msg_destroy`].
//!
//! Strings returned by the `fjage_msg_get_*` getters are owned by the
//! message and stay valid until it is destroyed.
//!
//! ```c
//! FjageMsg req = fjage_msg_create("org.arl.fjage.shell.ShellExecReq", FJAGE_REQUEST);
//! fjage_msg_set_recipient(req, shell);
//! fjage_msg_add_string(req, "cmd", "ps");
//! FjageMsg rsp = fjage_request(gw, req, 5000);
//! if (rsp != NULL && fjage_msg_get_performative(rsp) == FJAGE_AGREE) { ... }
//! fjage_msg_destroy(rsp);
//! ```
//!
//! # Safety
//!
//! For every function here: `msg` must be NULL or a live message handle;
//! `gw` NULL or a live gateway handle; strings NULL or valid NUL-terminated
//! strings; arrays NULL or pointing to `len` (or `maxlen`) elements.

use std::ffi::CString;
use std::os::raw::{c_char, c_int, c_long};
use std::ptr;
use std::time::Duration;

use fjage::param::marshal::{marshal_into, marshal_out};
use fjage::{AgentId, FromParam, GatewayError, Message, MessageFilter, ParamValue, Performative};

use crate::aid::{agent_arg, FjageAid};
use crate::param::out_slice;
use crate::{cstr_arg, error, invalid, wrapper, FjageGw};

/// Opaque handle to a message.
#[repr(C)]
pub struct FjageMessage {
    _private: [u8; 0],
}

/// Message handle as passed to every call.
pub type FjageMsg = *mut FjageMessage;

/// FIPA performatives, with the same codes as [`Performative`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FjagePerformative {
    FjageNone = 0,
    FjageRequest = 1,
    FjageAgree = 2,
    FjageRefuse = 3,
    FjageFailure = 4,
    FjageInform = 5,
    FjageConfirm = 6,
    FjageDisconfirm = 7,
    FjageQueryIf = 8,
    FjageNotUnderstood = 9,
    FjageCfp = 10,
    FjagePropose = 11,
    FjageCancel = 12,
}

struct MessageWrapper {
    message: Message,
    /// Strings handed out by the getters
    strings: Vec<CString>,
}

impl MessageWrapper {
    fn new(message: Message) -> Self {
        Self {
            message,
            strings: Vec::new(),
        }
    }

    fn into_raw(self) -> FjageMsg {
        Box::into_raw(Box::new(self)).cast::<FjageMessage>()
    }

    /// Keep a C copy of `s` alive as long as the message.
    fn c_str(&mut self, function: &str, s: &str) -> *const c_char {
        match CString::new(s) {
            Ok(s) => {
                let p = s.as_ptr();
                self.strings.push(s);
                p
            }
            Err(_) => {
                invalid(function, "string contains a NUL byte");
                ptr::null()
            }
        }
    }
}

unsafe fn message_mut<'a>(function: &str, msg: FjageMsg) -> Option<&'a mut MessageWrapper> {
    let wrapper = msg.cast::<MessageWrapper>().as_mut();
    if wrapper.is_none() {
        invalid(function, "null message");
    }
    wrapper
}

unsafe fn take_message(function: &str, msg: FjageMsg) -> Option<Message> {
    if msg.is_null() {
        invalid(function, "null message");
        return None;
    }
    Some(Box::from_raw(msg.cast::<MessageWrapper>()).message)
}

fn timeout_arg(function: &str, timeout_ms: c_long) -> Option<Duration> {
    match u64::try_from(timeout_ms) {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            invalid(function, "negative timeout");
            None
        }
    }
}

// =============================================================================
// Lifecycle and header
// =============================================================================

/// Create a message of class `clazz` with a fresh message ID. Returns NULL
/// if `clazz` is NULL or `perf` is not a performative code.
///
/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_create(clazz: *const c_char, perf: c_int) -> FjageMsg {
    const FN: &str = "fjage_msg_create";
    let Some(clazz) = cstr_arg(FN, clazz) else {
        return ptr::null_mut();
    };
    let Some(perf) = Performative::from_i32(perf) else {
        invalid(FN, "unknown performative");
        return ptr::null_mut();
    };
    MessageWrapper::new(Message::new(clazz, perf)).into_raw()
}

/// Release a message and every string obtained from it.
///
/// # Safety
/// `msg` must be NULL or a live message handle, not used afterwards.
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_destroy(msg: FjageMsg) {
    if !msg.is_null() {
        drop(Box::from_raw(msg.cast::<MessageWrapper>()));
    }
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_set_recipient(msg: FjageMsg, aid: FjageAid) -> c_int {
    const FN: &str = "fjage_msg_set_recipient";
    let Some(wrapper) = message_mut(FN, msg) else {
        return -1;
    };
    let Some(aid) = agent_arg(FN, aid) else {
        return -1;
    };
    wrapper.message.data.recipient = aid.to_string();
    0
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_set_in_reply_to(msg: FjageMsg, id: *const c_char) -> c_int {
    const FN: &str = "fjage_msg_set_in_reply_to";
    let Some(wrapper) = message_mut(FN, msg) else {
        return -1;
    };
    let Some(id) = cstr_arg(FN, id) else {
        return -1;
    };
    wrapper.message.data.in_reply_to = Some(id.to_string());
    0
}

unsafe fn header(
    function: &str,
    msg: FjageMsg,
    field: impl FnOnce(&Message) -> Option<String>,
) -> *const c_char {
    let Some(wrapper) = message_mut(function, msg) else {
        return ptr::null();
    };
    match field(&wrapper.message) {
        Some(value) => wrapper.c_str(function, &value),
        None => ptr::null(),
    }
}

/// Message ID. Owned by the message.
///
/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_get_id(msg: FjageMsg) -> *const c_char {
    header("fjage_msg_get_id", msg, |m| Some(m.id().to_string()))
}

/// Java class of the message. Owned by the message.
///
/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_get_clazz(msg: FjageMsg) -> *const c_char {
    header("fjage_msg_get_clazz", msg, |m| Some(m.clazz.clone()))
}

/// Performative code, or `-1` for a NULL message.
///
/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_get_performative(msg: FjageMsg) -> c_int {
    match message_mut("fjage_msg_get_performative", msg) {
        Some(wrapper) => wrapper.message.perf().as_i32(),
        None => -1,
    }
}

/// Recipient, or NULL when unset. Owned by the message.
///
/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_get_recipient(msg: FjageMsg) -> FjageAid {
    header("fjage_msg_get_recipient", msg, |m| {
        Some(m.data.recipient.clone()).filter(|r| !r.is_empty())
    })
}

/// Sender, or NULL when unset. Owned by the message.
///
/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_get_sender(msg: FjageMsg) -> FjageAid {
    header("fjage_msg_get_sender", msg, |m| {
        Some(m.data.sender.clone()).filter(|s| !s.is_empty())
    })
}

/// ID of the message this one replies to, or NULL. Owned by the message.
///
/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_get_in_reply_to(msg: FjageMsg) -> *const c_char {
    header("fjage_msg_get_in_reply_to", msg, |m| {
        m.in_reply_to().map(str::to_owned)
    })
}

// =============================================================================
// Fields
// =============================================================================

unsafe fn add_value(function: &str, msg: FjageMsg, key: *const c_char, value: ParamValue) -> c_int {
    let Some(wrapper) = message_mut(function, msg) else {
        return -1;
    };
    let Some(key) = cstr_arg(function, key) else {
        return -1;
    };
    wrapper.message.set_value(key, &value);
    0
}

unsafe fn add_array<T, V>(
    function: &str,
    msg: FjageMsg,
    key: *const c_char,
    value: *const T,
    len: c_int,
    convert: impl FnMut(&T) -> V,
    wrap: impl FnOnce(Vec<V>) -> ParamValue,
) -> c_int {
    let items = match usize::try_from(len) {
        Err(_) => {
            invalid(function, "negative array length");
            return -1;
        }
        Ok(0) => &[][..],
        Ok(_) if value.is_null() => {
            invalid(function, "null array");
            return -1;
        }
        Ok(len) => std::slice::from_raw_parts(value, len),
    };
    add_value(function, msg, key, wrap(marshal_out(items, convert)))
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_add_string(
    msg: FjageMsg,
    key: *const c_char,
    value: *const c_char,
) -> c_int {
    const FN: &str = "fjage_msg_add_string";
    let Some(value) = cstr_arg(FN, value) else {
        return -1;
    };
    add_value(FN, msg, key, ParamValue::String(value.to_string()))
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_add_int(msg: FjageMsg, key: *const c_char, value: c_int) -> c_int {
    add_value("fjage_msg_add_int", msg, key, ParamValue::Int(value))
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_add_long(msg: FjageMsg, key: *const c_char, value: c_long) -> c_int {
    add_value("fjage_msg_add_long", msg, key, ParamValue::Long(i64::from(value)))
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_add_float(msg: FjageMsg, key: *const c_char, value: f32) -> c_int {
    add_value("fjage_msg_add_float", msg, key, ParamValue::Float(value))
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_add_double(msg: FjageMsg, key: *const c_char, value: f64) -> c_int {
    add_value("fjage_msg_add_double", msg, key, ParamValue::Double(value))
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_add_bool(msg: FjageMsg, key: *const c_char, value: bool) -> c_int {
    add_value("fjage_msg_add_bool", msg, key, ParamValue::Bool(value))
}

/// Add a Java `byte[]` field.
///
/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_add_byte_array(
    msg: FjageMsg,
    key: *const c_char,
    value: *const u8,
    len: c_int,
) -> c_int {
    add_array("fjage_msg_add_byte_array", msg, key, value, len, |&v| v, ParamValue::ByteArray)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_add_int_array(
    msg: FjageMsg,
    key: *const c_char,
    value: *const c_int,
    len: c_int,
) -> c_int {
    add_array("fjage_msg_add_int_array", msg, key, value, len, |&v| v, ParamValue::IntArray)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_add_long_array(
    msg: FjageMsg,
    key: *const c_char,
    value: *const c_long,
    len: c_int,
) -> c_int {
    add_array(
        "fjage_msg_add_long_array",
        msg,
        key,
        value,
        len,
        |&v| i64::from(v),
        ParamValue::LongArray,
    )
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_add_float_array(
    msg: FjageMsg,
    key: *const c_char,
    value: *const f32,
    len: c_int,
) -> c_int {
    add_array("fjage_msg_add_float_array", msg, key, value, len, |&v| v, ParamValue::FloatArray)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_add_double_array(
    msg: FjageMsg,
    key: *const c_char,
    value: *const f64,
    len: c_int,
) -> c_int {
    add_array(
        "fjage_msg_add_double_array",
        msg,
        key,
        value,
        len,
        |&v| v,
        ParamValue::DoubleArray,
    )
}

/// Field `key` as `T`, recording why when it is missing or does not fit.
unsafe fn field<T: FromParam>(function: &str, msg: FjageMsg, key: *const c_char) -> Option<T> {
    let wrapper = message_mut(function, msg)?;
    let key = cstr_arg(function, key)?;
    let value = match wrapper.message.get_value(key) {
        Ok(ParamValue::Null) => {
            invalid(function, "no such field");
            return None;
        }
        Ok(value) => value,
        Err(e) => {
            error::record(function, &GatewayError::from(e));
            return None;
        }
    };
    match T::from_param(value) {
        Ok(value) => {
            error::clear();
            Some(value)
        }
        Err(found) => {
            let err = GatewayError::TypeMismatch {
                expected: T::TYPE,
                found: found.type_name(),
            };
            error::record(function, &err);
            None
        }
    }
}

/// String field `key`, or NULL. Owned by the message.
///
/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_get_string(msg: FjageMsg, key: *const c_char) -> *const c_char {
    const FN: &str = "fjage_msg_get_string";
    let Some(value) = field::<String>(FN, msg, key) else {
        return ptr::null();
    };
    match message_mut(FN, msg) {
        Some(wrapper) => wrapper.c_str(FN, &value),
        None => ptr::null(),
    }
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_get_int(msg: FjageMsg, key: *const c_char, defval: c_int) -> c_int {
    field("fjage_msg_get_int", msg, key).unwrap_or(defval)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_get_long(
    msg: FjageMsg,
    key: *const c_char,
    defval: c_long,
) -> c_long {
    field::<i64>("fjage_msg_get_long", msg, key)
        .and_then(|v| c_long::try_from(v).ok())
        .unwrap_or(defval)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_get_float(msg: FjageMsg, key: *const c_char, defval: f32) -> f32 {
    field("fjage_msg_get_float", msg, key).unwrap_or(defval)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_get_double(
    msg: FjageMsg,
    key: *const c_char,
    defval: f64,
) -> f64 {
    field("fjage_msg_get_double", msg, key).unwrap_or(defval)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_get_bool(msg: FjageMsg, key: *const c_char, defval: bool) -> bool {
    field("fjage_msg_get_bool", msg, key).unwrap_or(defval)
}

/// Copy array field `key` into `value`. With a NULL `value`, returns the
/// length of the field; otherwise copies at most `maxlen` elements and
/// returns how many were copied. Returns `-1` on failure.
unsafe fn get_array<T, U>(
    function: &str,
    msg: FjageMsg,
    key: *const c_char,
    value: *mut U,
    maxlen: c_int,
    convert: impl FnMut(T) -> U,
) -> c_int
where
    Vec<T>: FromParam,
{
    let Some(items) = field::<Vec<T>>(function, msg, key) else {
        return -1;
    };
    if value.is_null() {
        return c_int::try_from(items.len()).unwrap_or(c_int::MAX);
    }
    let Some(slots) = out_slice(function, value, maxlen) else {
        return -1;
    };
    // at most maxlen, so it fits
    marshal_into(items, slots, convert) as c_int
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_get_byte_array(
    msg: FjageMsg,
    key: *const c_char,
    value: *mut u8,
    maxlen: c_int,
) -> c_int {
    get_array("fjage_msg_get_byte_array", msg, key, value, maxlen, |v: u8| v)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_get_int_array(
    msg: FjageMsg,
    key: *const c_char,
    value: *mut c_int,
    maxlen: c_int,
) -> c_int {
    get_array("fjage_msg_get_int_array", msg, key, value, maxlen, |v: i32| v)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_get_long_array(
    msg: FjageMsg,
    key: *const c_char,
    value: *mut c_long,
    maxlen: c_int,
) -> c_int {
    get_array("fjage_msg_get_long_array", msg, key, value, maxlen, |v: i64| {
        v as c_long
    })
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_get_float_array(
    msg: FjageMsg,
    key: *const c_char,
    value: *mut f32,
    maxlen: c_int,
) -> c_int {
    get_array("fjage_msg_get_float_array", msg, key, value, maxlen, |v: f32| v)
}

/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_msg_get_double_array(
    msg: FjageMsg,
    key: *const c_char,
    value: *mut f64,
    maxlen: c_int,
) -> c_int {
    get_array("fjage_msg_get_double_array", msg, key, value, maxlen, |v: f64| v)
}

// =============================================================================
// Messaging
// =============================================================================

/// Send `msg` to its recipient. Takes ownership of `msg`, even on failure.
///
/// # Safety
/// See the [module documentation](self). `msg` must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn fjage_send(gw: FjageGw, msg: FjageMsg) -> c_int {
    const FN: &str = "fjage_send";
    let Some(message) = take_message(FN, msg) else {
        return -1;
    };
    let Some(wrapper) = wrapper(FN, gw) else {
        return -1;
    };
    if message.data.recipient.is_empty() {
        invalid(FN, "message has no recipient");
        return -1;
    }
    let to = AgentId::new(message.data.recipient.as_str());
    error::status(FN, wrapper.gateway.send(&to, message))
}

/// Send `msg` and wait up to `timeout_ms` for its reply. Takes ownership of
/// `msg`. Returns the reply, or NULL on timeout or failure.
///
/// # Safety
/// See the [module documentation](self). `msg` must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn fjage_request(gw: FjageGw, msg: FjageMsg, timeout_ms: c_long) -> FjageMsg {
    const FN: &str = "fjage_request";
    let Some(message) = take_message(FN, msg) else {
        return ptr::null_mut();
    };
    let Some(wrapper) = wrapper(FN, gw) else {
        return ptr::null_mut();
    };
    let Some(timeout) = timeout_arg(FN, timeout_ms) else {
        return ptr::null_mut();
    };
    if message.data.recipient.is_empty() {
        invalid(FN, "message has no recipient");
        return ptr::null_mut();
    }
    let to = AgentId::new(message.data.recipient.as_str());
    match wrapper.block_on(wrapper.gateway.request(&to, message, timeout)) {
        Ok(reply) => {
            error::clear();
            MessageWrapper::new(reply).into_raw()
        }
        Err(e) => {
            error::record(FN, &e);
            ptr::null_mut()
        }
    }
}

unsafe fn receive(gw: FjageGw, function: &str, filter: MessageFilter, timeout_ms: c_long) -> FjageMsg {
    let Some(wrapper) = wrapper(function, gw) else {
        return ptr::null_mut();
    };
    let Some(timeout) = timeout_arg(function, timeout_ms) else {
        return ptr::null_mut();
    };
    match wrapper.block_on(wrapper.gateway.receive(&filter, timeout)) {
        Ok(Some(msg)) => {
            error::clear();
            MessageWrapper::new(msg).into_raw()
        }
        Ok(None) => {
            error::record(function, &GatewayError::Timeout);
            ptr::null_mut()
        }
        Err(e) => {
            error::record(function, &e);
            ptr::null_mut()
        }
    }
}

/// Wait up to `timeout_ms` for a message. A non-NULL `id` waits for the
/// reply to that message ID; otherwise a non-NULL `clazz` selects the class.
/// Returns NULL on timeout or failure.
///
/// # Safety
/// See the [module documentation](self).
#[no_mangle]
pub unsafe extern "C" fn fjage_receive(
    gw: FjageGw,
    clazz: *const c_char,
    id: *const c_char,
    timeout_ms: c_long,
) -> FjageMsg {
    const FN: &str = "fjage_receive";
    let filter = if !id.is_null() {
        let Some(id) = cstr_arg(FN, id) else {
            return ptr::null_mut();
        };
        MessageFilter::InReplyTo(id.to_string())
    } else if !clazz.is_null() {
        let Some(clazz) = cstr_arg(FN, clazz) else {
            return ptr::null_mut();
        };
        MessageFilter::class(clazz)
    } else {
        MessageFilter::Any
    };
    receive(gw, FN, filter, timeout_ms)
}

/// Wait up to `timeout_ms` for a message of any of the `clazzlen` classes.
///
/// # Safety
/// See the [module documentation](self). `clazzes` must point to
/// `clazzlen` valid C strings.
#[no_mangle]
pub unsafe extern "C" fn fjage_receive_any(
    gw: FjageGw,
    clazzes: *const *const c_char,
    clazzlen: c_int,
    timeout_ms: c_long,
) -> FjageMsg {
    const FN: &str = "fjage_receive_any";
    let names = match usize::try_from(clazzlen) {
        Err(_) => {
            invalid(FN, "negative class count");
            return ptr::null_mut();
        }
        Ok(0) => &[][..],
        Ok(_) if clazzes.is_null() => {
            invalid(FN, "null class list");
            return ptr::null_mut();
        }
        Ok(len) => std::slice::from_raw_parts(clazzes, len),
    };
    let mut classes = Vec::with_capacity(names.len());
    for &name in names {
        let Some(name) = cstr_arg(FN, name) else {
            return ptr::null_mut();
        };
        classes.push(name.to_string());
    }
    let filter = if classes.is_empty() {
        MessageFilter::Any
    } else {
        MessageFilter::Classes(classes)
    };
    receive(gw, FN, filter, timeout_ms)
}
