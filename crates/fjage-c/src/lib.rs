// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # fjage C API
//!
//! C bindings for the [`fjage`] gateway. The header `fjage.h` is generated
//! by cbindgen at build time.
//!
//! Besides parameters, the API covers subscriptions, service lookup and
//! plain messaging ([`fjage_send`], [`fjage_request`], [`fjage_receive`]).
//!
//! Every call blocks the calling thread until the container answers or the
//! request timeout expires. Several threads may share one gateway. Failures
//! are reported as `-1`, NULL or the caller's default value; the cause is
//! available from [`fjage_last_error`] on the same thread.
//!
//! ```c
//! FjageGw gw = fjage_tcp_open("localhost", 1100);
//! FjageAid node = fjage_aid_create("node");
//! fjage_param_set_int(gw, node, "address", 31, -1);
//! int addr = fjage_param_get_int(gw, node, "address", -1, 0);
//! fjage_aid_destroy(node);
//! fjage_close(gw);
//! ```
//!
//! # Safety
//!
//! All public functions taking pointers are `unsafe` and require the caller
//! to uphold the invariants documented on each function.

mod aid;
mod error;
mod logging;
mod message;
mod param;

pub use aid::*;
pub use error::*;
pub use logging::*;
pub use message::*;
pub use param::*;

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::sync::Once;

use fjage::{AgentId, Gateway, GatewayConfig, GatewayError};
use tokio::runtime::Runtime;

// =============================================================================
// Handles
// =============================================================================

/// Opaque handle to a gateway connection.
#[repr(C)]
pub struct FjageGateway {
    _private: [u8; 0],
}

/// Gateway handle as passed to every call.
pub type FjageGw = *mut FjageGateway;

/// A gateway plus the runtime that drives its background receive task.
struct GatewayWrapper {
    gateway: Gateway,
    agent_id: CString,
    runtime: Runtime,
}

impl GatewayWrapper {
    fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

unsafe fn wrapper<'a>(function: &str, gw: FjageGw) -> Option<&'a GatewayWrapper> {
    let wrapper = gw.cast::<GatewayWrapper>().as_ref();
    if wrapper.is_none() {
        invalid(function, "null gateway");
    }
    wrapper
}

// =============================================================================
// Argument helpers
// =============================================================================

pub(crate) fn invalid(function: &str, what: &str) {
    error::record(function, &GatewayError::InvalidArgument(what.to_string()));
}

/// Borrow a NUL-terminated UTF-8 argument, recording an error when it is
/// NULL or not UTF-8.
pub(crate) unsafe fn cstr_arg<'a>(function: &str, s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        invalid(function, "null string argument");
        return None;
    }
    let Ok(s) = CStr::from_ptr(s).to_str() else {
        invalid(function, "string argument is not valid UTF-8");
        return None;
    };
    Some(s)
}

/// Copy `s` into a `malloc` allocation so C callers can `free` it. An
/// interior NUL ends the string early on the C side.
pub(crate) fn malloc_cstring(s: &str) -> *mut c_char {
    // SAFETY: the allocation holds len + 1 bytes and is fully initialized.
    unsafe {
        let buf = libc::malloc(s.len() + 1).cast::<c_char>();
        if buf.is_null() {
            log::error!("malloc of {} bytes failed", s.len() + 1);
            return ptr::null_mut();
        }
        ptr::copy_nonoverlapping(s.as_ptr(), buf.cast::<u8>(), s.len());
        *buf.add(s.len()) = 0;
        buf
    }
}

// =============================================================================
// Gateway lifecycle
// =============================================================================

fn open(hostname: Option<&str>, port: c_int) -> fjage::Result<GatewayWrapper> {
    let mut config = GatewayConfig::default().with_env_overrides()?;
    if let Some(hostname) = hostname {
        config.hostname = hostname.to_string();
    }
    config.port = u16::try_from(port)
        .ok()
        .filter(|&p| p != 0)
        .ok_or_else(|| GatewayError::InvalidArgument(format!("port {port}")))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("fjage-gw")
        .enable_all()
        .build()?;
    let gateway = runtime.block_on(Gateway::from_config(config))?;
    let agent_id = CString::new(gateway.agent_id().as_str())
        .map_err(|e| GatewayError::InvalidArgument(e.to_string()))?;

    Ok(GatewayWrapper {
        gateway,
        agent_id,
        runtime,
    })
}

/// Open a gateway to the master container at `hostname:port`.
///
/// `FJAGE_HOST`, `FJAGE_PORT`, `FJAGE_REQUEST_TIMEOUT_MS` and
/// `FJAGE_AGENT_PREFIX` are read from the environment first; a non-NULL
/// `hostname` and `port` take precedence. Returns NULL on failure.
///
/// # Safety
/// `hostname` must be NULL or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn fjage_tcp_open(hostname: *const c_char, port: c_int) -> FjageGw {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = env_logger::try_init();
    });

    let hostname = if hostname.is_null() {
        None
    } else {
        let Some(hostname) = cstr_arg("fjage_tcp_open", hostname) else {
            return ptr::null_mut();
        };
        Some(hostname)
    };

    match open(hostname, port) {
        Ok(wrapper) => {
            error::clear();
            log::info!("Gateway {} connected", wrapper.gateway.agent_id());
            Box::into_raw(Box::new(wrapper)).cast::<FjageGateway>()
        }
        Err(e) => {
            error::record("fjage_tcp_open", &e);
            ptr::null_mut()
        }
    }
}

/// Close a gateway and release it.
///
/// # Safety
/// `gw` must be NULL or a handle from [`fjage_tcp_open`]. No other call on
/// `gw` may be in progress, and `gw` must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn fjage_close(gw: FjageGw) -> c_int {
    if gw.is_null() {
        invalid("fjage_close", "null gateway");
        return -1;
    }
    let wrapper = Box::from_raw(gw.cast::<GatewayWrapper>());
    wrapper.gateway.close();
    drop(wrapper);
    error::clear();
    0
}

/// AgentID of the gateway itself. Owned by the gateway; do not free.
///
/// # Safety
/// `gw` must be NULL or a live gateway handle.
#[no_mangle]
pub unsafe extern "C" fn fjage_get_agent_id(gw: FjageGw) -> FjageAid {
    match wrapper("fjage_get_agent_id", gw) {
        Some(wrapper) => wrapper.agent_id.as_ptr(),
        None => ptr::null(),
    }
}

// =============================================================================
// Subscriptions
// =============================================================================

unsafe fn with_topic(
    function: &str,
    gw: FjageGw,
    topic: FjageAid,
    op: impl FnOnce(&Gateway, &AgentId) -> fjage::Result<()>,
) -> c_int {
    let Some(wrapper) = wrapper(function, gw) else {
        return -1;
    };
    let Some(topic) = aid::agent_arg(function, topic) else {
        return -1;
    };
    error::status(function, op(&wrapper.gateway, &topic))
}

/// Receive messages sent to `topic`.
///
/// # Safety
/// `gw` must be NULL or a live gateway handle; `topic` NULL or a valid C string.
#[no_mangle]
pub unsafe extern "C" fn fjage_subscribe(gw: FjageGw, topic: FjageAid) -> c_int {
    with_topic("fjage_subscribe", gw, topic, Gateway::subscribe)
}

/// Receive notifications published by agent `aid`.
///
/// # Safety
/// `gw` must be NULL or a live gateway handle; `aid` NULL or a valid C string.
#[no_mangle]
pub unsafe extern "C" fn fjage_subscribe_agent(gw: FjageGw, aid: FjageAid) -> c_int {
    with_topic("fjage_subscribe_agent", gw, aid, Gateway::subscribe_agent)
}

/// Stop receiving messages sent to `topic`.
///
/// # Safety
/// `gw` must be NULL or a live gateway handle; `topic` NULL or a valid C string.
#[no_mangle]
pub unsafe extern "C" fn fjage_unsubscribe(gw: FjageGw, topic: FjageAid) -> c_int {
    with_topic("fjage_unsubscribe", gw, topic, Gateway::unsubscribe)
}

/// True when the gateway is subscribed to `topic`.
///
/// # Safety
/// `gw` must be NULL or a live gateway handle; `topic` NULL or a valid C string.
#[no_mangle]
pub unsafe extern "C" fn fjage_is_subscribed(gw: FjageGw, topic: FjageAid) -> bool {
    let Some(wrapper) = wrapper("fjage_is_subscribed", gw) else {
        return false;
    };
    aid::agent_arg("fjage_is_subscribed", topic)
        .is_some_and(|topic| wrapper.gateway.is_subscribed(&topic))
}

// =============================================================================
// Services
// =============================================================================

/// Find an agent providing `service`. Returns NULL when none does or on
/// failure; release the result with [`fjage_aid_destroy`].
///
/// # Safety
/// `gw` must be NULL or a live gateway handle; `service` NULL or a valid C string.
#[no_mangle]
pub unsafe extern "C" fn fjage_agent_for_service(gw: FjageGw, service: *const c_char) -> FjageAid {
    const FN: &str = "fjage_agent_for_service";
    let Some(wrapper) = wrapper(FN, gw) else {
        return ptr::null();
    };
    let Some(service) = cstr_arg(FN, service) else {
        return ptr::null();
    };
    match wrapper.block_on(wrapper.gateway.agent_for_service(service)) {
        Ok(agent) => {
            error::clear();
            agent.map_or(ptr::null(), |agent| malloc_cstring(agent.as_str()).cast_const())
        }
        Err(e) => {
            error::record(FN, &e);
            ptr::null()
        }
    }
}

/// Find all agents providing `service`.
///
/// Writes at most `max` AgentIDs into `agents` and returns how many agents
/// were found, which may exceed `max`. Each written ID is released with
/// [`fjage_aid_destroy`]. Returns `-1` on failure.
///
/// # Safety
/// `gw` must be NULL or a live gateway handle; `service` NULL or a valid C
/// string; `agents` must be NULL or point to `max` writable slots.
#[no_mangle]
pub unsafe extern "C" fn fjage_agents_for_service(
    gw: FjageGw,
    service: *const c_char,
    agents: *mut FjageAid,
    max: c_int,
) -> c_int {
    const FN: &str = "fjage_agents_for_service";
    let Some(wrapper) = wrapper(FN, gw) else {
        return -1;
    };
    let Some(service) = cstr_arg(FN, service) else {
        return -1;
    };
    let Some(slots) = param::out_slice(FN, agents, max) else {
        return -1;
    };
    match wrapper.block_on(wrapper.gateway.agents_for_service(service)) {
        Ok(found) => {
            error::clear();
            let total = found.len();
            fjage::param::marshal::marshal_into(found, slots, |agent| {
                malloc_cstring(agent.as_str()).cast_const()
            });
            c_int::try_from(total).unwrap_or(c_int::MAX)
        }
        Err(e) => {
            error::record(FN, &e);
            -1
        }
    }
}

/// Release a string returned by this library.
///
/// # Safety
/// `s` must be NULL or a string returned by this library, not used afterwards.
#[no_mangle]
pub unsafe extern "C" fn fjage_string_free(s: *mut c_char) {
    if !s.is_null() {
        libc::free(s.cast());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_gateway() {
        unsafe {
            assert_eq!(fjage_close(ptr::null_mut()), -1);
            assert_eq!(fjage_last_error(), FjageErrorCode::FjageInvalidArgument as c_int);
            assert!(fjage_get_agent_id(ptr::null_mut()).is_null());
            assert_eq!(fjage_subscribe(ptr::null_mut(), c"#t".as_ptr()), -1);
            assert!(!fjage_is_subscribed(ptr::null_mut(), c"#t".as_ptr()));
            assert!(fjage_agent_for_service(ptr::null_mut(), c"svc".as_ptr()).is_null());
            assert_eq!(
                fjage_agents_for_service(ptr::null_mut(), c"svc".as_ptr(), ptr::null_mut(), 0),
                -1
            );
            fjage_string_free(ptr::null_mut());
        }
    }

    #[test]
    fn test_open_rejects_bad_port() {
        unsafe {
            assert!(fjage_tcp_open(c"localhost".as_ptr(), 0).is_null());
            assert!(fjage_tcp_open(c"localhost".as_ptr(), 70_000).is_null());
            assert_eq!(fjage_last_error(), FjageErrorCode::FjageInvalidArgument as c_int);
        }
    }

    #[test]
    fn test_malloc_cstring() {
        let s = malloc_cstring("phy");
        assert_eq!(unsafe { CStr::from_ptr(s) }.to_str().unwrap(), "phy");
        unsafe { fjage_string_free(s) };
    }
}
