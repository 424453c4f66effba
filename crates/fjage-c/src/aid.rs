// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! AgentIDs as C strings.
//!
//! An [`FjageAid`] is a NUL-terminated name. Topics carry a leading `#`.
//! IDs created here are `malloc`-allocated and released with
//! [`fjage_aid_destroy`]; string literals can be passed wherever an ID is
//! only read.

use std::os::raw::c_char;
use std::ptr;

use fjage::AgentId;

use crate::{cstr_arg, malloc_cstring};

/// NUL-terminated AgentID.
pub type FjageAid = *const c_char;

/// Create an AgentID for `name`. Returns NULL if `name` is NULL.
///
/// # Safety
/// `name` must be NULL or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn fjage_aid_create(name: *const c_char) -> FjageAid {
    match cstr_arg("fjage_aid_create", name) {
        Some(name) => malloc_cstring(AgentId::new(name).as_str()),
        None => ptr::null(),
    }
}

/// Create the topic AgentID `#name`.
///
/// # Safety
/// `name` must be NULL or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn fjage_aid_topic(name: *const c_char) -> FjageAid {
    match cstr_arg("fjage_aid_topic", name) {
        Some(name) => malloc_cstring(AgentId::topic(name).as_str()),
        None => ptr::null(),
    }
}

/// Release an AgentID created by this library.
///
/// # Safety
/// `aid` must be NULL or come from `fjage_aid_create`, `fjage_aid_topic`,
/// `fjage_agent_for_service` or `fjage_agents_for_service`, and not be used
/// afterwards.
#[no_mangle]
pub unsafe extern "C" fn fjage_aid_destroy(aid: FjageAid) {
    if !aid.is_null() {
        libc::free(aid.cast_mut().cast());
    }
}

/// True when `aid` names a topic.
///
/// # Safety
/// `aid` must be NULL or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn fjage_aid_is_topic(aid: FjageAid) -> bool {
    cstr_arg("fjage_aid_is_topic", aid).is_some_and(|name| AgentId::new(name).is_topic())
}

/// Borrow `aid` as an [`AgentId`].
pub(crate) unsafe fn agent_arg(function: &str, aid: FjageAid) -> Option<AgentId> {
    cstr_arg(function, aid).map(AgentId::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn test_create_and_topic() {
        unsafe {
            let aid = fjage_aid_create(c"phy".as_ptr());
            assert_eq!(CStr::from_ptr(aid).to_str().unwrap(), "phy");
            assert!(!fjage_aid_is_topic(aid));

            let topic = fjage_aid_topic(c"params".as_ptr());
            assert_eq!(CStr::from_ptr(topic).to_str().unwrap(), "#params");
            assert!(fjage_aid_is_topic(topic));

            fjage_aid_destroy(aid);
            fjage_aid_destroy(topic);
        }
    }

    #[test]
    fn test_null_safety() {
        unsafe {
            assert!(fjage_aid_create(ptr::null()).is_null());
            assert!(fjage_aid_topic(ptr::null()).is_null());
            assert!(!fjage_aid_is_topic(ptr::null()));
            fjage_aid_destroy(ptr::null());
        }
    }
}
