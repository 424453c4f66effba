// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-thread last error.
//!
//! Entry points narrow every failure to `-1`, a default value or NULL. The
//! cause is kept here until the next call on the same thread.

use std::cell::RefCell;
use std::os::raw::{c_char, c_int};
use std::ptr;

use fjage::{ErrorCode, GatewayError};

/// Cause of the last failing call on this thread.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FjageErrorCode {
    FjageOk = 0,
    FjageTimeout = 1,
    FjageTransport = 2,
    FjageClosed = 3,
    FjageNotFound = 4,
    FjageReadOnly = 5,
    FjageIndexOutOfRange = 6,
    FjageRemoteTypeMismatch = 7,
    FjageRejected = 8,
    FjageRefused = 9,
    FjageTypeMismatch = 10,
    FjageCodec = 11,
    FjageInvalidArgument = 12,
    FjageConfig = 13,
}

impl From<ErrorCode> for FjageErrorCode {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::Ok => Self::FjageOk,
            ErrorCode::Timeout => Self::FjageTimeout,
            ErrorCode::Transport => Self::FjageTransport,
            ErrorCode::Closed => Self::FjageClosed,
            ErrorCode::NotFound => Self::FjageNotFound,
            ErrorCode::ReadOnly => Self::FjageReadOnly,
            ErrorCode::IndexOutOfRange => Self::FjageIndexOutOfRange,
            ErrorCode::RemoteTypeMismatch => Self::FjageRemoteTypeMismatch,
            ErrorCode::Rejected => Self::FjageRejected,
            ErrorCode::Refused => Self::FjageRefused,
            ErrorCode::TypeMismatch => Self::FjageTypeMismatch,
            ErrorCode::Codec => Self::FjageCodec,
            ErrorCode::InvalidArgument => Self::FjageInvalidArgument,
            ErrorCode::Config => Self::FjageConfig,
        }
    }
}

struct LastError {
    code: FjageErrorCode,
    message: String,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<LastError>> = const { RefCell::new(None) };
}

/// Log `err` as the failure of `function` and remember it for this thread.
pub(crate) fn record(function: &str, err: &GatewayError) {
    log::error!("{}: {}", function, err);
    let last = LastError {
        code: err.code().into(),
        message: err.to_string(),
    };
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(last));
}

pub(crate) fn clear() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

/// Clear or record the outcome of a call and narrow it to `0` / `-1`.
pub(crate) fn status(function: &str, result: fjage::Result<()>) -> c_int {
    match result {
        Ok(()) => {
            clear();
            0
        }
        Err(e) => {
            record(function, &e);
            -1
        }
    }
}

/// Error code of the last failing call on this thread, `0` when the last
/// call succeeded.
#[no_mangle]
pub extern "C" fn fjage_last_error() -> c_int {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map_or(FjageErrorCode::FjageOk, |last| last.code) as c_int
    })
}

/// Copy the message of the last failing call into `buf`.
///
/// Returns the message length excluding the NUL terminator, `0` when there
/// is no error. At most `capacity - 1` bytes are written, always followed by
/// a NUL when `capacity > 0`.
///
/// # Safety
/// `buf` must be NULL or point to at least `capacity` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn fjage_last_error_message(buf: *mut c_char, capacity: usize) -> usize {
    LAST_ERROR.with(|slot| {
        let slot = slot.borrow();
        let message = slot.as_ref().map_or("", |last| last.message.as_str());
        copy_str_to_buf(message, buf, capacity)
    })
}

/// Copy `s` into a C buffer, truncating and NUL-terminating. Returns the
/// full length of `s`.
pub(crate) unsafe fn copy_str_to_buf(s: &str, buf: *mut c_char, capacity: usize) -> usize {
    let needed = s.len();
    if !buf.is_null() && capacity > 0 {
        let n = needed.min(capacity - 1);
        ptr::copy_nonoverlapping(s.as_ptr(), buf.cast::<u8>(), n);
        *buf.add(n) = 0;
    }
    needed
}

#[cfg(test)]
mod tests {
    use super::*;
    use fjage::RemoteError;
    use std::ffi::CStr;

    #[test]
    fn test_codes_mirror_core() {
        assert_eq!(FjageErrorCode::from(ErrorCode::ReadOnly) as i32, ErrorCode::ReadOnly.as_i32());
        assert_eq!(FjageErrorCode::from(ErrorCode::Config) as i32, ErrorCode::Config.as_i32());
    }

    #[test]
    fn test_record_then_clear() {
        let err = GatewayError::Remote(RemoteError::ReadOnly {
            param: "roIntParam".into(),
        });
        assert_eq!(status("test", Err(err)), -1);
        assert_eq!(fjage_last_error(), FjageErrorCode::FjageReadOnly as c_int);

        let mut buf = [0 as c_char; 64];
        let len = unsafe { fjage_last_error_message(buf.as_mut_ptr(), buf.len()) };
        let msg = unsafe { CStr::from_ptr(buf.as_ptr()) }.to_str().unwrap();
        assert_eq!(len, msg.len());
        assert!(msg.contains("roIntParam"));

        assert_eq!(status("test", Ok(())), 0);
        assert_eq!(fjage_last_error(), 0);
        assert_eq!(unsafe { fjage_last_error_message(ptr::null_mut(), 0) }, 0);
    }

    #[test]
    fn test_copy_truncates() {
        let mut small = [0x7f as c_char; 4];
        let needed = unsafe { copy_str_to_buf("hello", small.as_mut_ptr(), small.len()) };
        assert_eq!(needed, 5);
        assert_eq!(unsafe { CStr::from_ptr(small.as_ptr()) }.to_bytes(), b"hel");
    }
}
