// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Logging setup for C callers.
//!
//! All three initializers install an `env_logger` backend for the `log`
//! facade. Only the first successful call takes effect; later ones return
//! `-1`.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};

use env_logger::{Builder, Env};

/// Minimum level for gateway logging.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FjageLogLevel {
    FjageLogOff = 0,
    FjageLogError = 1,
    FjageLogWarn = 2,
    FjageLogInfo = 3,
    FjageLogDebug = 4,
    FjageLogTrace = 5,
}

impl From<FjageLogLevel> for log::LevelFilter {
    fn from(level: FjageLogLevel) -> Self {
        match level {
            FjageLogLevel::FjageLogOff => Self::Off,
            FjageLogLevel::FjageLogError => Self::Error,
            FjageLogLevel::FjageLogWarn => Self::Warn,
            FjageLogLevel::FjageLogInfo => Self::Info,
            FjageLogLevel::FjageLogDebug => Self::Debug,
            FjageLogLevel::FjageLogTrace => Self::Trace,
        }
    }
}

fn install(mut builder: Builder) -> c_int {
    match builder.format_timestamp_millis().try_init() {
        Ok(()) => 0,
        Err(_) => -1,
    }
}

/// Log to stderr at `level` and above.
///
/// ```c
/// fjage_logging_init(FJAGE_LOG_INFO);
/// ```
#[no_mangle]
pub extern "C" fn fjage_logging_init(level: FjageLogLevel) -> c_int {
    let mut builder = Builder::new();
    builder.filter_level(level.into());
    install(builder)
}

/// Log using `RUST_LOG` when set, `default_level` otherwise.
#[no_mangle]
pub extern "C" fn fjage_logging_init_env(default_level: FjageLogLevel) -> c_int {
    let default = log::LevelFilter::from(default_level).to_string();
    install(Builder::from_env(
        Env::default().default_filter_or(default.to_lowercase()),
    ))
}

/// Log using an `env_logger` filter string such as `"fjage=debug,warn"`.
///
/// # Safety
/// `filter` must be NULL or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn fjage_logging_init_with_filter(filter: *const c_char) -> c_int {
    if filter.is_null() {
        return -1;
    }
    let Ok(filter) = CStr::from_ptr(filter).to_str() else {
        return -1;
    };
    let mut builder = Builder::new();
    builder.parse_filters(filter);
    install(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(log::LevelFilter::from(FjageLogLevel::FjageLogOff), log::LevelFilter::Off);
        assert_eq!(log::LevelFilter::from(FjageLogLevel::FjageLogWarn), log::LevelFilter::Warn);
        assert_eq!(log::LevelFilter::from(FjageLogLevel::FjageLogTrace), log::LevelFilter::Trace);
    }

    #[test]
    fn test_null_filter_is_rejected() {
        assert_eq!(unsafe { fjage_logging_init_with_filter(std::ptr::null()) }, -1);
    }
}
