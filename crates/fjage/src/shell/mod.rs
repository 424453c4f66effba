// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Remote shell and file access.
//!
//! Containers usually host a shell agent advertising [`SHELL_SERVICE`]. It
//! runs commands ([`ShellExecReq`]) and reads or writes files on the host of
//! the container ([`GetFileReq`], [`PutFileReq`]).
//!
//! ```rust,no_run
//! use fjage::Gateway;
//! use std::time::Duration;
//!
//! # async fn example() -> fjage::Result<()> {
//! let gw = Gateway::tcp("localhost", 1100).await?;
//! let shell = gw.shell_agent().await?;
//! gw.put_file(&shell, "hello.txt", b"hello").await?;
//! let contents = gw.get_file(&shell, "hello.txt", 0, 0).await?.contents;
//! let answer = gw.shell_exec(&shell, "ls", Duration::from_secs(5)).await?;
//! # Ok(())
//! # }
//! ```

mod access;
mod request;

pub use request::{
    GetFileReq, GetFileRsp, PutFileReq, ShellExecReq, FILE_CHUNK_SIZE, GET_FILE_REQ,
    GET_FILE_RSP, PUT_FILE_REQ, SHELL_EXEC_REQ, SHELL_SERVICE,
};

#[cfg(test)]
mod tests;
