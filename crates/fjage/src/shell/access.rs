// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shell and file requests on a [`Gateway`].

use super::request::{
    GetFileReq, GetFileRsp, PutFileReq, ShellExecReq, FILE_CHUNK_SIZE, SHELL_SERVICE,
};
use crate::agent::AgentId;
use crate::error::{GatewayError, RemoteError, Result};
use crate::gateway::Gateway;
use crate::message::{Message, Performative};
use log::debug;
use serde_json::Value;
use std::time::Duration;

impl Gateway {
    /// The agent providing [`SHELL_SERVICE`].
    pub async fn shell_agent(&self) -> Result<AgentId> {
        self.agent_for_service(SHELL_SERVICE).await?.ok_or_else(|| {
            RemoteError::NoService {
                service: SHELL_SERVICE.to_string(),
            }
            .into()
        })
    }

    /// Run `cmd` on `shell` and return the answer it reported, if any.
    ///
    /// Commands may run for a while, so the caller picks the timeout.
    pub async fn shell_exec(
        &self,
        shell: &AgentId,
        cmd: &str,
        timeout: Duration,
    ) -> Result<Option<String>> {
        let msg = ShellExecReq::new(cmd).to_message();
        debug!("exec on {}: {} ({})", shell, cmd, msg.id());
        let reply = self.request(shell, msg, timeout).await?;
        expect_agree(&reply)?;
        Ok(reply.field("ans").and_then(answer_text))
    }

    /// Read `len` bytes of `filename` from `ofs`; `len == 0` reads to the end.
    pub async fn get_file(
        &self,
        shell: &AgentId,
        filename: &str,
        ofs: u64,
        len: u64,
    ) -> Result<GetFileRsp> {
        let request = GetFileReq {
            filename: filename.to_string(),
            ofs,
            len,
        };
        debug!("get {}:{} [{}+{}]", shell, filename, ofs, len);
        let reply = self
            .request(shell, request.to_message(), self.request_timeout())
            .await?;
        if reply.perf() != Performative::Inform {
            return Err(refusal(&reply));
        }
        GetFileRsp::from_message(&reply)
    }

    /// Replace `filename` with `contents`, in chunks of [`FILE_CHUNK_SIZE`].
    pub async fn put_file(&self, shell: &AgentId, filename: &str, contents: &[u8]) -> Result<()> {
        if contents.is_empty() {
            return self
                .put_file_request(shell, PutFileReq::write(filename, 0, Vec::new()))
                .await;
        }
        for (i, chunk) in contents.chunks(FILE_CHUNK_SIZE).enumerate() {
            let ofs = (i * FILE_CHUNK_SIZE) as u64;
            self.put_file_request(shell, PutFileReq::write(filename, ofs, chunk.to_vec()))
                .await?;
        }
        Ok(())
    }

    pub async fn delete_file(&self, shell: &AgentId, filename: &str) -> Result<()> {
        self.put_file_request(shell, PutFileReq::delete(filename))
            .await
    }

    async fn put_file_request(&self, shell: &AgentId, request: PutFileReq) -> Result<()> {
        debug!(
            "put {}:{} [{}+{}]",
            shell,
            request.filename,
            request.ofs,
            request.contents.as_ref().map_or(0, Vec::len)
        );
        let reply = self
            .request(shell, request.to_message(), self.request_timeout())
            .await?;
        expect_agree(&reply)
    }
}

fn expect_agree(reply: &Message) -> Result<()> {
    match reply.perf() {
        Performative::Agree => Ok(()),
        _ => Err(refusal(reply)),
    }
}

fn refusal(reply: &Message) -> GatewayError {
    RemoteError::Refused { perf: reply.perf() }.into()
}

fn answer_text(ans: &Value) -> Option<String> {
    match ans {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
