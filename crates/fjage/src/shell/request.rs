// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shell and file request messages.

use crate::error::{CodecError, GatewayError, Result};
use crate::message::{Message, Performative};
use crate::param::{ParamType, ParamValue, ScalarKind};
use serde_json::Value;

/// Service advertised by shell agents.
pub const SHELL_SERVICE: &str = "org.arl.fjage.shell.Services.SHELL";
pub const SHELL_EXEC_REQ: &str = "org.arl.fjage.shell.ShellExecReq";
pub const GET_FILE_REQ: &str = "org.arl.fjage.shell.GetFileReq";
pub const GET_FILE_RSP: &str = "org.arl.fjage.shell.GetFileRsp";
pub const PUT_FILE_REQ: &str = "org.arl.fjage.shell.PutFileReq";

/// Largest `PutFileReq` payload sent by [`Gateway::put_file`](crate::Gateway::put_file).
pub const FILE_CHUNK_SIZE: usize = 64 * 1024;

/// Run one shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellExecReq {
    pub cmd: String,
    /// Ask the shell to return the command's result in the reply.
    pub ans: bool,
}

impl ShellExecReq {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            ans: true,
        }
    }

    pub fn to_message(&self) -> Message {
        Message::new(SHELL_EXEC_REQ, Performative::Request)
            .with_field("cmd", self.cmd.as_str())
            .with_field("ans", self.ans)
    }

    /// Parse a `ShellExecReq` (agent side).
    pub fn from_message(msg: &Message) -> Result<Self> {
        expect_class(msg, SHELL_EXEC_REQ)?;
        Ok(Self {
            cmd: required_str(msg, "cmd")?,
            ans: msg.field("ans").and_then(Value::as_bool).unwrap_or(true),
        })
    }
}

/// Read `len` bytes of a file from offset `ofs`. A `len` of 0 reads to the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetFileReq {
    pub filename: String,
    pub ofs: u64,
    pub len: u64,
}

impl GetFileReq {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ofs: 0,
            len: 0,
        }
    }

    pub fn to_message(&self) -> Message {
        Message::new(GET_FILE_REQ, Performative::Request)
            .with_field("filename", self.filename.as_str())
            .with_field("ofs", self.ofs)
            .with_field("len", self.len)
    }

    pub fn from_message(msg: &Message) -> Result<Self> {
        expect_class(msg, GET_FILE_REQ)?;
        Ok(Self {
            filename: required_str(msg, "filename")?,
            ofs: u64_field(msg, "ofs"),
            len: u64_field(msg, "len"),
        })
    }
}

/// Contents of a file, or the listing of a directory when `dir` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetFileRsp {
    pub filename: String,
    pub dir: bool,
    pub contents: Vec<u8>,
    pub ofs: u64,
}

impl GetFileRsp {
    /// Build the `INFORM` reply to `request` (agent side).
    pub fn to_message(&self, request: &Message) -> Message {
        let mut msg = request.reply(GET_FILE_RSP, Performative::Inform);
        msg.set("filename", self.filename.as_str());
        msg.set("dir", self.dir);
        msg.set("ofs", self.ofs);
        msg.set_value("contents", &ParamValue::ByteArray(self.contents.clone()));
        msg
    }

    pub fn from_message(msg: &Message) -> Result<Self> {
        expect_class(msg, GET_FILE_RSP)?;
        Ok(Self {
            filename: msg
                .field("filename")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            dir: msg.field("dir").and_then(Value::as_bool).unwrap_or(false),
            contents: bytes_field(msg, "contents")?.unwrap_or_default(),
            ofs: u64_field(msg, "ofs"),
        })
    }
}

/// Write `contents` at offset `ofs`, or delete the file when `contents` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutFileReq {
    pub filename: String,
    pub contents: Option<Vec<u8>>,
    pub ofs: u64,
}

impl PutFileReq {
    pub fn write(filename: impl Into<String>, ofs: u64, contents: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            contents: Some(contents),
            ofs,
        }
    }

    pub fn delete(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            contents: None,
            ofs: 0,
        }
    }

    pub fn to_message(&self) -> Message {
        let mut msg = Message::new(PUT_FILE_REQ, Performative::Request)
            .with_field("filename", self.filename.as_str())
            .with_field("ofs", self.ofs);
        match &self.contents {
            Some(contents) => msg.set_value("contents", &ParamValue::ByteArray(contents.clone())),
            None => msg.set("contents", Value::Null),
        }
        msg
    }

    pub fn from_message(msg: &Message) -> Result<Self> {
        expect_class(msg, PUT_FILE_REQ)?;
        Ok(Self {
            filename: required_str(msg, "filename")?,
            contents: bytes_field(msg, "contents")?,
            ofs: u64_field(msg, "ofs"),
        })
    }
}

fn expect_class(msg: &Message, clazz: &str) -> Result<()> {
    if msg.clazz == clazz {
        Ok(())
    } else {
        Err(GatewayError::UnexpectedFrame(format!(
            "expected {clazz}, got {}",
            msg.clazz
        )))
    }
}

fn required_str(msg: &Message, key: &str) -> Result<String> {
    msg.field(key)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| GatewayError::UnexpectedFrame(format!("{} without '{key}'", msg.clazz)))
}

fn u64_field(msg: &Message, key: &str) -> u64 {
    msg.field(key).and_then(Value::as_u64).unwrap_or(0)
}

/// Byte content, sent either as a Java `byte[]` or as a plain JSON array of
/// (possibly signed) bytes.
fn bytes_field(msg: &Message, key: &str) -> Result<Option<Vec<u8>>> {
    let bytes = match msg.get_value(key)? {
        ParamValue::Null => return Ok(None),
        ParamValue::EmptyArray => Vec::new(),
        ParamValue::ByteArray(v) => v,
        ParamValue::IntArray(v) => to_bytes(v.into_iter().map(i64::from))?,
        ParamValue::LongArray(v) => to_bytes(v)?,
        other => {
            return Err(GatewayError::TypeMismatch {
                expected: ParamType::Array(ScalarKind::Byte),
                found: other.type_name(),
            })
        }
    };
    Ok(Some(bytes))
}

fn to_bytes(values: impl IntoIterator<Item = i64>) -> std::result::Result<Vec<u8>, CodecError> {
    values
        .into_iter()
        .map(|v| match v {
            -128..=255 => Ok(v as u8),
            _ => Err(CodecError::Unsupported(format!("byte value {v}"))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shell_exec_wire_form() {
        let msg = ShellExecReq::new("ps").to_message();
        assert_eq!(msg.clazz, SHELL_EXEC_REQ);
        assert_eq!(msg.perf(), Performative::Request);
        assert_eq!(msg.field("cmd"), Some(&json!("ps")));
        assert_eq!(msg.field("ans"), Some(&json!(true)));
        assert_eq!(ShellExecReq::from_message(&msg).expect("parse"), ShellExecReq::new("ps"));
    }

    #[test]
    fn test_put_file_carries_java_bytes() {
        let msg = PutFileReq::write("a.txt", 8, b"hi".to_vec()).to_message();
        assert_eq!(msg.field("contents"), Some(&json!({"clazz": "[B", "data": "aGk="})));
        let parsed = PutFileReq::from_message(&msg).expect("parse");
        assert_eq!(parsed.contents.as_deref(), Some(&b"hi"[..]));
        assert_eq!(parsed.ofs, 8);

        let delete = PutFileReq::from_message(&PutFileReq::delete("a.txt").to_message())
            .expect("parse");
        assert_eq!(delete.contents, None);
    }

    #[test]
    fn test_file_contents_as_plain_signed_bytes() {
        let request = GetFileReq::new("b.bin").to_message();
        let mut reply = request.reply(GET_FILE_RSP, Performative::Inform);
        reply.set("filename", "b.bin");
        reply.set("contents", json!([104, -1, 0]));
        let rsp = GetFileRsp::from_message(&reply).expect("parse");
        assert_eq!(rsp.contents, vec![104, 255, 0]);
        assert!(!rsp.dir);

        reply.set("contents", json!([1000]));
        assert!(matches!(
            GetFileRsp::from_message(&reply),
            Err(GatewayError::Codec(_))
        ));
        reply.set("contents", "text");
        assert!(matches!(
            GetFileRsp::from_message(&reply),
            Err(GatewayError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_wrong_class_is_rejected() {
        let msg = GetFileReq::new("x").to_message();
        assert!(matches!(
            PutFileReq::from_message(&msg),
            Err(GatewayError::UnexpectedFrame(_))
        ));
        let mut bare = Message::new(GET_FILE_REQ, Performative::Request);
        bare.set("ofs", 3);
        assert!(GetFileReq::from_message(&bare).is_err());
    }
}
