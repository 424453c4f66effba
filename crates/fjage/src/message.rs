// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! fjåge messages.
//!
//! On the wire a message is `{"clazz": "<java class>", "data": {...}}`. The
//! header fields of `data` are typed; everything else is kept as raw JSON in
//! [`Payload::fields`] and decoded on demand with [`Message::get_value`].

use crate::error::CodecError;
use crate::param::{codec, ParamValue};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Class of messages that carry no specific payload type.
pub const GENERIC_MESSAGE: &str = "org.arl.fjage.GenericMessage";

/// FIPA performatives understood by fjåge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Performative {
    #[default]
    None,
    Request,
    Agree,
    Refuse,
    Failure,
    Inform,
    Confirm,
    Disconfirm,
    QueryIf,
    NotUnderstood,
    Cfp,
    Propose,
    Cancel,
}

impl Performative {
    const ALL: [Self; 13] = [
        Self::None,
        Self::Request,
        Self::Agree,
        Self::Refuse,
        Self::Failure,
        Self::Inform,
        Self::Confirm,
        Self::Disconfirm,
        Self::QueryIf,
        Self::NotUnderstood,
        Self::Cfp,
        Self::Propose,
        Self::Cancel,
    ];

    /// Stable integer code (`NONE` = 0 ... `CANCEL` = 12).
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_i32(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// True for performatives that end a request with a negative outcome.
    pub fn is_negative(self) -> bool {
        matches!(
            self,
            Self::Refuse | Self::Failure | Self::Disconfirm | Self::NotUnderstood
        )
    }
}

/// Header and content of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(rename = "msgID")]
    pub msg_id: String,

    #[serde(default)]
    pub perf: Performative,

    #[serde(default, deserialize_with = "nullable_string")]
    pub recipient: String,

    #[serde(rename = "inReplyTo", default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,

    #[serde(default, deserialize_with = "nullable_string")]
    pub sender: String,

    /// Milliseconds since the Unix epoch.
    #[serde(rename = "sentAt", default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<i64>,

    /// Class-specific fields, as raw JSON.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A fjåge message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub clazz: String,
    pub data: Payload,
}

impl Message {
    /// New message of class `clazz` with a fresh UUIDv4 `msgID`.
    pub fn new(clazz: impl Into<String>, perf: Performative) -> Self {
        Self {
            clazz: clazz.into(),
            data: Payload {
                msg_id: Uuid::new_v4().to_string(),
                perf,
                recipient: String::new(),
                in_reply_to: None,
                sender: String::new(),
                sent_at: None,
                fields: Map::new(),
            },
        }
    }

    pub fn generic(perf: Performative) -> Self {
        Self::new(GENERIC_MESSAGE, perf)
    }

    /// Reply addressed to the sender of `self`, correlated on its `msgID`.
    pub fn reply(&self, clazz: impl Into<String>, perf: Performative) -> Self {
        let mut reply = Self::new(clazz, perf);
        reply.data.in_reply_to = Some(self.data.msg_id.clone());
        reply.data.recipient = self.data.sender.clone();
        reply.data.sender = self.data.recipient.clone();
        reply
    }

    pub fn id(&self) -> &str {
        &self.data.msg_id
    }

    pub fn perf(&self) -> Performative {
        self.data.perf
    }

    pub fn in_reply_to(&self) -> Option<&str> {
        self.data.in_reply_to.as_deref()
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.fields.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.fields.insert(key.into(), value.into());
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Decode field `key` through the value codec. A missing field is `Null`.
    pub fn get_value(&self, key: &str) -> Result<ParamValue, CodecError> {
        match self.field(key) {
            Some(value) => codec::from_json(value),
            None => Ok(ParamValue::Null),
        }
    }

    /// Encode `value` into field `key`.
    pub fn set_value(&mut self, key: impl Into<String>, value: &ParamValue) {
        self.set(key, codec::to_json(value));
    }
}
