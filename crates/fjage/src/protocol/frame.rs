// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON frames exchanged with a fjåge master container.
//!
//! One frame per line. A frame is one of:
//! - `{"alive": true}`
//! - a request, tagged by `action`
//! - a response to a container query, tagged by `inResponseTo`

use crate::error::{GatewayError, Result};
use crate::message::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request from one side of the link to the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RequestFrame {
    Agents {
        id: String,
    },
    ContainsAgent {
        id: String,
        #[serde(rename = "agentID")]
        agent_id: String,
    },
    Services {
        id: String,
    },
    AgentForService {
        id: String,
        service: String,
    },
    AgentsForService {
        id: String,
        service: String,
    },
    /// Deliver a message.
    Send {
        message: Message,
        #[serde(default)]
        relay: bool,
    },
    /// Announce the AgentIDs and topics this side wants messages for.
    WantsMessagesFor {
        #[serde(rename = "agentIDs")]
        agent_ids: Vec<String>,
    },
}

/// Answer to a container query, correlated on `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "inResponseTo", rename_all = "camelCase")]
pub enum ResponseFrame {
    Agents {
        id: String,
        #[serde(rename = "agentIDs", default)]
        agent_ids: Vec<String>,
    },
    ContainsAgent {
        id: String,
        #[serde(default)]
        answer: bool,
    },
    Services {
        id: String,
        #[serde(default)]
        services: Vec<String>,
    },
    AgentForService {
        id: String,
        #[serde(rename = "agentID", default, skip_serializing_if = "Option::is_none")]
        agent_id: Option<String>,
    },
    AgentsForService {
        id: String,
        #[serde(rename = "agentIDs", default)]
        agent_ids: Vec<String>,
    },
}

impl ResponseFrame {
    pub fn id(&self) -> &str {
        match self {
            Self::Agents { id, .. }
            | Self::ContainsAgent { id, .. }
            | Self::Services { id, .. }
            | Self::AgentForService { id, .. }
            | Self::AgentsForService { id, .. } => id,
        }
    }
}

/// Any frame on the link.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Alive(bool),
    Request(RequestFrame),
    Response(ResponseFrame),
}

impl Frame {
    /// Parse one line.
    pub fn from_json(line: &str) -> Result<Self> {
        Self::from_slice(line.as_bytes())
    }

    /// Parse one line of raw bytes. Invalid UTF-8 is a frame error.
    pub fn from_slice(line: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(line)?;
        if value.get("action").is_some() {
            return Ok(Self::Request(serde_json::from_value(value)?));
        }
        if value.get("inResponseTo").is_some() {
            return Ok(Self::Response(serde_json::from_value(value)?));
        }
        if let Some(alive) = value.get("alive") {
            return Ok(Self::Alive(alive.as_bool().unwrap_or(false)));
        }
        Err(GatewayError::UnexpectedFrame(truncate(&String::from_utf8_lossy(line))))
    }

    /// Serialize to one line, without the terminating newline.
    pub fn to_json(&self) -> Result<String> {
        let line = match self {
            Self::Alive(alive) => serde_json::to_string(&serde_json::json!({ "alive": alive }))?,
            Self::Request(request) => serde_json::to_string(request)?,
            Self::Response(response) => serde_json::to_string(response)?,
        };
        Ok(line)
    }
}

fn truncate(line: &str) -> String {
    const MAX: usize = 80;
    match line.char_indices().nth(MAX) {
        Some((end, _)) => format!("{}...", &line[..end]),
        None => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Performative;
    use serde_json::json;

    #[test]
    fn test_alive() {
        assert_eq!(Frame::from_json(r#"{"alive":true}"#).expect("parse"), Frame::Alive(true));
        assert_eq!(Frame::Alive(true).to_json().expect("serialize"), r#"{"alive":true}"#);
    }

    #[test]
    fn test_request_tags() {
        let frame = Frame::from_json(r#"{"action":"containsAgent","id":"7","agentID":"phy"}"#)
            .expect("parse");
        assert_eq!(
            frame,
            Frame::Request(RequestFrame::ContainsAgent {
                id: "7".into(),
                agent_id: "phy".into()
            })
        );

        let line = Frame::Request(RequestFrame::WantsMessagesFor {
            agent_ids: vec!["gw".into(), "#phy__ntf".into()],
        })
        .to_json()
        .expect("serialize");
        let value: Value = serde_json::from_str(&line).expect("json");
        assert_eq!(
            value,
            json!({"action": "wantsMessagesFor", "agentIDs": ["gw", "#phy__ntf"]})
        );
    }

    #[test]
    fn test_send_frame_carries_message() {
        let line = r#"{"action":"send","relay":false,"message":{"clazz":"org.arl.fjage.GenericMessage","data":{"msgID":"1","perf":"INFORM","recipient":"gw","sender":"phy","x":3}}}"#;
        match Frame::from_json(line).expect("parse") {
            Frame::Request(RequestFrame::Send { message, relay }) => {
                assert!(!relay);
                assert_eq!(message.perf(), Performative::Inform);
                assert_eq!(message.field("x"), Some(&json!(3)));
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_responses() {
        let frame =
            Frame::from_json(r#"{"inResponseTo":"agentForService","id":"9"}"#).expect("parse");
        assert_eq!(
            frame,
            Frame::Response(ResponseFrame::AgentForService {
                id: "9".into(),
                agent_id: None
            })
        );

        let frame = Frame::from_json(
            r#"{"inResponseTo":"agents","id":"3","agentIDs":["phy","mac"]}"#,
        )
        .expect("parse");
        match frame {
            Frame::Response(rsp) => assert_eq!(rsp.id(), "3"),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(Frame::from_json("not json"), Err(GatewayError::Frame(_))));
        assert!(matches!(
            Frame::from_json(r#"{"hello":1}"#),
            Err(GatewayError::UnexpectedFrame(_))
        ));
        assert!(matches!(
            Frame::from_json(r#"{"action":"teleport","id":"1"}"#),
            Err(GatewayError::Frame(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_is_a_frame_error() {
        assert!(matches!(
            Frame::from_slice(b"\xff\xfe{\"alive\":true}"),
            Err(GatewayError::Frame(_))
        ));
        assert_eq!(
            Frame::from_slice(br#"{"alive":true}"#).expect("parse"),
            Frame::Alive(true)
        );
    }
}
