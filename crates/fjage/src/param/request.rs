// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `ParameterReq` / `ParameterRsp` messages.

use super::value::{ParamIndex, ParamValue};
use crate::agent::AgentId;
use crate::error::{GatewayError, RemoteError, Result};
use crate::message::{Message, Performative};
use serde_json::Value;

pub const PARAMETER_REQ: &str = "org.arl.fjage.param.ParameterReq";
pub const PARAMETER_RSP: &str = "org.arl.fjage.param.ParameterRsp";

/// A get or set of one parameter on one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRequest {
    pub agent: AgentId,
    pub param: String,
    pub index: ParamIndex,
    /// `Some` for a set, `None` for a get.
    pub value: Option<ParamValue>,
}

impl ParameterRequest {
    pub fn get(agent: &AgentId, param: &str, index: ParamIndex) -> Self {
        Self {
            agent: agent.clone(),
            param: param.to_string(),
            index,
            value: None,
        }
    }

    pub fn set(agent: &AgentId, param: &str, index: ParamIndex, value: ParamValue) -> Self {
        Self {
            agent: agent.clone(),
            param: param.to_string(),
            index,
            value: Some(value),
        }
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Build the `ParameterReq` message, with a fresh `msgID`.
    pub fn to_message(&self) -> Message {
        let mut msg = Message::new(PARAMETER_REQ, Performative::Request);
        msg.data.recipient = self.agent.to_string();
        msg.set("param", self.param.as_str());
        msg.set("index", self.index.as_raw());
        match &self.value {
            Some(value) => msg.set_value("value", value),
            None => msg.set("value", Value::Null),
        }
        msg
    }

    /// Parse a `ParameterReq` message (agent side).
    pub fn from_message(msg: &Message) -> Result<Self> {
        if msg.clazz != PARAMETER_REQ {
            return Err(GatewayError::UnexpectedFrame(format!(
                "expected {PARAMETER_REQ}, got {}",
                msg.clazz
            )));
        }
        let param = msg
            .field("param")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::UnexpectedFrame("ParameterReq without 'param'".into()))?;
        let index = msg
            .field("index")
            .and_then(Value::as_i64)
            .map_or(ParamIndex::Whole, ParamIndex::from_raw);
        let value = match msg.get_value("value")? {
            ParamValue::Null => None,
            value => Some(value),
        };
        Ok(Self {
            agent: AgentId::new(msg.data.recipient.as_str()),
            param: param.to_string(),
            index,
            value,
        })
    }
}

/// Decoded `ParameterRsp`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterResponse {
    pub perf: Performative,
    pub param: Option<String>,
    pub index: ParamIndex,
    pub value: ParamValue,
    /// Parameters the agent reports as read-only.
    pub readonly: Vec<String>,
}

impl ParameterResponse {
    /// Successful reply carrying `value`.
    pub fn inform(request: &ParameterRequest, value: ParamValue) -> Self {
        Self {
            perf: Performative::Inform,
            param: Some(request.param.clone()),
            index: request.index,
            value,
            readonly: Vec::new(),
        }
    }

    /// Negative reply with no value.
    pub fn failure(request: &ParameterRequest) -> Self {
        Self {
            perf: Performative::Failure,
            param: Some(request.param.clone()),
            index: request.index,
            value: ParamValue::Null,
            readonly: Vec::new(),
        }
    }

    pub fn from_message(msg: &Message) -> Result<Self> {
        let readonly = match msg.field("readonly") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect(),
            _ => Vec::new(),
        };
        Ok(Self {
            perf: msg.perf(),
            param: msg.field("param").and_then(Value::as_str).map(str::to_owned),
            index: msg
                .field("index")
                .and_then(Value::as_i64)
                .map_or(ParamIndex::Whole, ParamIndex::from_raw),
            value: msg.get_value("value")?,
            readonly,
        })
    }

    /// Build the `ParameterRsp` reply to `request` (agent side).
    pub fn to_message(&self, request: &Message) -> Message {
        let mut msg = request.reply(PARAMETER_RSP, self.perf);
        if let Some(param) = &self.param {
            msg.set("param", param.as_str());
        }
        msg.set("index", self.index.as_raw());
        msg.set_value("value", &self.value);
        if !self.readonly.is_empty() {
            msg.set("readonly", self.readonly.clone());
        }
        msg
    }

    /// Interpret this reply to `request`, turning negative outcomes into
    /// [`RemoteError`]s.
    pub fn into_value(self, request: &ParameterRequest) -> Result<ParamValue> {
        let param = request.param.clone();
        match self.perf {
            Performative::Inform => {}
            Performative::Failure | Performative::Refuse => {
                let err = match request.index {
                    ParamIndex::Element(index) => RemoteError::IndexOutOfRange { param, index },
                    ParamIndex::Whole => RemoteError::NotFound { param },
                };
                return Err(err.into());
            }
            perf => return Err(RemoteError::Refused { perf }.into()),
        }
        if request.is_set() && self.readonly.iter().any(|p| *p == request.param) {
            return Err(RemoteError::ReadOnly { param }.into());
        }
        if self.value.is_null() {
            return Err(RemoteError::NotFound { param }.into());
        }
        Ok(self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn phy() -> AgentId {
        AgentId::new("phy")
    }

    #[test]
    fn test_get_request_wire_form() {
        let req = ParameterRequest::get(&phy(), "MTU", ParamIndex::Whole);
        let msg = req.to_message();
        assert_eq!(msg.clazz, PARAMETER_REQ);
        assert_eq!(msg.perf(), Performative::Request);
        assert_eq!(msg.data.recipient, "phy");
        assert_eq!(msg.field("param"), Some(&json!("MTU")));
        assert_eq!(msg.field("index"), Some(&json!(-1)));
        assert_eq!(msg.field("value"), Some(&Value::Null));
    }

    #[test]
    fn test_requests_get_unique_ids() {
        let req = ParameterRequest::get(&phy(), "MTU", ParamIndex::Whole);
        assert_ne!(req.to_message().id(), req.to_message().id());
    }

    #[test]
    fn test_set_request_round_trip() {
        let req = ParameterRequest::set(
            &phy(),
            "rwIntArrayParam",
            ParamIndex::Element(2),
            ParamValue::IntArray(vec![20]),
        );
        let msg = req.to_message();
        assert_eq!(msg.field("index"), Some(&json!(2)));
        assert_eq!(msg.field("value"), Some(&json!({"clazz": "[I", "data": "FAAAAA=="})));
        assert_eq!(ParameterRequest::from_message(&msg).expect("parse"), req);
    }

    #[test]
    fn test_response_round_trip() {
        let req = ParameterRequest::get(&phy(), "roIntParam", ParamIndex::Whole);
        let mut rsp = ParameterResponse::inform(&req, ParamValue::Long(42));
        rsp.readonly = vec!["roIntParam".into()];

        let msg = rsp.to_message(&req.to_message());
        assert_eq!(msg.clazz, PARAMETER_RSP);
        assert_eq!(ParameterResponse::from_message(&msg).expect("parse"), rsp);
    }

    #[test]
    fn test_failure_maps_to_remote_errors() {
        let whole = ParameterRequest::get(&phy(), "nope", ParamIndex::Whole);
        let err = ParameterResponse::failure(&whole).into_value(&whole).unwrap_err();
        assert!(matches!(err, GatewayError::Remote(RemoteError::NotFound { .. })));

        let element = ParameterRequest::get(&phy(), "vec", ParamIndex::Element(9));
        let err = ParameterResponse::failure(&element).into_value(&element).unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Remote(RemoteError::IndexOutOfRange { index: 9, .. })
        ));
    }

    #[test]
    fn test_not_understood_is_refused() {
        let req = ParameterRequest::get(&phy(), "x", ParamIndex::Whole);
        let mut rsp = ParameterResponse::failure(&req);
        rsp.perf = Performative::NotUnderstood;
        let err = rsp.into_value(&req).unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Remote(RemoteError::Refused {
                perf: Performative::NotUnderstood
            })
        ));
    }

    #[test]
    fn test_null_inform_is_not_found() {
        let req = ParameterRequest::get(&phy(), "x", ParamIndex::Whole);
        let err = ParameterResponse::inform(&req, ParamValue::Null)
            .into_value(&req)
            .unwrap_err();
        assert!(matches!(err, GatewayError::Remote(RemoteError::NotFound { .. })));
    }

    #[test]
    fn test_readonly_only_rejects_sets() {
        let get = ParameterRequest::get(&phy(), "roIntParam", ParamIndex::Whole);
        let mut rsp = ParameterResponse::inform(&get, ParamValue::Long(42));
        rsp.readonly = vec!["roIntParam".into()];
        assert_eq!(rsp.clone().into_value(&get).expect("get"), ParamValue::Long(42));

        let set = ParameterRequest::set(&phy(), "roIntParam", ParamIndex::Whole, ParamValue::Int(1));
        let err = rsp.into_value(&set).unwrap_err();
        assert!(matches!(err, GatewayError::Remote(RemoteError::ReadOnly { .. })));
    }
}
