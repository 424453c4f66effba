// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed parameter access on a [`Gateway`].

use super::convert::{FromParam, IntoParam};
use super::marshal::marshal_into;
use super::request::{ParameterRequest, ParameterResponse};
use super::value::{ParamIndex, ParamValue};
use crate::agent::AgentId;
use crate::error::{GatewayError, RemoteError, Result};
use crate::gateway::Gateway;
use log::debug;

impl Gateway {
    /// Read a parameter without converting it.
    pub async fn get_param_value(
        &self,
        agent: &AgentId,
        param: &str,
        index: ParamIndex,
    ) -> Result<ParamValue> {
        self.param_request(ParameterRequest::get(agent, param, index))
            .await
    }

    /// Write a parameter and return the value the agent echoed.
    pub async fn set_param_value(
        &self,
        agent: &AgentId,
        param: &str,
        index: ParamIndex,
        value: ParamValue,
    ) -> Result<ParamValue> {
        self.param_request(ParameterRequest::set(agent, param, index, value))
            .await
    }

    async fn param_request(&self, request: ParameterRequest) -> Result<ParamValue> {
        let msg = request.to_message();
        debug!(
            "{} {}.{}[{}] ({})",
            if request.is_set() { "set" } else { "get" },
            request.agent,
            request.param,
            request.index.as_raw(),
            msg.id()
        );
        let reply = self
            .request(&request.agent, msg, self.request_timeout())
            .await?;
        ParameterResponse::from_message(&reply)?.into_value(&request)
    }

    /// Read a parameter as `T`.
    pub async fn get_param<T: FromParam>(
        &self,
        agent: &AgentId,
        param: &str,
        index: ParamIndex,
    ) -> Result<T> {
        let value = self.get_param_value(agent, param, index).await?;
        T::from_param(value).map_err(|found| GatewayError::TypeMismatch {
            expected: T::TYPE,
            found: found.type_name(),
        })
    }

    /// Read a parameter as `T`, falling back to `default` on any failure.
    pub async fn get_param_or<T: FromParam>(
        &self,
        agent: &AgentId,
        param: &str,
        index: ParamIndex,
        default: T,
    ) -> T {
        match self.get_param(agent, param, index).await {
            Ok(value) => value,
            Err(e) => {
                debug!("get {}.{} failed, using default: {}", agent, param, e);
                default
            }
        }
    }

    /// Write a parameter.
    ///
    /// Succeeds only when the agent echoes back exactly `value`.
    pub async fn set_param<T>(
        &self,
        agent: &AgentId,
        param: &str,
        index: ParamIndex,
        value: T,
    ) -> Result<T>
    where
        T: IntoParam + FromParam + PartialEq + Clone,
    {
        let echoed = self
            .set_param_value(agent, param, index, value.clone().into_param())
            .await?;
        let echoed = T::from_param(echoed).map_err(|found| RemoteError::TypeMismatch {
            param: param.to_string(),
            found: found.type_name(),
        })?;
        if echoed == value {
            Ok(echoed)
        } else {
            Err(RemoteError::Rejected {
                param: param.to_string(),
            }
            .into())
        }
    }

    /// Read an array parameter into `buf`.
    ///
    /// Returns how many elements were copied, which is less than the remote
    /// length when `buf` is too short.
    pub async fn get_param_into<T>(
        &self,
        agent: &AgentId,
        param: &str,
        index: ParamIndex,
        buf: &mut [T],
    ) -> Result<usize>
    where
        Vec<T>: FromParam,
    {
        let values: Vec<T> = self.get_param(agent, param, index).await?;
        Ok(marshal_into(values, buf, |v| v))
    }
}
