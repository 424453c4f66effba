// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # fjage
//!
//! Gateway to [fjåge](https://github.com/org-arl/fjage) agent containers.
//!
//! A [`Gateway`] connects to a master container over TCP, joins it as an
//! agent, and offers:
//! - typed remote parameter access ([`Gateway::get_param`], [`Gateway::set_param`])
//! - request/reply messaging and topic subscriptions
//! - container queries (agents, services)
//! - remote shell commands and file transfer ([`shell`])
//!
//! Requests are correlated by id in a concurrent table serviced by a
//! background task, so any number of callers can share one gateway and a slow
//! or missing reply only ever affects its own caller.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fjage::{AgentId, Gateway, ParamIndex};
//!
//! # async fn example() -> fjage::Result<()> {
//! let gw = Gateway::tcp("localhost", 1100).await?;
//! let node = AgentId::new("node");
//!
//! gw.set_param(&node, "address", ParamIndex::Whole, 31i32).await?;
//! let addr: i32 = gw.get_param(&node, "address", ParamIndex::Whole).await?;
//! let names: Vec<String> = gw.get_param_or(&node, "names", ParamIndex::Whole, Vec::new()).await;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod gateway;
pub mod message;
pub mod param;
pub mod protocol;
pub mod shell;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use agent::AgentId;
pub use config::{ConfigError, GatewayConfig};
pub use error::{CodecError, ErrorCode, GatewayError, RemoteError, Result};
pub use gateway::{Gateway, MessageFilter};
pub use message::{Message, Performative};
pub use param::{FromParam, IntoParam, ParamIndex, ParamType, ParamValue, ScalarKind};
pub use protocol::{Connector, StreamConnector, TcpConnector};
pub use shell::{GetFileRsp, SHELL_SERVICE};
