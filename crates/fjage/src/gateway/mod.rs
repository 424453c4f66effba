// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Gateway to a fjåge master container.
//!
//! A [`Gateway`] joins the container as an agent of its own. A background
//! task reads every inbound frame and:
//! - resolves pending message requests on `inReplyTo`
//! - resolves pending container queries on `id`
//! - answers container queries addressed to the gateway
//! - queues any other message for [`Gateway::receive`]
//!
//! # Example
//!
//! ```rust,no_run
//! use fjage::{AgentId, Gateway, ParamIndex};
//!
//! # async fn example() -> fjage::Result<()> {
//! let gw = Gateway::tcp("localhost", 1100).await?;
//! let phy = AgentId::new("phy");
//! let mtu: i32 = gw.get_param(&phy, "MTU", ParamIndex::Whole).await?;
//! gw.close();
//! # Ok(())
//! # }
//! ```

mod correlator;
mod inbox;

pub use correlator::{Correlator, PendingRequest};
pub use inbox::{Inbox, MessageFilter, INBOX_CAPACITY};

use crate::agent::AgentId;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::message::Message;
use crate::protocol::{
    Connector, Frame, FrameReceiver, FrameSender, RequestFrame, ResponseFrame, TcpConnector,
};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Handle to a connected gateway. Cheap to clone; clones share the link.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<Inner>,
}

struct Inner {
    agent_id: AgentId,
    config: GatewayConfig,
    /// Taken on close, which lets the link writer shut the stream down
    sender: Mutex<Option<FrameSender>>,
    /// Message requests: msgID -> reply
    replies: Correlator<Message>,
    /// Container queries: frame id -> response
    queries: Correlator<ResponseFrame>,
    inbox: Inbox,
    subscriptions: Mutex<Vec<AgentId>>,
    closed: AtomicBool,
    receiver: Mutex<Option<JoinHandle<()>>>,
}

impl Gateway {
    /// Open a link with `connector` and join the container.
    pub async fn connect<C: Connector>(connector: &C, config: GatewayConfig) -> Result<Self> {
        config.validate()?;
        let (sender, frames) = connector.connect().await?;
        let agent_id = AgentId::new(format!("{}-{}", config.agent_id_prefix, Uuid::new_v4()));

        let inner = Arc::new(Inner {
            agent_id: agent_id.clone(),
            config,
            sender: Mutex::new(Some(sender)),
            replies: Correlator::new(),
            queries: Correlator::new(),
            inbox: Inbox::new(INBOX_CAPACITY),
            subscriptions: Mutex::new(vec![agent_id]),
            closed: AtomicBool::new(false),
            receiver: Mutex::new(None),
        });
        let task = tokio::spawn(receive_loop(Arc::downgrade(&inner), frames));
        *inner.receiver.lock() = Some(task);

        let gateway = Self { inner };
        gateway.send_frame(Frame::Alive(true))?;
        gateway.announce_subscriptions()?;
        info!("Gateway {} joined container", gateway.agent_id());
        Ok(gateway)
    }

    /// Connect over TCP with default settings.
    pub async fn tcp(hostname: &str, port: u16) -> Result<Self> {
        Self::from_config(GatewayConfig::new(hostname, port)).await
    }

    /// Connect over TCP to `config.hostname:config.port`.
    pub async fn from_config(config: GatewayConfig) -> Result<Self> {
        let connector = TcpConnector::new(config.hostname.clone(), config.port);
        Self::connect(&connector, config).await
    }

    /// This gateway's own AgentID.
    pub fn agent_id(&self) -> &AgentId {
        &self.inner.agent_id
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// Bound applied to parameter requests and container queries.
    pub fn request_timeout(&self) -> Duration {
        self.inner.config.request_timeout()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Stop the background task and fail everything still pending.
    pub fn close(&self) {
        // the link may already be gone, but the writer still holds the stream
        // until its sender is dropped
        let sender = self.inner.sender.lock().take();
        let task = self.inner.receiver.lock().take();
        if let Some(task) = &task {
            task.abort();
        }
        let already_closed = self.inner.closed.swap(true, Ordering::AcqRel);
        if sender.is_some() || task.is_some() {
            info!("Closing gateway {}", self.agent_id());
        }
        if !already_closed {
            self.inner.shutdown(|| GatewayError::Closed);
        }
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Receive messages sent to `topic`.
    pub fn subscribe(&self, topic: &AgentId) -> Result<()> {
        {
            let mut subs = self.inner.subscriptions.lock();
            if subs.contains(topic) {
                return Ok(());
            }
            subs.push(topic.clone());
        }
        self.announce_subscriptions()
    }

    pub fn unsubscribe(&self, topic: &AgentId) -> Result<()> {
        {
            let mut subs = self.inner.subscriptions.lock();
            let before = subs.len();
            subs.retain(|t| t != topic);
            if subs.len() == before {
                return Ok(());
            }
        }
        self.announce_subscriptions()
    }

    pub fn is_subscribed(&self, topic: &AgentId) -> bool {
        self.inner.subscriptions.lock().contains(topic)
    }

    /// Receive the notifications published by `agent`.
    pub fn subscribe_agent(&self, agent: &AgentId) -> Result<()> {
        self.subscribe(&agent.notification_topic())
    }

    pub fn unsubscribe_agent(&self, agent: &AgentId) -> Result<()> {
        self.unsubscribe(&agent.notification_topic())
    }

    fn announce_subscriptions(&self) -> Result<()> {
        let agent_ids = self
            .inner
            .subscriptions
            .lock()
            .iter()
            .map(|t| t.to_string())
            .collect();
        self.send_frame(Frame::Request(RequestFrame::WantsMessagesFor { agent_ids }))
    }

    // ========================================================================
    // Container queries
    // ========================================================================

    async fn query<F>(&self, build: F) -> Result<ResponseFrame>
    where
        F: FnOnce(String) -> RequestFrame,
    {
        let id = Uuid::new_v4().to_string();
        let pending = self.inner.queries.register(id.clone());
        self.send_frame(Frame::Request(build(id)))?;
        pending.wait(self.request_timeout()).await
    }

    /// AgentIDs of every agent in the container.
    pub async fn agents(&self) -> Result<Vec<AgentId>> {
        match self.query(|id| RequestFrame::Agents { id }).await? {
            ResponseFrame::Agents { agent_ids, .. } => {
                Ok(agent_ids.into_iter().map(AgentId::from).collect())
            }
            other => Err(unexpected_response(&other)),
        }
    }

    /// Services advertised in the container.
    pub async fn services(&self) -> Result<Vec<String>> {
        match self.query(|id| RequestFrame::Services { id }).await? {
            ResponseFrame::Services { services, .. } => Ok(services),
            other => Err(unexpected_response(&other)),
        }
    }

    pub async fn contains_agent(&self, agent: &AgentId) -> Result<bool> {
        let agent_id = agent.to_string();
        match self
            .query(|id| RequestFrame::ContainsAgent { id, agent_id })
            .await?
        {
            ResponseFrame::ContainsAgent { answer, .. } => Ok(answer),
            other => Err(unexpected_response(&other)),
        }
    }

    /// An agent providing `service`, if any.
    pub async fn agent_for_service(&self, service: &str) -> Result<Option<AgentId>> {
        let service = service.to_string();
        match self
            .query(|id| RequestFrame::AgentForService { id, service })
            .await?
        {
            ResponseFrame::AgentForService { agent_id, .. } => {
                Ok(agent_id.filter(|a| !a.is_empty()).map(AgentId::from))
            }
            other => Err(unexpected_response(&other)),
        }
    }

    /// Every agent providing `service`.
    pub async fn agents_for_service(&self, service: &str) -> Result<Vec<AgentId>> {
        let service = service.to_string();
        match self
            .query(|id| RequestFrame::AgentsForService { id, service })
            .await?
        {
            ResponseFrame::AgentsForService { agent_ids, .. } => {
                Ok(agent_ids.into_iter().map(AgentId::from).collect())
            }
            other => Err(unexpected_response(&other)),
        }
    }

    // ========================================================================
    // Messaging
    // ========================================================================

    /// Send `msg` to `to` without waiting for a reply.
    pub fn send(&self, to: &AgentId, mut msg: Message) -> Result<()> {
        msg.data.sender = self.inner.agent_id.to_string();
        msg.data.recipient = to.to_string();
        msg.data.sent_at = Some(now_millis());
        debug!("Sending {} ({}) to {}", msg.clazz, msg.id(), to);
        self.send_frame(Frame::Request(RequestFrame::Send {
            message: msg,
            relay: true,
        }))
    }

    /// Send `msg` to `to` and wait for the message that replies to it.
    pub async fn request(&self, to: &AgentId, msg: Message, timeout: Duration) -> Result<Message> {
        let pending = self.inner.replies.register(msg.id());
        self.send(to, msg)?;
        pending.wait(timeout).await
    }

    /// Next unsolicited message matching `filter`; `Ok(None)` after `timeout`.
    pub async fn receive(&self, filter: &MessageFilter, timeout: Duration) -> Result<Option<Message>> {
        self.inner.inbox.next(filter, timeout).await
    }

    fn send_frame(&self, frame: Frame) -> Result<()> {
        self.inner.send_frame(frame)
    }
}

impl Inner {
    fn send_frame(&self, frame: Frame) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(GatewayError::Closed);
        }
        match self.sender.lock().as_ref() {
            Some(sender) => sender
                .send(frame)
                .map_err(|_| GatewayError::Transport("link writer stopped".into())),
            None => Err(GatewayError::Closed),
        }
    }

    fn shutdown<F>(&self, make: F)
    where
        F: Fn() -> GatewayError,
    {
        self.replies.fail_all(&make);
        self.queries.fail_all(&make);
        self.inbox.close();
    }

    fn dispatch(&self, frame: Frame) {
        match frame {
            Frame::Alive(_) => {
                if let Err(e) = self.send_frame(Frame::Alive(true)) {
                    debug!("Cannot answer alive: {}", e);
                }
            }
            Frame::Response(response) => {
                let id = response.id().to_string();
                if self.queries.try_resolve(&id, response).is_err() {
                    warn!("Dropping unmatched response {}", id);
                }
            }
            Frame::Request(RequestFrame::Send { message, .. }) => self.deliver(message),
            Frame::Request(RequestFrame::WantsMessagesFor { .. }) => {}
            Frame::Request(query) => self.answer(query),
        }
    }

    fn deliver(&self, message: Message) {
        let message = match message.data.in_reply_to.clone() {
            Some(id) => match self.replies.try_resolve(&id, message) {
                Ok(()) => {
                    debug!("Resolved request {}", id);
                    return;
                }
                Err(message) => message,
            },
            None => message,
        };
        self.inbox.push(message);
    }

    /// Answer a container query addressed to this gateway.
    fn answer(&self, query: RequestFrame) {
        let response = match query {
            RequestFrame::Agents { id } => ResponseFrame::Agents {
                id,
                agent_ids: vec![self.agent_id.to_string()],
            },
            RequestFrame::ContainsAgent { id, agent_id } => ResponseFrame::ContainsAgent {
                id,
                answer: self.agent_id == *agent_id.as_str(),
            },
            RequestFrame::Services { id } => ResponseFrame::Services {
                id,
                services: Vec::new(),
            },
            RequestFrame::AgentForService { id, .. } => {
                ResponseFrame::AgentForService { id, agent_id: None }
            }
            RequestFrame::AgentsForService { id, .. } => ResponseFrame::AgentsForService {
                id,
                agent_ids: Vec::new(),
            },
            RequestFrame::Send { .. } | RequestFrame::WantsMessagesFor { .. } => return,
        };
        if let Err(e) = self.send_frame(Frame::Response(response)) {
            debug!("Cannot answer container query: {}", e);
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(task) = self.receiver.get_mut().take() {
            task.abort();
        }
    }
}

async fn receive_loop(inner: Weak<Inner>, mut frames: FrameReceiver) {
    while let Some(frame) = frames.recv().await {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        inner.dispatch(frame);
    }

    if let Some(inner) = inner.upgrade() {
        warn!("Gateway {}: connection lost", inner.agent_id);
        inner.closed.store(true, Ordering::Release);
        inner.shutdown(|| GatewayError::Transport("connection lost".into()));
    }
}

fn unexpected_response(response: &ResponseFrame) -> GatewayError {
    GatewayError::UnexpectedFrame(format!("mismatched response {response:?}"))
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests;
