// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Queue of unsolicited messages awaiting `Gateway::receive`.

use crate::error::{GatewayError, Result};
use crate::message::Message;
use log::warn;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Messages kept before the oldest ones are dropped.
pub const INBOX_CAPACITY: usize = 1024;

/// Selects which queued message `receive` returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MessageFilter {
    #[default]
    Any,
    /// Messages whose `clazz` is one of these.
    Classes(Vec<String>),
    /// The reply to a given `msgID`.
    InReplyTo(String),
}

impl MessageFilter {
    pub fn class(clazz: impl Into<String>) -> Self {
        Self::Classes(vec![clazz.into()])
    }

    pub fn matches(&self, msg: &Message) -> bool {
        match self {
            Self::Any => true,
            Self::Classes(classes) => classes.iter().any(|c| *c == msg.clazz),
            Self::InReplyTo(id) => msg.in_reply_to() == Some(id.as_str()),
        }
    }
}

pub struct Inbox {
    queue: Mutex<VecDeque<Message>>,
    notify: Notify,
    closed: AtomicBool,
    capacity: usize,
}

impl Inbox {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            capacity,
        }
    }

    pub fn push(&self, msg: Message) {
        {
            let mut queue = self.queue.lock();
            if queue.len() >= self.capacity {
                if let Some(dropped) = queue.pop_front() {
                    warn!("Inbox full, dropping message {}", dropped.id());
                }
            }
            queue.push_back(msg);
        }
        self.notify.notify_waiters();
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Wake every waiter and refuse further waits.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    fn take(&self, filter: &MessageFilter) -> Option<Message> {
        let mut queue = self.queue.lock();
        let pos = queue.iter().position(|m| filter.matches(m))?;
        queue.remove(pos)
    }

    /// Oldest message matching `filter`, waiting at most `timeout`.
    ///
    /// `Ok(None)` when nothing matched in time. Messages already queued are
    /// still returned after the inbox is closed.
    pub async fn next(&self, filter: &MessageFilter, timeout: Duration) -> Result<Option<Message>> {
        let deadline = Instant::now() + timeout;
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(msg) = self.take(filter) {
                return Ok(Some(msg));
            }
            if self.closed.load(Ordering::Acquire) {
                return Err(GatewayError::Closed);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Performative, GENERIC_MESSAGE};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_filter_by_class_and_reply() {
        let inbox = Inbox::new(8);
        let ntf = Message::new("org.arl.unet.phy.RxFrameNtf", Performative::Inform);
        let mut reply = Message::generic(Performative::Agree);
        reply.data.in_reply_to = Some("req-1".into());
        inbox.push(ntf.clone());
        inbox.push(reply.clone());

        let got = inbox
            .next(&MessageFilter::InReplyTo("req-1".into()), Duration::from_millis(10))
            .await
            .expect("receive");
        assert_eq!(got, Some(reply));

        let got = inbox
            .next(&MessageFilter::class(GENERIC_MESSAGE), Duration::from_millis(10))
            .await
            .expect("receive");
        assert_eq!(got, None);

        let got = inbox
            .next(&MessageFilter::Any, Duration::from_millis(10))
            .await
            .expect("receive");
        assert_eq!(got, Some(ntf));
        assert!(inbox.is_empty());
    }

    #[tokio::test]
    async fn test_waiter_is_woken() {
        let inbox = Arc::new(Inbox::new(8));
        let waiter = {
            let inbox = Arc::clone(&inbox);
            tokio::spawn(async move { inbox.next(&MessageFilter::Any, Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        inbox.push(Message::generic(Performative::Inform));

        let got = waiter.await.expect("join").expect("receive");
        assert!(got.is_some());
    }

    #[tokio::test]
    async fn test_capacity_drops_oldest() {
        let inbox = Inbox::new(2);
        let first = Message::generic(Performative::Inform);
        inbox.push(first.clone());
        inbox.push(Message::generic(Performative::Inform));
        inbox.push(Message::generic(Performative::Inform));
        assert_eq!(inbox.len(), 2);

        let got = inbox
            .next(&MessageFilter::InReplyTo(String::new()), Duration::from_millis(1))
            .await
            .expect("receive");
        assert!(got.is_none());
        let oldest = inbox
            .next(&MessageFilter::Any, Duration::from_millis(1))
            .await
            .expect("receive");
        assert_ne!(oldest.map(|m| m.data.msg_id), Some(first.data.msg_id));
    }

    #[tokio::test]
    async fn test_closed_inbox() {
        let inbox = Inbox::new(2);
        inbox.close();
        let err = inbox
            .next(&MessageFilter::Any, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Closed));
    }
}
