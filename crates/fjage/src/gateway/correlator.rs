// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Request/reply correlation.
//!
//! Each outstanding request owns a oneshot receiver; the background dispatcher
//! resolves it by correlation id, whatever order replies arrive in.

use crate::error::{GatewayError, Result};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

type Table<T> = DashMap<String, oneshot::Sender<Result<T>>>;

/// Pending requests: correlation id -> reply channel
pub struct Correlator<T> {
    pending: Arc<Table<T>>,
}

impl<T> Clone for Correlator<T> {
    fn clone(&self) -> Self {
        Self {
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<T> Default for Correlator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Correlator<T> {
    pub fn new() -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
        }
    }

    /// Register `id` before the request goes out.
    pub fn register(&self, id: impl Into<String>) -> PendingRequest<T> {
        let id = id.into();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id.clone(), tx);
        PendingRequest {
            id,
            rx,
            pending: Arc::clone(&self.pending),
        }
    }

    /// Hand `value` to the request waiting on `id`.
    ///
    /// Gives `value` back when nobody waits for it (unknown, timed out or
    /// already answered).
    pub fn try_resolve(&self, id: &str, value: T) -> std::result::Result<(), T> {
        match self.pending.remove(id) {
            Some((_, tx)) => match tx.send(Ok(value)) {
                Err(Ok(value)) => Err(value),
                Ok(()) | Err(Err(_)) => Ok(()),
            },
            None => Err(value),
        }
    }

    /// Fail every pending request with the error built by `make`.
    pub fn fail_all<F>(&self, make: F)
    where
        F: Fn() -> GatewayError,
    {
        let ids: Vec<String> = self.pending.iter().map(|e| e.key().clone()).collect();
        for id in ids {
            if let Some((_, tx)) = self.pending.remove(&id) {
                let _ = tx.send(Err(make()));
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// One outstanding request. Dropping it discards the correlation entry.
pub struct PendingRequest<T> {
    id: String,
    rx: oneshot::Receiver<Result<T>>,
    pending: Arc<Table<T>>,
}

impl<T> PendingRequest<T> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wait for the reply, at most `timeout`.
    pub async fn wait(mut self, timeout: Duration) -> Result<T> {
        match tokio::time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(GatewayError::Closed),
            Err(_) => Err(GatewayError::Timeout),
        }
    }
}

impl<T> Drop for PendingRequest<T> {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}
