// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Agent identifiers.
//!
//! An [`AgentId`] names either an agent (`phy`) or a topic (`#phy__ntf`).

use serde::{Deserialize, Serialize};
use std::fmt;

const TOPIC_PREFIX: char = '#';
const NOTIFICATION_SUFFIX: &str = "__ntf";

/// Name of an agent or topic in a fjåge container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Topic identifier `#name`.
    pub fn topic(name: &str) -> Self {
        if name.starts_with(TOPIC_PREFIX) {
            Self(name.to_string())
        } else {
            Self(format!("{TOPIC_PREFIX}{name}"))
        }
    }

    pub fn is_topic(&self) -> bool {
        self.0.starts_with(TOPIC_PREFIX)
    }

    /// Topic on which this agent publishes its notifications (`#name__ntf`).
    pub fn notification_topic(&self) -> Self {
        let name = self.0.trim_start_matches(TOPIC_PREFIX);
        Self(format!("{TOPIC_PREFIX}{name}{NOTIFICATION_SUFFIX}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for AgentId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for AgentId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}
