// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live socket connection tracking.
//!
//! The gateway only talks to [`ConnectionRegistry`], so a shared registry
//! can replace the in-process map when the service runs on several nodes.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;

/// One authenticated socket connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    pub id: String,
    pub user_id: String,
    pub connected_at: String,
}

/// Registry of live connections.
#[async_trait]
pub trait ConnectionRegistry: Send + Sync + 'static {
    async fn register(&self, info: ConnectionInfo);

    /// Removes a connection; unknown ids are ignored.
    async fn unregister(&self, connection_id: &str);

    async fn list_by_user(&self, user_id: &str) -> Vec<ConnectionInfo>;
}

/// Registry held in process memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryConnectionRegistry {
    connections: Arc<DashMap<String, ConnectionInfo>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn register(&self, info: ConnectionInfo) {
        self.connections.insert(info.id.clone(), info);
    }

    async fn unregister(&self, connection_id: &str) {
        self.connections.remove(connection_id);
    }

    async fn list_by_user(&self, user_id: &str) -> Vec<ConnectionInfo> {
        let mut list: Vec<ConnectionInfo> = self
            .connections
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        list.sort_by(|a, b| a.connected_at.cmp(&b.connected_at));
        list
    }
}
