// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-namespace mutual exclusion for consolidation runs.
//!
//! Two runs over the same namespace would query the index before either has
//! written, and both would store the same fact under different ids. The gate
//! lets at most one run per namespace proceed; other namespaces are unaffected.

use std::sync::Arc;

use dashmap::DashMap;
use kindred_core::Namespace;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Hands out one async lock per namespace.
#[derive(Debug, Clone, Default)]
pub struct NamespaceGate {
    locks: Arc<DashMap<Namespace, Arc<Mutex<()>>>>,
}

impl NamespaceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other holder owns `namespace`, then hold it until the guard drops.
    pub async fn acquire(&self, namespace: &Namespace) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(namespace.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drop locks nobody holds or waits on.
    pub fn release_idle(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Number of namespaces with a live lock entry.
    pub fn tracked(&self) -> usize {
        self.locks.len()
    }
}
