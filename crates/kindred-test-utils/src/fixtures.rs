// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for turns, records, and hits used across tests.

use kindred_core::types::{ConversationTurn, FactRecord, HitFields, IndexHit, Role};

pub const FIXED_TIMESTAMP: &str = "2025-01-01T00:00:00.000Z";

pub fn turn(id: &str, role: Role, content: &str) -> ConversationTurn {
    ConversationTurn {
        id: id.to_string(),
        role,
        content: content.to_string(),
        attachment_description: None,
    }
}

/// `n` alternating user/assistant turns with ids `turn-0..turn-{n-1}`.
pub fn window(n: usize) -> Vec<ConversationTurn> {
    (0..n)
        .map(|i| {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            turn(&format!("turn-{i}"), role, &format!("message {i}"))
        })
        .collect()
}

pub fn record(id: &str, text: &str) -> FactRecord {
    FactRecord {
        id: id.to_string(),
        text: text.to_string(),
        timestamp: FIXED_TIMESTAMP.to_string(),
    }
}

pub fn hit(id: &str, score: f32, text: &str) -> IndexHit {
    IndexHit {
        id: id.to_string(),
        score,
        fields: HitFields {
            text: text.to_string(),
            timestamp: FIXED_TIMESTAMP.to_string(),
        },
    }
}
