//! Chat message types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::PrincipalId;

/// Longest accepted chat message, in characters
pub const MAX_MESSAGE_LEN: usize = 500;

/// A relayed chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message identifier
    pub id: Uuid,
    /// Author
    pub principal_id: PrincipalId,
    /// Author's username at post time
    pub username: String,
    /// Message body
    pub text: String,
    /// When the message was posted
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Build a message from trimmed text
    pub fn new(principal_id: PrincipalId, username: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            principal_id,
            username: username.into(),
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}
