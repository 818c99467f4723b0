//! Pending action entities

use crate::core::error::DomainError;
use crate::core::ids::{ActionId, ConversationId};
use crate::tool::entities::{ToolArguments, ToolCall};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default lifetime of a pending action.
pub const DEFAULT_PENDING_TTL_MINUTES: i64 = 10;

/// Lifecycle status of a [`PendingAction`].
///
/// ```text
/// PENDING ──approve──▶ APPROVED
///    │ ──reject───▶ REJECTED
///    └──ttl──────▶ EXPIRED
/// ```
///
/// All three non-pending states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Pending => "PENDING",
            ActionStatus::Approved => "APPROVED",
            ActionStatus::Rejected => "REJECTED",
            ActionStatus::Expired => "EXPIRED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ActionStatus::Pending)
    }

    /// Check that `self → next` is a legal transition.
    pub fn transition_to(self, next: ActionStatus) -> Result<ActionStatus, DomainError> {
        if self == ActionStatus::Pending && next.is_terminal() {
            Ok(next)
        } else {
            Err(DomainError::IllegalTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(ActionStatus::Pending),
            "APPROVED" => Ok(ActionStatus::Approved),
            "REJECTED" => Ok(ActionStatus::Rejected),
            "EXPIRED" => Ok(ActionStatus::Expired),
            _ => Err(DomainError::InvalidActionStatus(s.to_string())),
        }
    }
}

/// A side-effecting tool call waiting for the user's decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAction {
    pub id: ActionId,
    pub conversation_id: ConversationId,
    pub tool_name: String,
    /// Raw arguments; always what gets executed.
    pub tool_args: ToolArguments,
    /// Human-readable arguments shown to the user. Never executed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_args: Option<ToolArguments>,
    /// Correlation id of the originating tool call.
    pub tool_call_id: String,
    pub status: ActionStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl PendingAction {
    /// Create a `PENDING` action for `call`, expiring `ttl` after `now`.
    pub fn from_call(
        conversation_id: ConversationId,
        call: &ToolCall,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: ActionId::generate(),
            conversation_id,
            tool_name: call.name.clone(),
            tool_args: call.arguments.clone(),
            display_args: None,
            tool_call_id: call.id.clone(),
            status: ActionStatus::Pending,
            created_at: now,
            expires_at: now + ttl,
            resolved_at: None,
        }
    }

    pub fn with_display_args(mut self, display_args: ToolArguments) -> Self {
        self.display_args = Some(display_args);
        self
    }

    /// Strictly past `expires_at`; the expiry instant itself is still live.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// `PENDING` and not past its expiry.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.status == ActionStatus::Pending && !self.is_expired_at(now)
    }

    /// Move to a terminal status, stamping the resolution time.
    pub fn resolve(&mut self, status: ActionStatus, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.status = self.status.transition_to(status)?;
        self.resolved_at = Some(now);
        Ok(())
    }
}
