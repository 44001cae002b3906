//! Referral lifecycle states and priorities.
//!
//! The status machine is deliberately permissive: a referral may move from any
//! non-terminal status to any other status. The only gate is mutability —
//! `Completed` and `Cancelled` are terminal and reject every outbound
//! transition.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ReferralError, ReferralResult};
use crate::referral::Referral;
use chrono::{DateTime, Utc};

/// Lifecycle status of a referral.
///
/// This enum is deliberately *closed* so role and status handling stays
/// exhaustiveness-checked at compile time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl Status {
    /// Terminal statuses accept no further content changes.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Cancelled)
    }

    /// A referral still awaiting or undergoing attention.
    pub fn is_active(&self) -> bool {
        matches!(self, Status::Pending | Status::InProgress)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Status::Pending => "PENDING",
            Status::InProgress => "IN_PROGRESS",
            Status::Completed => "COMPLETED",
            Status::Cancelled => "CANCELLED",
        };
        write!(f, "{label}")
    }
}

impl std::str::FromStr for Status {
    type Err = ReferralError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "PENDING" => Ok(Status::Pending),
            "IN_PROGRESS" => Ok(Status::InProgress),
            "COMPLETED" => Ok(Status::Completed),
            "CANCELLED" => Ok(Status::Cancelled),
            other => Err(ReferralError::validation(
                "status",
                format!("unknown status {other:?}"),
            )),
        }
    }
}

/// Clinical priority of a referral.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// High and urgent referrals surface in the triage queue.
    pub fn is_urgent(&self) -> bool {
        matches!(self, Priority::High | Priority::Urgent)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Urgent => "URGENT",
        };
        write!(f, "{label}")
    }
}

impl std::str::FromStr for Priority {
    type Err = ReferralError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            "URGENT" => Ok(Priority::Urgent),
            other => Err(ReferralError::validation(
                "priority",
                format!("unknown priority {other:?}"),
            )),
        }
    }
}

impl Referral {
    /// Whether the referral still accepts content changes.
    pub fn is_mutable(&self) -> bool {
        !self.status().is_terminal()
    }

    /// Move the referral to `new_status`.
    ///
    /// The target status is not constrained to a transition graph; the gate is
    /// solely that the current status is non-terminal. On success the status
    /// is replaced and `updated_at` is stamped with `now`.
    ///
    /// # Errors
    ///
    /// Returns `ReferralError::NotModifiable` if the referral is in a terminal
    /// status.
    pub fn transition_to(&mut self, new_status: Status, now: DateTime<Utc>) -> ReferralResult<()> {
        if !self.is_mutable() {
            return Err(ReferralError::NotModifiable);
        }
        self.status = new_status;
        self.touch(now);
        Ok(())
    }
}
