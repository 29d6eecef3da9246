use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    #[default]
    Pending,
    AwaitingConfirmation,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Blocked,
}

impl ReservationStatus {
    /// Statuses that occupy a resource/interval exclusively.
    pub const ACTIVE: [ReservationStatus; 5] = [
        ReservationStatus::Pending,
        ReservationStatus::AwaitingConfirmation,
        ReservationStatus::Confirmed,
        ReservationStatus::InProgress,
        ReservationStatus::Blocked,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Completed | ReservationStatus::Cancelled
        )
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn from_str(value: &str) -> Option<ReservationStatus> {
        match value {
            "pending" => Some(ReservationStatus::Pending),
            "awaiting_confirmation" => Some(ReservationStatus::AwaitingConfirmation),
            "confirmed" => Some(ReservationStatus::Confirmed),
            "in_progress" => Some(ReservationStatus::InProgress),
            "completed" => Some(ReservationStatus::Completed),
            "cancelled" => Some(ReservationStatus::Cancelled),
            "blocked" => Some(ReservationStatus::Blocked),
            _ => None,
        }
    }
}

impl Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::AwaitingConfirmation => "awaiting_confirmation",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::InProgress => "in_progress",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Blocked => "blocked",
        };
        write!(f, "{}", status)
    }
}
