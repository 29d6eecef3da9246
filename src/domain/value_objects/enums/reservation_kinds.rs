use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReservationKind {
    Room,
    Service,
}

impl ReservationKind {
    pub fn from_str(value: &str) -> Option<ReservationKind> {
        match value {
            "room" => Some(ReservationKind::Room),
            "service" => Some(ReservationKind::Service),
            _ => None,
        }
    }
}

impl Display for ReservationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            ReservationKind::Room => "room",
            ReservationKind::Service => "service",
        };
        write!(f, "{}", kind)
    }
}
