use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    Admin,
    Customer,
    System,
}

impl ActorType {
    pub fn from_str(value: &str) -> Option<ActorType> {
        match value {
            "admin" => Some(ActorType::Admin),
            "customer" => Some(ActorType::Customer),
            "system" => Some(ActorType::System),
            _ => None,
        }
    }
}

impl Display for ActorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let actor = match self {
            ActorType::Admin => "admin",
            ActorType::Customer => "customer",
            ActorType::System => "system",
        };
        write!(f, "{}", actor)
    }
}

/// Who performed a mutating action on a reservation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub actor_type: ActorType,
    pub id: Option<String>,
}

impl Actor {
    pub fn system() -> Self {
        Self {
            actor_type: ActorType::System,
            id: None,
        }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            actor_type: ActorType::Admin,
            id: Some(id.into()),
        }
    }

    pub fn customer(id: impl Into<String>) -> Self {
        Self {
            actor_type: ActorType::Customer,
            id: Some(id.into()),
        }
    }
}
