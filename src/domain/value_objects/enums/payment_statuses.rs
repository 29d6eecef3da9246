use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    PendingVerification,
    Paid,
}

impl PaymentStatus {
    pub fn from_str(value: &str) -> Option<PaymentStatus> {
        match value {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "pending_verification" => Some(PaymentStatus::PendingVerification),
            "paid" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::PendingVerification => "pending_verification",
            PaymentStatus::Paid => "paid",
        };
        write!(f, "{}", status)
    }
}
