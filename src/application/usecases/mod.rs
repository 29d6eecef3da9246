pub mod admin_gate;
pub mod auto_cancel;
pub mod availability;
pub mod loyalty;
pub mod payment_slips;
pub mod reservations;
