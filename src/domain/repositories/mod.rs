pub mod admins;
pub mod loyalty;
pub mod notification;
pub mod payment_slips;
pub mod reservations;
