pub mod admins;
pub mod loyalty;
pub mod payment_slips;
pub mod reservations;
