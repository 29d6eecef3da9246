pub mod booking_interval;
pub mod enums;
pub mod loyalty;
pub mod payment_slips;
pub mod reservations;
