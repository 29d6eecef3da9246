pub mod admins;
pub mod coupons;
pub mod customers;
pub mod payment_slips;
pub mod reservations;
pub mod rewards;
