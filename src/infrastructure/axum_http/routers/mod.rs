pub mod availability;
pub mod loyalty;
pub mod payment_slips;
pub mod reservations;
pub mod scheduled_jobs;
