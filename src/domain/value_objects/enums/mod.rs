pub mod actor_types;
pub mod payment_statuses;
pub mod reservation_kinds;
pub mod reservation_statuses;
