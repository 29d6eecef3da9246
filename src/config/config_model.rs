use chrono::FixedOffset;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub server: Server,
    pub database: Database,
    pub scheduler: Scheduler,
    pub booking: BookingPolicy,
    pub chat_push: ChatPush,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

/// Shared secret compared against the bearer token of cron-triggered job routes.
#[derive(Debug, Clone)]
pub struct Scheduler {
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct BookingPolicy {
    pub slip_retention_days: i64,
    pub review_point_bonus: i64,
    pub cleanup_batch_size: usize,
    pub timezone_offset_hours: i32,
}

impl BookingPolicy {
    /// Fixed reference timezone used for end-of-day payment deadlines.
    pub fn reference_timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.timezone_offset_hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"))
    }
}

#[derive(Debug, Clone)]
pub struct ChatPush {
    pub push_url: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AdminSecret {
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct CustomerSecret {
    pub secret: String,
}
