use anyhow::{Ok, Result};

use super::config_model::{AdminSecret, CustomerSecret, DotEnvyConfig};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = super::config_model::Server {
        port: std::env::var("SERVER_PORT")
            .expect("SERVER_PORT is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

    let database = super::config_model::Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let scheduler = super::config_model::Scheduler {
        secret: std::env::var("SCHEDULER_SECRET").expect("SCHEDULER_SECRET is invalid"),
    };

    let booking = super::config_model::BookingPolicy {
        slip_retention_days: std::env::var("SLIP_RETENTION_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()?,
        review_point_bonus: std::env::var("REVIEW_POINT_BONUS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()?,
        cleanup_batch_size: std::env::var("CLEANUP_BATCH_SIZE")
            .unwrap_or_else(|_| "200".to_string())
            .parse()?,
        timezone_offset_hours: std::env::var("TIMEZONE_OFFSET_HOURS")
            .unwrap_or_else(|_| "7".to_string())
            .parse()?,
    };

    let chat_push = super::config_model::ChatPush {
        push_url: std::env::var("CHAT_PUSH_URL").ok(),
        access_token: std::env::var("CHAT_PUSH_TOKEN").ok(),
    };

    Ok(DotEnvyConfig {
        server,
        database,
        scheduler,
        booking,
        chat_push,
    })
}

pub fn get_admin_secret() -> Result<AdminSecret> {
    dotenvy::dotenv().ok();

    Ok(AdminSecret {
        secret: std::env::var("JWT_ADMIN_SECRET").expect("JWT_ADMIN_SECRET is invalid"),
    })
}

pub fn get_customer_secret() -> Result<CustomerSecret> {
    dotenvy::dotenv().ok();

    Ok(CustomerSecret {
        secret: std::env::var("JWT_CUSTOMER_SECRET").expect("JWT_CUSTOMER_SECRET is invalid"),
    })
}
