use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(err) = lotus_booking::run().await {
        error!("Booking service exited with error: {}", err);
        std::process::exit(1);
    }
}
