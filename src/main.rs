use dotenv::dotenv;
use helpy::{api, config::Config};
use std::net::SocketAddr;
use std::str::FromStr;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Main entry point for the Helpy backend.
///
/// This function:
/// 1. Loads environment variables from .env file
/// 2. Loads the configuration (missing Supabase credentials abort startup)
/// 3. Creates and configures the API router
/// 4. Starts the HTTP server
#[tokio::main]
async fn main() {
    // Initialize the logging subscriber
    FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false)
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .pretty()
        .init();

    // Load environment variables from .env file
    dotenv().ok();

    info!("Starting Helpy backend");
    let config = Config::from_env().expect("SUPABASE_URL and SUPABASE_KEY must be set in env");

    // Create and configure the API router
    let app = api::create_router(&config);

    let addr = format!("{}:{}", config.host, config.port);
    let addr = SocketAddr::from_str(&addr).expect("Invalid address format");

    info!("Server listening on {}", addr);
    // Start the HTTP server
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .unwrap();
}
