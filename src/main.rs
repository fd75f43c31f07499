// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, database, external clients, and start the
// HTTP server

mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod services;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use dotenv::dotenv;
use services::{
    AuthClient, CompetitionService, SessionTracker, StorageClient, StoryClient, TripService,
    VideoClient,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
    }

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            &config.log_level
        } else {
            "info,actix_web=info,sqlx=warn"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    log::info!("Starting vivid-trails service...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Initialize database connection pool
    let pool = match config::init_db_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    // 5. Build shared external clients and services
    let storage = || StorageClient::new(config.storage_api_url.clone(), config.storage_bucket.clone());
    let trip_service = TripService::new(
        StoryClient::new(config.story_api_key.clone(), config.story_api_url.clone()),
        storage(),
        VideoClient::new(
            config.video_api_key.clone(),
            config.video_api_url.clone(),
            Duration::from_secs(config.video_poll_interval_secs),
            config.video_poll_max_attempts,
        ),
        config.cluster_radius_km,
    );
    let competition_service = CompetitionService::new(storage());
    let auth_client = AuthClient::new(config.auth_api_url.clone());
    let session_tracker = Arc::new(SessionTracker::new());

    let trip_service = web::Data::new(trip_service);
    let competition_service = web::Data::new(competition_service);
    let auth_client = web::Data::new(auth_client);

    // 6. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let config_clone = config.clone();

    HttpServer::new(move || {
        App::new()
            // Application state (database pool, config, shared services)
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config_clone.clone()))
            .app_data(trip_service.clone())
            .app_data(competition_service.clone())
            .app_data(auth_client.clone())
            .app_data(web::Data::new(session_tracker.clone()))
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::auth_config)
            .configure(handlers::trips_config)
            .configure(handlers::competitions_config)
            .configure(handlers::profiles_config)
    })
    .bind(&server_addr)?
    .run()
    .await
}
