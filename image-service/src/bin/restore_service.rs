//! Restore Service - synchronous function returning backed-up originals
//!
//! Request/response unit the front end invokes: `POST /invoke` with
//! `{"file_name": ...}` answers `{"statusCode": 200, "image_bytes": ...}`
//! or `{"statusCode": <other>, "message": ...}`. The invocation itself
//! always answers HTTP 200; the payload's statusCode carries the outcome.

use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use image_service::handlers;
use image_service::models::RestoreRequest;
use image_service::services::RestoreService;
use image_service::storage::{s3, ObjectStorage, S3Storage};
use image_service::Config;
use std::io;
use std::sync::Arc;

async fn invoke(
    service: web::Data<Arc<RestoreService>>,
    request: web::Json<RestoreRequest>,
) -> HttpResponse {
    let response = service.restore(&request.file_name).await;
    HttpResponse::Ok().json(response)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load configuration from environment
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load configuration");

    let bind_address = format!("{}:{}", config.restore.host, config.restore.port);

    let s3_client = s3::build_client(&config.s3)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("{e}")))?;
    let storage: Arc<dyn ObjectStorage> = Arc::new(S3Storage::new(s3_client));
    let service = Arc::new(RestoreService::new(storage, config.buckets.backup.clone()));

    tracing::info!(
        bind_address = %bind_address,
        backup_bucket = %config.buckets.backup,
        "Restore service starting"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(service.clone()))
            .wrap(middleware::Logger::default())
            .route("/invoke", web::post().to(invoke))
            .route("/api/v1/health", web::get().to(handlers::health))
    })
    .bind(&bind_address)?
    .run()
    .await
}
