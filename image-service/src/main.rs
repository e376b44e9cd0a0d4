/// Image Service - interactive front end
///
/// Serves the upload form and dispatches resize/restore submissions.
/// Uploads land in the input bucket with resize metadata attached; the
/// workers react to the storage change events from there.
use actix_web::{middleware, web, App, HttpServer};
use image_service::handlers;
use image_service::services::{HttpRestoreInvoker, RestoreInvoker};
use image_service::storage::{s3, ObjectStorage, S3Storage};
use image_service::Config;
use std::io;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load configuration from environment
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load configuration");

    let bind_address = format!("{}:{}", config.app.host, config.app.port);

    let s3_client = s3::build_client(&config.s3)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("{e}")))?;
    let storage: Arc<dyn ObjectStorage> = Arc::new(S3Storage::new(s3_client));

    let invoker: Arc<dyn RestoreInvoker> = Arc::new(
        HttpRestoreInvoker::new(&config.restore.invoke_url)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("{e}")))?,
    );

    tracing::info!(
        bind_address = %bind_address,
        input_bucket = %config.buckets.input,
        restore_url = %config.restore.invoke_url,
        "Image service front end starting"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(invoker.clone()))
            .wrap(middleware::Logger::default())
            .route("/", web::get().to(handlers::index))
            .route("/submit", web::post().to(handlers::submit))
            .route("/api/v1/health", web::get().to(handlers::health))
            .route("/api/v1/health/live", web::get().to(handlers::health))
            .route("/api/v1/health/ready", web::get().to(handlers::health))
    })
    .bind(&bind_address)?
    .run()
    .await
}
