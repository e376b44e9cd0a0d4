//! Front end handlers - the interactive resize/restore form
//!
//! A single form collects the action, optional target dimensions, and an
//! uploaded image. Resize submissions land in the input bucket with the
//! dimensions attached as object metadata (the workers take it from there);
//! restore submissions invoke the restore function synchronously and render
//! the returned bytes inline.

use std::collections::HashMap;
use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use base64::Engine;
use bytes::Bytes;
use futures::StreamExt;
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::keys;
use crate::models::UploadAction;
use crate::services::RestoreInvoker;
use crate::storage::ObjectStorage;

/// Dimension bounds enforced by the form; the workers trust whatever
/// metadata arrives and do not re-check.
const MIN_DIMENSION: u32 = 50;
const MAX_DIMENSION: u32 = 2000;
const DEFAULT_DIMENSION: u32 = 300;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Image Resize &amp; Restore System</title>
<style>
  body { font-family: sans-serif; max-width: 640px; margin: 2rem auto; }
  fieldset { margin-bottom: 1rem; }
  label { display: block; margin: 0.5rem 0; }
  button { padding: 0.5rem 1.5rem; }
</style>
<script>
  function updateMode() {
    var resize = document.querySelector('input[name="action"]:checked').value === 'resize';
    document.getElementById('resize-options').style.display = resize ? 'block' : 'none';
  }
  window.addEventListener('DOMContentLoaded', updateMode);
</script>
</head>
<body>
<h1>Image Resize &amp; Restore System</h1>
<form method="post" action="/submit" enctype="multipart/form-data">
  <fieldset>
    <legend>Select Action</legend>
    <label><input type="radio" name="action" value="resize" checked onchange="updateMode()"> Resize Image</label>
    <label><input type="radio" name="action" value="restore" onchange="updateMode()"> Get Original Image Back</label>
  </fieldset>
  <fieldset id="resize-options">
    <legend>Resize Options</legend>
    <label>Width (px)
      <input type="number" name="width" min="50" max="2000" step="50" value="300">
    </label>
    <label>Height (px)
      <input type="number" name="height" min="50" max="2000" step="50" value="300">
    </label>
  </fieldset>
  <label>Upload image
    <input type="file" name="image" accept=".jpg,.jpeg,.png" required>
  </label>
  <button type="submit">Submit</button>
</form>
</body>
</html>
"#;

/// Fields collected from one form submission.
#[derive(Default)]
struct SubmittedForm {
    action: Option<String>,
    width: Option<String>,
    height: Option<String>,
    file_name: Option<String>,
    file_content_type: Option<String>,
    file_bytes: Vec<u8>,
}

/// Serve the interactive form
pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

/// Liveness endpoint
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}

/// Handle a form submission, dispatching to the resize or restore flow
pub async fn submit(
    payload: Multipart,
    config: web::Data<Config>,
    storage: web::Data<Arc<dyn ObjectStorage>>,
    invoker: web::Data<Arc<dyn RestoreInvoker>>,
) -> Result<HttpResponse> {
    let form = read_form(payload).await?;

    let action = form
        .action
        .as_deref()
        .and_then(UploadAction::from_str)
        .ok_or_else(|| AppError::BadRequest("Unknown action".to_string()))?;

    let raw_name = form
        .file_name
        .clone()
        .ok_or_else(|| AppError::BadRequest("An image file is required".to_string()))?;
    let file_name = keys::normalize_filename(&raw_name);
    if file_name.is_empty() {
        return Err(AppError::BadRequest("Invalid file name".to_string()));
    }

    match action {
        UploadAction::Resize => {
            submit_resize(&form, &file_name, config.get_ref(), storage.get_ref()).await
        }
        UploadAction::Restore => submit_restore(&file_name, invoker.get_ref()).await,
    }
}

/// Resize flow: store the upload in the input bucket with its dimensions
/// attached as metadata. The resize worker picks it up from the storage
/// change event.
async fn submit_resize(
    form: &SubmittedForm,
    file_name: &str,
    config: &Config,
    storage: &Arc<dyn ObjectStorage>,
) -> Result<HttpResponse> {
    if form.file_bytes.is_empty() {
        return Err(AppError::BadRequest("Uploaded image is empty".to_string()));
    }

    let width = parse_form_dimension(form.width.as_deref(), "width")?;
    let height = parse_form_dimension(form.height.as_deref(), "height")?;

    let content_type = form
        .file_content_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let mut metadata = HashMap::new();
    metadata.insert("width".to_string(), width.to_string());
    metadata.insert("height".to_string(), height.to_string());
    metadata.insert("uploaded_at".to_string(), chrono::Utc::now().to_rfc3339());

    storage
        .put_object(
            &config.buckets.input,
            file_name,
            Bytes::from(form.file_bytes.clone()),
            &content_type,
            metadata,
        )
        .await?;

    info!(key = %file_name, width, height, "Upload stored for resizing");

    Ok(render_page(
        "Upload received",
        &format!(
            "<p class=\"success\">Image uploaded successfully.</p>\
             <p>Resizing to {} x {}px</p>\
             <p><a href=\"/\">Back</a></p>",
            width, height
        ),
    ))
}

/// Restore flow: invoke the restore function and render the returned bytes
/// inline, or the returned message as an error.
async fn submit_restore(
    file_name: &str,
    invoker: &Arc<dyn RestoreInvoker>,
) -> Result<HttpResponse> {
    let response = invoker.invoke(file_name).await?;

    if !response.is_ok() {
        let message = response
            .message
            .unwrap_or_else(|| "Restore failed".to_string());
        info!(file_name, status = response.status_code, "Restore rejected");
        return Ok(render_page(
            "Restore failed",
            &format!(
                "<p class=\"error\">{}</p><p><a href=\"/\">Back</a></p>",
                escape_html(&message)
            ),
        ));
    }

    let encoded = response
        .image_bytes
        .ok_or_else(|| AppError::Internal("Restore response missing image bytes".to_string()))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&encoded)
        .map_err(|e| AppError::Internal(format!("Invalid restore payload encoding: {e}")))?;
    let content_type = sniff_content_type(&bytes);

    info!(file_name, size = bytes.len(), "Original image restored");

    Ok(render_page(
        "Original Image Restored",
        &format!(
            "<img src=\"data:{};base64,{}\" alt=\"{}\" style=\"max-width:100%\">\
             <p>Original Image Restored</p>\
             <p><a href=\"/\">Back</a></p>",
            content_type,
            encoded,
            escape_html(file_name)
        ),
    ))
}

/// Collect the multipart fields of one submission into memory.
async fn read_form(mut payload: Multipart) -> Result<SubmittedForm> {
    let mut form = SubmittedForm::default();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?;

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "action" => form.action = Some(read_text_field(&mut field).await?),
            "width" => form.width = Some(read_text_field(&mut field).await?),
            "height" => form.height = Some(read_text_field(&mut field).await?),
            "image" => {
                form.file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(str::to_string);
                form.file_content_type = field.content_type().map(|mime| mime.to_string());

                while let Some(chunk) = field.next().await {
                    let data = chunk
                        .map_err(|e| AppError::BadRequest(format!("Upload read error: {e}")))?;
                    form.file_bytes.extend_from_slice(&data);
                }
            }
            _ => {
                // Drain unknown fields
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?;
                }
            }
        }
    }

    Ok(form)
}

async fn read_text_field(field: &mut actix_multipart::Field) -> Result<String> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let bytes = chunk.map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?;
        data.extend_from_slice(&bytes);
    }

    String::from_utf8(data)
        .map(|s| s.trim().to_string())
        .map_err(|_| AppError::BadRequest("Form field is not valid UTF-8".to_string()))
}

/// Parse a width/height form value, applying the form's [50, 2000] bounds.
fn parse_form_dimension(raw: Option<&str>, name: &str) -> Result<u32> {
    let value = match raw {
        Some(v) if !v.is_empty() => v
            .parse::<u32>()
            .map_err(|_| AppError::ValidationError(format!("Invalid {name}: {v}")))?,
        _ => DEFAULT_DIMENSION,
    };

    if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
        return Err(AppError::ValidationError(format!(
            "{name} must be between {MIN_DIMENSION} and {MAX_DIMENSION}"
        )));
    }

    Ok(value)
}

fn sniff_content_type(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png) => "image/png",
        Ok(image::ImageFormat::Jpeg) => "image/jpeg",
        _ => "application/octet-stream",
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_page(title: &str, body: &str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(format!(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n\
             <body>\n{}\n</body>\n</html>\n",
            escape_html(title),
            body
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RestoreResponse;
    use crate::storage::InMemoryStorage;
    use actix_web::{test, App};
    use async_trait::async_trait;

    const BOUNDARY: &str = "----image-service-test-boundary";

    /// Invoker double returning a canned response.
    struct StubInvoker {
        response: RestoreResponse,
    }

    #[async_trait]
    impl RestoreInvoker for StubInvoker {
        async fn invoke(&self, _file_name: &str) -> Result<RestoreResponse> {
            Ok(self.response.clone())
        }
    }

    fn test_config() -> Config {
        // Env-independent equivalent of Config::from_env defaults.
        Config {
            app: crate::config::AppConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                env: "test".to_string(),
            },
            buckets: crate::config::BucketsConfig {
                input: "input".to_string(),
                backup: "backup".to_string(),
                result: "result".to_string(),
            },
            s3: crate::config::S3Config {
                region: "us-east-1".to_string(),
                access_key_id: None,
                secret_access_key: None,
                endpoint: None,
            },
            kafka: crate::config::KafkaConfig {
                brokers: "localhost:9092".to_string(),
                storage_events_topic: "storage.events".to_string(),
                notifications_topic: "image.notifications".to_string(),
                group_id: "image-service".to_string(),
            },
            restore: crate::config::RestoreConfig {
                host: "127.0.0.1".to_string(),
                port: 8089,
                invoke_url: "http://127.0.0.1:8089/invoke".to_string(),
            },
            processing: crate::config::ProcessingConfig {
                default_width: 300,
                default_height: 300,
                jpeg_quality: 75,
                thumbnail_max_dimension: 300,
            },
        }
    }

    fn text_part(body: &mut Vec<u8>, name: &str, value: &str) {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }

    fn file_part(body: &mut Vec<u8>, filename: &str, content_type: &str, bytes: &[u8]) {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; \
                 filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    fn close_body(body: &mut Vec<u8>) {
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    }

    async fn call_submit(
        storage: Arc<InMemoryStorage>,
        invoker: Arc<dyn RestoreInvoker>,
        body: Vec<u8>,
    ) -> (actix_web::http::StatusCode, String) {
        let storage_dyn: Arc<dyn ObjectStorage> = storage;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_config()))
                .app_data(web::Data::new(storage_dyn))
                .app_data(web::Data::new(invoker))
                .route("/submit", web::post().to(submit)),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/submit")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(body)
            .to_request();

        let response = test::call_service(&app, request).await;
        let status = response.status();
        let body = test::read_body(response).await;
        (status, String::from_utf8_lossy(&body).to_string())
    }

    fn noop_invoker() -> Arc<dyn RestoreInvoker> {
        Arc::new(StubInvoker {
            response: RestoreResponse::error(500, "unused"),
        })
    }

    #[actix_web::test]
    async fn test_resize_submit_stores_normalized_key_with_metadata() {
        let storage = Arc::new(InMemoryStorage::new());

        let mut body = Vec::new();
        text_part(&mut body, "action", "resize");
        text_part(&mut body, "width", "500");
        text_part(&mut body, "height", "200");
        file_part(&mut body, "cat (1).png", "image/png", b"fake-png-bytes");
        close_body(&mut body);

        let (status, page) = call_submit(storage.clone(), noop_invoker(), body).await;

        assert!(status.is_success());
        assert!(page.contains("Image uploaded successfully."));
        assert!(page.contains("Resizing to 500 x 200px"));

        let object = storage.get_object("input", "cat.png").await.unwrap();
        assert_eq!(object.bytes.as_ref(), b"fake-png-bytes");
        assert_eq!(object.content_type.as_deref(), Some("image/png"));
        assert_eq!(object.metadata.get("width").map(String::as_str), Some("500"));
        assert_eq!(object.metadata.get("height").map(String::as_str), Some("200"));
    }

    #[actix_web::test]
    async fn test_resize_submit_defaults_missing_dimensions() {
        let storage = Arc::new(InMemoryStorage::new());

        let mut body = Vec::new();
        text_part(&mut body, "action", "resize");
        file_part(&mut body, "dog.jpg", "image/jpeg", b"fake-jpeg");
        close_body(&mut body);

        let (status, _page) = call_submit(storage.clone(), noop_invoker(), body).await;

        assert!(status.is_success());
        let object = storage.get_object("input", "dog.jpg").await.unwrap();
        assert_eq!(object.metadata.get("width").map(String::as_str), Some("300"));
        assert_eq!(object.metadata.get("height").map(String::as_str), Some("300"));
    }

    #[actix_web::test]
    async fn test_resize_submit_rejects_out_of_range_dimensions() {
        let storage = Arc::new(InMemoryStorage::new());

        let mut body = Vec::new();
        text_part(&mut body, "action", "resize");
        text_part(&mut body, "width", "5000");
        file_part(&mut body, "cat.png", "image/png", b"fake");
        close_body(&mut body);

        let (status, _page) = call_submit(storage.clone(), noop_invoker(), body).await;

        assert_eq!(status, actix_web::http::StatusCode::BAD_REQUEST);
        assert!(storage.keys("input").is_empty());
    }

    #[actix_web::test]
    async fn test_restore_submit_renders_returned_image() {
        let storage = Arc::new(InMemoryStorage::new());
        let png = {
            use image::{DynamicImage, ImageOutputFormat, RgbImage};
            let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
            let mut buf = Vec::new();
            img.write_to(&mut std::io::Cursor::new(&mut buf), ImageOutputFormat::Png)
                .unwrap();
            buf
        };
        let encoded = base64::engine::general_purpose::STANDARD.encode(&png);
        let invoker: Arc<dyn RestoreInvoker> = Arc::new(StubInvoker {
            response: RestoreResponse::ok(encoded.clone()),
        });

        let mut body = Vec::new();
        text_part(&mut body, "action", "restore");
        file_part(&mut body, "cat.png", "image/png", b"");
        close_body(&mut body);

        let (status, page) = call_submit(storage, invoker, body).await;

        assert!(status.is_success());
        assert!(page.contains("Original Image Restored"));
        assert!(page.contains(&format!("data:image/png;base64,{encoded}")));
    }

    #[actix_web::test]
    async fn test_restore_submit_renders_failure_message() {
        let storage = Arc::new(InMemoryStorage::new());
        let invoker: Arc<dyn RestoreInvoker> = Arc::new(StubInvoker {
            response: RestoreResponse::error(404, "Original image not found: cat.png"),
        });

        let mut body = Vec::new();
        text_part(&mut body, "action", "restore");
        file_part(&mut body, "cat.png", "image/png", b"");
        close_body(&mut body);

        let (status, page) = call_submit(storage, invoker, body).await;

        assert!(status.is_success());
        assert!(page.contains("Original image not found: cat.png"));
        assert!(!page.contains("data:image"));
    }

    #[actix_web::test]
    async fn test_unknown_action_is_rejected() {
        let storage = Arc::new(InMemoryStorage::new());

        let mut body = Vec::new();
        text_part(&mut body, "action", "delete");
        file_part(&mut body, "cat.png", "image/png", b"fake");
        close_body(&mut body);

        let (status, _page) = call_submit(storage, noop_invoker(), body).await;
        assert_eq!(status, actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[::core::prelude::v1::test]
    fn test_parse_form_dimension_bounds() {
        assert_eq!(parse_form_dimension(None, "width").unwrap(), 300);
        assert_eq!(parse_form_dimension(Some(""), "width").unwrap(), 300);
        assert_eq!(parse_form_dimension(Some("50"), "width").unwrap(), 50);
        assert_eq!(parse_form_dimension(Some("2000"), "height").unwrap(), 2000);
        assert!(parse_form_dimension(Some("49"), "width").is_err());
        assert!(parse_form_dimension(Some("2050"), "height").is_err());
        assert!(parse_form_dimension(Some("wide"), "width").is_err());
    }

    #[::core::prelude::v1::test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<img src="x">&"#),
            "&lt;img src=&quot;x&quot;&gt;&amp;"
        );
    }
}
