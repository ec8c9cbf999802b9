use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    config::Config,
    error::{Result, StudioError},
    gateway::{GatewayClient, GenerationGateway},
    models::{parse_data_url, ErrorBody, GenerateImageRequest, GenerateImageResponse, ImageOutput},
    storage::{ArtifactStore, StorageManager},
};

const CORS_ALLOW_ORIGIN: (&str, &str) = ("Access-Control-Allow-Origin", "*");
const CORS_ALLOW_HEADERS: (&str, &str) = (
    "Access-Control-Allow-Headers",
    "authorization, x-client-info, apikey, content-type",
);

/// Everything a proxy invocation needs, injected per app instead of held
/// as process globals. Requests share no mutable state.
pub struct ProxyState {
    pub gateway: Arc<dyn GenerationGateway>,
    pub artifacts: Option<Arc<dyn ArtifactStore>>,
    pub generated_bucket: String,
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/generate-image")
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .route(web::post().to(generate_image))
            .route(web::method(actix_web::http::Method::OPTIONS).to(preflight)),
    );
}

/// Body deserialization failures answer in the same shape as every other
/// error: a JSON `{error}` body with permissive cross-origin headers.
fn json_error_handler(
    error: actix_web::error::JsonPayloadError,
    _request: &actix_web::HttpRequest,
) -> actix_web::Error {
    let message = error.to_string();
    actix_web::error::InternalError::from_response(
        error,
        json_response(StatusCode::BAD_REQUEST, &ErrorBody { error: message }),
    )
    .into()
}

/// CORS preflight: headers only, no body.
async fn preflight() -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(CORS_ALLOW_ORIGIN)
        .insert_header(CORS_ALLOW_HEADERS)
        .finish()
}

async fn generate_image(
    state: web::Data<ProxyState>,
    body: web::Json<GenerateImageRequest>,
) -> HttpResponse {
    let request = body.into_inner();

    // Fail fast, before any upstream call.
    if let Err(error) = request.validate() {
        return error_response(&error);
    }

    match run_generation(&state, &request).await {
        Ok(output) => json_response(
            StatusCode::OK,
            &GenerateImageResponse {
                image_url: output.into_url(),
            },
        ),
        Err(error) => error_response(&error),
    }
}

/// One gateway call, at most one storage write. Storage trouble of any
/// kind degrades to the inline payload instead of failing the request.
async fn run_generation(
    state: &ProxyState,
    request: &GenerateImageRequest,
) -> Result<ImageOutput> {
    let data_url = state
        .gateway
        .generate(&request.prompt, request.source_image_url.as_deref())
        .await?;

    let artifacts = match &state.artifacts {
        Some(artifacts) => artifacts,
        None => return Ok(ImageOutput::Inline(data_url)),
    };

    let (mime, bytes) = parse_data_url(&data_url)?;
    let key = format!("{}.{}", Uuid::new_v4(), extension_for_mime(&mime));

    match artifacts
        .put(&state.generated_bucket, &key, bytes, &mime)
        .await
    {
        Ok(()) => {
            let public_url = artifacts.public_url(&state.generated_bucket, &key);
            log::info!("Image stored successfully: {}", public_url);
            Ok(ImageOutput::Stored(public_url))
        }
        Err(error) => {
            log::error!("Storage upload error: {}", error);
            Ok(ImageOutput::Inline(data_url))
        }
    }
}

fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

fn json_response(status: StatusCode, body: &impl Serialize) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header(CORS_ALLOW_ORIGIN)
        .insert_header(CORS_ALLOW_HEADERS)
        .json(body)
}

fn error_response(error: &StudioError) -> HttpResponse {
    let status =
        StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    // Capacity and validation messages go to the user verbatim; anything
    // unexpected is logged in full and summarized on the wire.
    let message = match error {
        StudioError::InvalidRequest(msg)
        | StudioError::RateLimited(msg)
        | StudioError::QuotaExceeded(msg) => msg.clone(),
        other => {
            log::error!("Error in generate-image handler: {}", other);
            other.to_string()
        }
    };

    json_response(status, &ErrorBody { error: message })
}

/// Builds the proxy server from a validated config and runs it until
/// shutdown. The gateway key is the one startup requirement; storage is
/// optional by design.
pub async fn serve(config: Config) -> Result<()> {
    let gateway = GatewayClient::new(config.gateway.clone().unwrap_or_default())?;
    let storage = StorageManager::from_config(&config)?;

    let state = web::Data::new(ProxyState {
        gateway: Arc::new(gateway),
        artifacts: storage.artifacts().cloned(),
        generated_bucket: storage.generated_bucket().to_string(),
    });

    let port = config.port.unwrap_or(8080);
    log::info!("🌐 Generation proxy listening on http://0.0.0.0:{}", port);

    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes))
        .bind(("0.0.0.0", port))
        .map_err(|e| StudioError::ConfigError(format!("Failed to bind port {}: {}", port, e)))?
        .run()
        .await
        .map_err(|e| StudioError::RequestError(format!("Server error: {}", e)))
}
