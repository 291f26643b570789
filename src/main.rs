mod client;
mod config;
mod error;
mod models;
mod services;
mod views;

use axum::{
    Extension, Router,
    extract::State,
    middleware,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
};
use client::ClientId;
use config::Config;
use error::{AppError, AppJson, AppPath, AppResult};
use http::header;
use models::{CopyTarget, GenerateRequest, GeneratedPrompts};
use services::llm::GeminiClient;
use services::session::{Outcome, SessionView, Studio, VALIDATION_MESSAGE};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Clone)]
struct AppState {
    studio: Arc<Studio>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Missing credentials stop the process here, before anything is served.
    let config = Config::from_env()?;

    let llm_client = GeminiClient::new(&config)?;
    tracing::info!(model = llm_client.model(), "Gemini client ready");

    let app_state = AppState {
        studio: Arc::new(Studio::new(Arc::new(llm_client))),
    };

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app(app_state)).await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/generate", post(generate_fragment))
        .route("/api/generate", post(generate_json))
        .route("/api/state", get(current_state))
        .route("/copy/:target", post(copy_text))
        .with_state(state)
        .layer(middleware::from_fn(client::session_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::AllowMethods::any())
                .allow_headers(tower_http::cors::AllowHeaders::any()),
        )
}

async fn index() -> Html<String> {
    Html(views::index_page())
}

async fn health_check() -> &'static str {
    "OK"
}

/// Runs a generation and answers with the re-rendered result area.
async fn generate_fragment(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
    AppJson(request): AppJson<GenerateRequest>,
) -> Html<String> {
    state.studio.generate(client, &request.theme).await;
    Html(views::render_result(&state.studio.view(client).await))
}

async fn generate_json(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
    AppJson(request): AppJson<GenerateRequest>,
) -> AppResult<Json<GeneratedPrompts>> {
    match state.studio.generate(client, &request.theme).await {
        Outcome::Generated(prompts) => Ok(Json(prompts)),
        Outcome::Invalid => Err(AppError::Validation(VALIDATION_MESSAGE.to_string())),
        Outcome::Failed(err) => Err(err.into()),
        Outcome::Superseded => Err(AppError::Superseded),
    }
}

async fn current_state(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
) -> Json<SessionView> {
    Json(state.studio.view(client).await)
}

async fn copy_text(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
    AppPath(target): AppPath<CopyTarget>,
) -> AppResult<impl IntoResponse> {
    let text = state
        .studio
        .copy(client, target)
        .await
        .ok_or(AppError::NothingToCopy)?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}
