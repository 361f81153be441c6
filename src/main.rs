use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::Method;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};

use soto::config::Config;
use soto::error::SotoError;
use soto::llm::OpenAiClient;
use soto::memory::{self, ConversationStore};
use soto::models::{AskRequest, AskResponse, ConversationTurn, DebugQuery};
use soto::rag::{index_builder, RagEngine};
use soto::service::AnswerService;

struct AppState {
    service: AnswerService,
    store: Arc<dyn ConversationStore>,
    debug_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("Conectando a Qdrant: {}", config.qdrant_url);

    let store = memory::open(&config.memory).await?;

    let engine = RagEngine::new(&config.qdrant_url, &config.collection).await?;
    index_builder::ensure_index(&engine, std::path::Path::new(&config.data_dir)).await?;

    let generator = OpenAiClient::new(
        config.openai_base_url.clone(),
        config.openai_api_key.clone(),
        config.model.clone(),
    );

    let service = AnswerService::new(
        store.clone(),
        Arc::new(engine),
        Arc::new(generator),
        config.history_limit,
        config.top_k,
    );

    let state = Arc::new(AppState {
        service,
        store,
        debug_token: config.debug_token.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/preguntar", post(preguntar))
        .route("/verdb", get(ver_db))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("soto API escuchando en {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "message": "soto API funcionando"
    }))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn preguntar(
    State(state): State<Arc<AppState>>,
    Json(datos): Json<AskRequest>,
) -> Result<Json<AskResponse>, SotoError> {
    let respuesta = state.service.ask(&datos.user_id, &datos.pregunta).await?;
    Ok(Json(AskResponse { respuesta }))
}

/// Exact string comparison against the configured secret. When no secret is
/// configured the view is disabled outright; there is no fallback token.
fn debug_access_allowed(configured: Option<&str>, presented: &str) -> bool {
    match configured {
        Some(secret) => secret == presented,
        None => false,
    }
}

async fn ver_db(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DebugQuery>,
) -> Result<Html<String>, SotoError> {
    if !debug_access_allowed(state.debug_token.as_deref(), &query.token) {
        return Err(SotoError::Unauthorized);
    }

    let limite = query.limite();
    let turns = state.store.latest(limite).await.map_err(|e| {
        tracing::error!("no se pudo leer la base de datos: {}", e);
        SotoError::Storage(e)
    })?;

    Ok(Html(render_conversaciones(&turns, limite)))
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn render_conversaciones(turns: &[ConversationTurn], limite: i64) -> String {
    let mut html = format!(
        "<html><head><style>\
         body{{font-family:Arial,sans-serif;padding:20px}}\
         table{{border-collapse:collapse;width:100%}}\
         th,td{{border:1px solid #ddd;padding:8px}}\
         th{{background-color:#333;color:white}}\
         tr:nth-child(even){{background-color:#f2f2f2}}\
         </style></head>\
         <body><h2>📂 Conversaciones ({} de las últimas {})</h2>\
         <table><tr><th>User</th><th>Pregunta</th><th>Respuesta</th><th>Timestamp</th></tr>",
        turns.len(),
        limite
    );
    for turn in turns {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            html_escape(&turn.user_id),
            html_escape(&turn.pregunta),
            html_escape(&turn.respuesta),
            turn.timestamp
        ));
    }
    html.push_str("</table></body></html>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn wrong_token_is_rejected() {
        assert!(!debug_access_allowed(Some("secreto"), "otro"));
        assert!(debug_access_allowed(Some("secreto"), "secreto"));
    }

    #[test]
    fn unset_token_disables_the_view() {
        // No configured secret means nothing grants access, not even
        // an empty token.
        assert!(!debug_access_allowed(None, ""));
        assert!(!debug_access_allowed(None, "SOTO123"));
    }

    #[test]
    fn rendered_table_escapes_markup() {
        let turns = vec![ConversationTurn {
            user_id: "u1".to_string(),
            pregunta: "<script>alert(1)</script>".to_string(),
            respuesta: "tranquilo".to_string(),
            timestamp: Utc::now(),
        }];
        let html = render_conversaciones(&turns, 50);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("tranquilo"));
    }
}
