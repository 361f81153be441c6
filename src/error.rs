use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

/// Request-level error taxonomy. Configuration problems are checked at startup
/// and never reach a handler; everything else maps to an HTTP status here.
#[derive(Debug, Error)]
pub enum SotoError {
    #[error("configuracion invalida: {0}")]
    Config(String),

    #[error("pregunta vacia")]
    EmptyQuestion,

    #[error("error de recuperacion: {0}")]
    Retrieval(#[source] anyhow::Error),

    #[error("error del modelo: {0}")]
    Generation(#[source] anyhow::Error),

    #[error("error de almacenamiento: {0}")]
    Storage(#[source] anyhow::Error),

    #[error("acceso denegado")]
    Unauthorized,
}

impl SotoError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SotoError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SotoError::EmptyQuestion => StatusCode::BAD_REQUEST,
            SotoError::Retrieval(_) | SotoError::Generation(_) => StatusCode::BAD_GATEWAY,
            SotoError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SotoError::Unauthorized => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for SotoError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Unauthorized only arises on the debug view, which is an HTML
        // surface; everything else answers the JSON API in plain text.
        match self {
            SotoError::Unauthorized => {
                (status, Html("<h2>⛔ Acceso denegado</h2>".to_string())).into_response()
            }
            other => (status, other.to_string()).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_failures_map_to_bad_gateway() {
        let e = SotoError::Generation(anyhow::anyhow!("timeout"));
        assert_eq!(e.status_code(), StatusCode::BAD_GATEWAY);
        let e = SotoError::Retrieval(anyhow::anyhow!("qdrant down"));
        assert_eq!(e.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn unauthorized_is_forbidden() {
        assert_eq!(SotoError::Unauthorized.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unauthorized_renders_the_denied_page() {
        let response = SotoError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Acceso denegado"));
    }

    #[tokio::test]
    async fn storage_failure_is_a_server_error() {
        let response = SotoError::Storage(anyhow::anyhow!("disco lleno")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
