//! Taxonomía sellada de errores de la API.
//!
//! Dos niveles: fallo del cliente (input ausente o identificador inválido,
//! 400) y fallo del servidor (cualquier error de un colaborador externo,
//! 500). Todos se serializan con el sobre uniforme `{"error": "..."}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Falta un input obligatorio o un identificador/URL es inválido.
    #[error("{0}")]
    ClientInput(String),

    /// La extracción de texto del fichero subido falló.
    #[error("Error extracting file content: {0}")]
    Extraction(anyhow::Error),

    /// Un colaborador de generación falló (llamada al LLM o parseo de su salida).
    #[error("Error generating {operation}: {cause}")]
    Generation {
        operation: &'static str,
        cause: anyhow::Error,
    },

    /// El pipeline de vídeo u otra operación externa falló.
    #[error("Error {operation}: {cause}")]
    Pipeline {
        operation: &'static str,
        cause: anyhow::Error,
    },
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::ClientInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Extraction(_)
            | ApiError::Generation { .. }
            | ApiError::Pipeline { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            error!("{message}");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
