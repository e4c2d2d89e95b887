//! Extracción de texto plano a partir de ficheros subidos.
//!
//! El despacho se hace por extensión (en minúsculas). Un formato no soportado
//! o un contenido indescifrable es fallo del cliente; un fallo del parser
//! (PDF corrupto, etc.) es fallo del servidor.

use anyhow::anyhow;
use mime_guess::MimeGuess;
use scraper::Html;
use tracing::info;

use crate::error::ApiError;

/// Extensiones que la extracción sabe convertir a texto plano.
/// `GET /api/supported-formats` expone exactamente esta lista.
pub const SUPPORTED_FORMATS: [&str; 6] = ["pdf", "txt", "md", "html", "csv", "json"];

/// Convierte un fichero subido en texto plano normalizado.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, ApiError> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    let mime = MimeGuess::from_path(filename)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());
    info!(
        "Extrayendo texto de '{}' ({}, {} bytes)",
        filename,
        mime,
        bytes.len()
    );

    let text = match extension.as_str() {
        "pdf" => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ApiError::Extraction(anyhow!("could not parse PDF '{filename}': {e}")))?,
        "html" => {
            let raw = decode_utf8(filename, bytes)?;
            html_to_text(&raw)
        }
        "txt" | "md" | "csv" | "json" => decode_utf8(filename, bytes)?,
        "" => {
            return Err(ApiError::ClientInput(format!(
                "File '{filename}' has no extension; supported formats: {}",
                SUPPORTED_FORMATS.join(", ")
            )))
        }
        other => {
            return Err(ApiError::ClientInput(format!(
                "Unsupported file format '.{other}'; supported formats: {}",
                SUPPORTED_FORMATS.join(", ")
            )))
        }
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::ClientInput(format!(
            "File '{filename}' contains no extractable text"
        )));
    }
    Ok(text)
}

fn decode_utf8(filename: &str, bytes: &[u8]) -> Result<String, ApiError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| {
        ApiError::ClientInput(format!("File '{filename}' is not valid UTF-8 text"))
    })
}

/// Aplana un documento HTML a su contenido textual.
fn html_to_text(raw: &str) -> String {
    let document = Html::parse_document(raw);
    let fragments: Vec<&str> = document
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    fragments.join(" ")
}
