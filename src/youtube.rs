//! Pipeline de resumen de vídeos de YouTube.
//!
//! Flujo por petición, terminal en el primer resultado:
//!   1. Resolución del id canónico a partir de la URL (fallo → 400).
//!   2. Metadatos vía oEmbed, con mejor esfuerzo: cualquier fallo se
//!      sustituye por valores por defecto deterministas y nunca aborta.
//!   3. Transcripción existente vía `timedtext`; ausencia no es error.
//!   4. Fallback de audio: descarga con `yt-dlp`, transcripción HTTP y
//!      resumen. Cualquier fallo en esta rama sí es terminal.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::{SummarySource, VideoSummaryResponse};

const OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed";
const TIMEDTEXT_ENDPOINT: &str = "https://video.google.com/timedtext";
const TRANSCRIPTION_ENDPOINT: &str = "https://api.openai.com/v1/audio/transcriptions";

// Idiomas de subtítulos que se intentan, en orden.
const TRANSCRIPT_LANGS: [&str; 3] = ["en", "en-US", "en-GB"];

// --- Resolución de identificadores ---

/// Extrae el id canónico de 11 caracteres de una URL de YouTube.
/// Acepta `watch?v=`, `youtu.be/`, `/embed/`, `/shorts/`, `/live/` y `/v/`.
pub fn resolve_video_id(raw_url: &str) -> Option<String> {
    let parsed = Url::parse(raw_url).ok()?;
    let host = parsed
        .host_str()?
        .trim_start_matches("www.")
        .trim_start_matches("m.");

    let candidate = match host {
        "youtu.be" => parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .map(str::to_string),
        "youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => {
            let segments: Vec<&str> = parsed.path_segments()?.collect();
            match segments.as_slice() {
                ["watch", ..] => parsed
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned()),
                ["embed", id, ..] | ["shorts", id, ..] | ["live", id, ..] | ["v", id, ..] => {
                    Some((*id).to_string())
                }
                _ => None,
            }
        }
        _ => None,
    };

    candidate.filter(|id| is_valid_video_id(id))
}

/// Un id de vídeo válido: 11 caracteres del alfabeto URL-safe de YouTube.
pub fn is_valid_video_id(id: &str) -> bool {
    id.len() == 11
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// --- Metadatos (mejor esfuerzo) ---

/// Metadatos de presentación de un vídeo. Los campos que oEmbed no
/// proporciona llevan siempre el valor por defecto determinista.
#[derive(Debug, Clone, Serialize)]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: String,
    pub thumbnail: String,
    pub duration: String,
    pub channel: String,
    pub view_count: u64,
}

impl VideoMetadata {
    /// Valores por defecto deterministas construidos sólo a partir del id.
    pub fn fallback(video_id: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            title: "YouTube Video".to_string(),
            thumbnail: format!("https://img.youtube.com/vi/{video_id}/maxresdefault.jpg"),
            duration: "Unknown".to_string(),
            channel: "Unknown Channel".to_string(),
            view_count: 0,
        }
    }
}

#[derive(Deserialize)]
struct OEmbedInfo {
    title: String,
    author_name: String,
    thumbnail_url: String,
}

/// Consulta oEmbed y falla si el vídeo no es accesible.
/// `GET /api/video-info` expone esta variante directamente.
pub async fn try_fetch_metadata(http: &reqwest::Client, video_id: &str) -> Result<VideoMetadata> {
    let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
    let info: OEmbedInfo = http
        .get(OEMBED_ENDPOINT)
        .query(&[("url", watch_url.as_str()), ("format", "json")])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let mut metadata = VideoMetadata::fallback(video_id);
    metadata.title = info.title;
    metadata.channel = info.author_name;
    if !info.thumbnail_url.is_empty() {
        metadata.thumbnail = info.thumbnail_url;
    }
    Ok(metadata)
}

/// Variante con mejor esfuerzo para el pipeline de resumen: absorbe el fallo
/// y devuelve los valores por defecto.
pub async fn fetch_metadata_or_default(http: &reqwest::Client, video_id: &str) -> VideoMetadata {
    match try_fetch_metadata(http, video_id).await {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!("No se pudieron obtener metadatos de {video_id}: {e}. Usando valores por defecto.");
            VideoMetadata::fallback(video_id)
        }
    }
}

// --- Transcripción existente ---

#[derive(Deserialize, Default)]
struct TimedTextTrack {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Deserialize, Default)]
struct TimedTextEvent {
    #[serde(default)]
    segs: Vec<TimedTextSeg>,
}

#[derive(Deserialize, Default)]
struct TimedTextSeg {
    #[serde(default)]
    utf8: String,
}

/// Aplana un cuerpo `timedtext` (fmt=json3) al texto de la transcripción.
/// Un cuerpo vacío o sin segmentos significa "no hay transcripción".
fn parse_timedtext(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }
    let track: TimedTextTrack = serde_json::from_str(body).ok()?;
    let fragments: Vec<String> = track
        .events
        .iter()
        .flat_map(|event| event.segs.iter())
        .map(|seg| seg.utf8.trim().to_string())
        .filter(|text| !text.is_empty() && text != "\n")
        .collect();

    if fragments.is_empty() {
        None
    } else {
        Some(fragments.join(" "))
    }
}

/// Busca una transcripción ya publicada para el vídeo. `None` es un resultado
/// válido (no hay pista de subtítulos), igual que cualquier fallo de red.
pub async fn fetch_transcript(http: &reqwest::Client, video_id: &str) -> Option<String> {
    for lang in TRANSCRIPT_LANGS {
        let response = http
            .get(TIMEDTEXT_ENDPOINT)
            .query(&[("v", video_id), ("lang", lang), ("fmt", "json3")])
            .send()
            .await;

        let body = match response {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(body) => body,
                Err(_) => continue,
            },
            Ok(_) => continue,
            Err(e) => {
                warn!("Fallo consultando subtítulos '{lang}' de {video_id}: {e}");
                continue;
            }
        };

        if let Some(transcript) = parse_timedtext(&body) {
            info!("Transcripción '{lang}' encontrada para {video_id}");
            return Some(transcript);
        }
    }
    None
}

// --- Fallback de audio ---

/// Descarga el audio del vídeo como mp3 en `workdir` usando `yt-dlp`.
pub async fn download_audio(ytdlp_bin: &str, video_url: &str, workdir: &Path) -> Result<PathBuf> {
    let stem = Uuid::new_v4().to_string();
    let output_template = workdir.join(format!("{stem}.%(ext)s"));
    let audio_path = workdir.join(format!("{stem}.mp3"));

    let output = Command::new(ytdlp_bin)
        .arg("--quiet")
        .arg("--no-playlist")
        .arg("--extract-audio")
        .arg("--audio-format")
        .arg("mp3")
        .arg("--output")
        .arg(&output_template)
        .arg(video_url)
        .output()
        .await
        .with_context(|| format!("could not run '{ytdlp_bin}'"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "yt-dlp exited with {}: {}",
            output.status,
            stderr.trim()
        ));
    }
    if !audio_path.exists() {
        return Err(anyhow!("yt-dlp produced no audio file"));
    }

    info!("Audio descargado en {}", audio_path.display());
    Ok(audio_path)
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Transcribe un fichero de audio contra el endpoint de transcripción HTTP.
pub async fn transcribe_audio(
    http: &reqwest::Client,
    model: &str,
    audio_path: &Path,
) -> Result<String> {
    let api_key = std::env::var("OPENAI_API_KEY")
        .map_err(|_| anyhow!("OPENAI_API_KEY is not set"))?;

    let bytes = tokio::fs::read(audio_path).await?;
    let file_name = audio_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "audio.mp3".to_string());

    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("audio/mpeg")?;
    let form = reqwest::multipart::Form::new()
        .text("model", model.to_string())
        .part("file", part);

    let response: TranscriptionResponse = http
        .post(TRANSCRIPTION_ENDPOINT)
        .bearer_auth(api_key)
        .multipart(form)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if response.text.trim().is_empty() {
        return Err(anyhow!("transcription came back empty"));
    }
    Ok(response.text)
}

async fn summarize_from_audio(state: &AppState, video_id: &str) -> Result<String> {
    let workdir = tempfile::tempdir()?;
    let watch_url = format!("https://www.youtube.com/watch?v={video_id}");

    let audio_path = download_audio(&state.config.ytdlp_bin, &watch_url, workdir.path()).await?;
    let transcript =
        transcribe_audio(&state.http, &state.config.transcription_model, &audio_path).await?;
    state.llm_manager.summarize_transcript(&transcript).await
}

// --- Orquestación ---

/// Ejecuta el pipeline completo para una URL y ensambla la respuesta final.
pub async fn summarize_video(
    state: &AppState,
    raw_url: &str,
) -> Result<VideoSummaryResponse, ApiError> {
    let video_id = resolve_video_id(raw_url)
        .ok_or_else(|| ApiError::ClientInput("Invalid YouTube URL".to_string()))?;

    // Los metadatos son decorativos: nunca bloquean el resumen.
    let metadata = fetch_metadata_or_default(&state.http, &video_id).await;

    let (summary, source) = match fetch_transcript(&state.http, &video_id).await {
        Some(transcript) => {
            let summary = state
                .llm_manager
                .summarize_transcript(&transcript)
                .await
                .map_err(|cause| ApiError::Pipeline {
                    operation: "processing video",
                    cause,
                })?;
            (summary, SummarySource::Transcript)
        }
        None => {
            info!("Sin transcripción publicada para {video_id}; usando la rama de audio");
            let summary = summarize_from_audio(state, &video_id)
                .await
                .map_err(|cause| ApiError::Pipeline {
                    operation: "processing audio",
                    cause,
                })?;
            (summary, SummarySource::Audio)
        }
    };

    Ok(VideoSummaryResponse {
        video_id: metadata.video_id,
        title: metadata.title,
        thumbnail: metadata.thumbnail,
        summary,
        source,
        duration: Some(metadata.duration),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_standard_watch_urls() {
        let id = resolve_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn resolves_short_embed_and_shorts_urls() {
        assert_eq!(
            resolve_video_id("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            resolve_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            resolve_video_id("https://m.youtube.com/shorts/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn watch_url_with_extra_params_still_resolves() {
        let id = resolve_video_id(
            "https://www.youtube.com/watch?t=42&v=dQw4w9WgXcQ&list=PL123",
        )
        .unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn rejects_non_youtube_and_malformed_urls() {
        assert!(resolve_video_id("https://vimeo.com/12345").is_none());
        assert!(resolve_video_id("not a url at all").is_none());
        assert!(resolve_video_id("https://www.youtube.com/watch").is_none());
        // Id demasiado corto.
        assert!(resolve_video_id("https://youtu.be/abc").is_none());
    }

    #[test]
    fn video_id_validation() {
        assert!(is_valid_video_id("dQw4w9WgXcQ"));
        assert!(is_valid_video_id("a-b_c123XYZ"));
        assert!(!is_valid_video_id("short"));
        assert!(!is_valid_video_id("contains spc"));
    }

    #[test]
    fn fallback_metadata_is_deterministic() {
        let meta = VideoMetadata::fallback("dQw4w9WgXcQ");
        assert_eq!(meta.title, "YouTube Video");
        assert_eq!(
            meta.thumbnail,
            "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
        );
        assert_eq!(meta.duration, "Unknown");
        assert_eq!(meta.view_count, 0);
    }

    #[test]
    fn parse_timedtext_joins_segments() {
        let body = r#"{"events": [
            {"segs": [{"utf8": "hello"}, {"utf8": "world"}]},
            {"segs": [{"utf8": "\n"}]},
            {"segs": [{"utf8": "again"}]}
        ]}"#;
        assert_eq!(parse_timedtext(body).unwrap(), "hello world again");
    }

    #[test]
    fn parse_timedtext_treats_empty_as_missing() {
        assert!(parse_timedtext("").is_none());
        assert!(parse_timedtext("   ").is_none());
        assert!(parse_timedtext(r#"{"events": []}"#).is_none());
        assert!(parse_timedtext("<transcript/>").is_none());
    }
}
