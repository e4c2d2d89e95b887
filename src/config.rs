//! Carga y gestión de configuración de la aplicación (servidor + LLM + vídeo).

use std::env;
use anyhow::{anyhow, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    Gemini,
    Ollama,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            other => Err(anyhow!("Proveedor LLM no soportado: {other}")),
        }
    }
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_addr: String,

    pub llm_provider: LlmProvider,
    pub llm_chat_model: String,
    pub transcription_model: String,

    pub ytdlp_bin: String,
    pub templates_dir: String,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    /// Todas las claves tienen valor por defecto; sólo un proveedor LLM
    /// desconocido hace fallar la carga.
    pub fn from_env() -> Result<Self> {
        let server_addr =
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        let llm_provider_str =
            env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string());
        let llm_provider = LlmProvider::from_str(&llm_provider_str)?;

        let llm_chat_model =
            env::var("LLM_CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let transcription_model =
            env::var("TRANSCRIPTION_MODEL").unwrap_or_else(|_| "whisper-1".to_string());

        let ytdlp_bin = env::var("YTDLP_BIN").unwrap_or_else(|_| "yt-dlp".to_string());
        let templates_dir =
            env::var("TEMPLATES_DIR").unwrap_or_else(|_| "templates".to_string());

        Ok(Self {
            server_addr,
            llm_provider,
            llm_chat_model,
            transcription_model,
            ytdlp_bin,
            templates_dir,
        })
    }
}
