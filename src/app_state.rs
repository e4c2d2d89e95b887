use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use crate::{config::AppConfig, llm::LlmManager};

/// Estado compartido de la aplicación, construido una vez en el arranque y
/// clonado por el router. No hay estado mutable entre peticiones más allá
/// del canal de apagado.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub llm_manager: LlmManager,
    pub http: reqwest::Client,
    pub shutdown_sender: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}
