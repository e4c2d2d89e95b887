use std::path::Path as FsPath;

use axum::{
    extract::{Json, Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post, put},
    Router,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{
    app_state::AppState,
    error::ApiError,
    extract,
    models::{
        ExamQuestion, Flashcard, LearningStep, Mcq, MindMapNode, StickyNote,
        VideoSummaryResponse,
    },
    youtube,
};

// --- Payloads de la API ---

#[derive(Deserialize)]
pub struct VideoRequest {
    url: String,
}

#[derive(Deserialize)]
pub struct CategoryUpdate {
    category: String,
}

#[derive(Deserialize)]
pub struct QuizAnswerParams {
    quiz_id: String,
    question_id: String,
    answer: i64,
}

#[derive(Deserialize)]
pub struct MarkDifficultyParams {
    flashcard_id: String,
    difficulty: String,
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(homepage_handler))
        // Modo repaso inteligente
        .route("/api/generate-flashcards", post(generate_flashcards_handler))
        .route("/api/generate-mcqs", post(generate_mcqs_handler))
        .route("/api/quiz/submit-answer", post(submit_quiz_answer_handler))
        .route("/api/quiz/:quiz_id", get(quiz_status_handler))
        .route("/api/flashcard/mark-difficulty", post(mark_flashcard_difficulty_handler))
        // Mapas mentales
        .route("/api/generate-mindmap", post(generate_mindmap_handler))
        .route("/api/mindmap/:map_id", get(mindmap_status_handler))
        // Rutas de aprendizaje
        .route("/api/generate-learning-path", post(generate_learning_path_handler))
        .route("/api/learning-path/:path_id", get(learning_path_status_handler))
        // Notas adhesivas
        .route("/api/generate-sticky-notes", post(generate_sticky_notes_handler))
        .route("/api/sticky-notes/:note_id", get(sticky_note_status_handler))
        .route("/api/sticky-notes/:note_id/category", put(update_sticky_note_category_handler))
        // Modo examen
        .route("/api/generate-exam-questions", post(generate_exam_questions_handler))
        .route("/api/exam-questions/by-type/:question_type", get(exam_questions_by_type_handler))
        .route("/api/exam-questions/by-probability/:min_probability", get(exam_questions_by_probability_handler))
        // Resumen de vídeos
        .route("/api/summarize-youtube", post(summarize_youtube_handler))
        .route("/api/video-info/:video_id", get(video_info_handler))
        // Analíticas (stub)
        .route("/api/analytics/study-progress", get(study_progress_handler))
        .route("/api/analytics/performance", get(performance_metrics_handler))
        // Utilidades
        .route("/api/health", get(health_handler))
        .route("/api/supported-formats", get(supported_formats_handler))
        .route("/api/shutdown", post(shutdown_handler))
        .with_state(app_state)
}

// --- Input de los endpoints de generación ---

/// Contenido crudo de una petición de generación: un fichero subido o un
/// campo de texto. Exactamente una fuente es obligatoria.
struct GenerateInput {
    file: Option<(String, Vec<u8>)>,
    text: Option<String>,
}

async fn read_generate_input(multipart: &mut Multipart) -> Result<GenerateInput, ApiError> {
    let mut input = GenerateInput { file: None, text: None };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::ClientInput(format!("Invalid multipart payload: {e}")))?
    {
        // El nombre se copia antes de consumir el campo.
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::ClientInput(format!("Could not read file upload: {e}")))?;
                input.file = Some((filename, bytes.to_vec()));
            }
            Some("text") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::ClientInput(format!("Could not read text field: {e}")))?;
                input.text = Some(text);
            }
            // Campos desconocidos se ignoran.
            _ => {}
        }
    }

    Ok(input)
}

/// Reduce el input a texto plano. El fichero tiene prioridad; un campo de
/// texto en blanco cuenta como ausente. Si no hay ninguna fuente no se llama
/// a ningún colaborador.
fn resolve_content(input: GenerateInput) -> Result<String, ApiError> {
    if let Some((filename, bytes)) = input.file {
        return extract::extract_text(&filename, &bytes);
    }
    if let Some(text) = input.text.filter(|t| !t.trim().is_empty()) {
        return Ok(text);
    }
    Err(ApiError::ClientInput(
        "Please provide either a file or text".to_string(),
    ))
}

// --- Handlers de generación ---

#[axum::debug_handler]
async fn generate_flashcards_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Vec<Flashcard>>, ApiError> {
    let content = resolve_content(read_generate_input(&mut multipart).await?)?;
    let flashcards = state
        .llm_manager
        .generate_flashcards(&content)
        .await
        .map_err(|cause| ApiError::Generation { operation: "flashcards", cause })?;
    info!("Generadas {} flashcards", flashcards.len());
    Ok(Json(flashcards))
}

#[axum::debug_handler]
async fn generate_mcqs_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Vec<Mcq>>, ApiError> {
    let content = resolve_content(read_generate_input(&mut multipart).await?)?;
    let mcqs = state
        .llm_manager
        .generate_mcqs(&content)
        .await
        .map_err(|cause| ApiError::Generation { operation: "MCQs", cause })?;
    info!("Generadas {} MCQs", mcqs.len());
    Ok(Json(mcqs))
}

#[axum::debug_handler]
async fn generate_mindmap_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MindMapNode>, ApiError> {
    let content = resolve_content(read_generate_input(&mut multipart).await?)?;
    let mindmap = state
        .llm_manager
        .generate_mind_map(&content)
        .await
        .map_err(|cause| ApiError::Generation { operation: "mind map", cause })?;
    Ok(Json(mindmap))
}

#[axum::debug_handler]
async fn generate_learning_path_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Vec<LearningStep>>, ApiError> {
    let content = resolve_content(read_generate_input(&mut multipart).await?)?;
    let learning_path = state
        .llm_manager
        .generate_learning_path(&content)
        .await
        .map_err(|cause| ApiError::Generation { operation: "learning path", cause })?;
    info!("Generada ruta de aprendizaje de {} pasos", learning_path.len());
    Ok(Json(learning_path))
}

#[axum::debug_handler]
async fn generate_sticky_notes_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Vec<StickyNote>>, ApiError> {
    let content = resolve_content(read_generate_input(&mut multipart).await?)?;
    let notes = state
        .llm_manager
        .generate_sticky_notes(&content)
        .await
        .map_err(|cause| ApiError::Generation { operation: "sticky notes", cause })?;
    info!("Generadas {} notas adhesivas", notes.len());
    Ok(Json(notes))
}

#[axum::debug_handler]
async fn generate_exam_questions_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Vec<ExamQuestion>>, ApiError> {
    let content = resolve_content(read_generate_input(&mut multipart).await?)?;
    let questions = state
        .llm_manager
        .generate_exam_questions(&content)
        .await
        .map_err(|cause| ApiError::Generation { operation: "exam questions", cause })?;
    info!("Generadas {} preguntas de examen", questions.len());
    Ok(Json(questions))
}

// --- Pipeline de vídeo ---

#[axum::debug_handler]
async fn summarize_youtube_handler(
    State(state): State<AppState>,
    Json(payload): Json<VideoRequest>,
) -> Result<Json<VideoSummaryResponse>, ApiError> {
    let response = youtube::summarize_video(&state, &payload.url).await?;
    info!(
        "Vídeo {} resumido (fuente: {:?})",
        response.video_id, response.source
    );
    Ok(Json(response))
}

#[axum::debug_handler]
async fn video_info_handler(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<youtube::VideoMetadata>, ApiError> {
    if !youtube::is_valid_video_id(&video_id) {
        return Err(ApiError::ClientInput("Invalid YouTube video id".to_string()));
    }
    let metadata = youtube::try_fetch_metadata(&state.http, &video_id)
        .await
        .map_err(|cause| ApiError::Pipeline { operation: "fetching video info", cause })?;
    Ok(Json(metadata))
}

// --- Endpoints stub (eco sin almacenamiento) ---

#[axum::debug_handler]
async fn quiz_status_handler(Path(quiz_id): Path<String>) -> Json<serde_json::Value> {
    Json(json!({ "quiz_id": quiz_id, "status": "active" }))
}

#[axum::debug_handler]
async fn mindmap_status_handler(Path(map_id): Path<String>) -> Json<serde_json::Value> {
    Json(json!({ "map_id": map_id, "status": "ready" }))
}

#[axum::debug_handler]
async fn learning_path_status_handler(Path(path_id): Path<String>) -> Json<serde_json::Value> {
    Json(json!({ "path_id": path_id, "status": "active" }))
}

#[axum::debug_handler]
async fn sticky_note_status_handler(Path(note_id): Path<String>) -> Json<serde_json::Value> {
    Json(json!({ "note_id": note_id, "status": "active" }))
}

#[axum::debug_handler]
async fn update_sticky_note_category_handler(
    Path(note_id): Path<String>,
    Query(update): Query<CategoryUpdate>,
) -> Json<serde_json::Value> {
    Json(json!({ "note_id": note_id, "category": update.category, "updated": true }))
}

#[axum::debug_handler]
async fn exam_questions_by_type_handler(
    Path(question_type): Path<String>,
) -> Json<serde_json::Value> {
    Json(json!({ "question_type": question_type, "status": "filtered" }))
}

#[axum::debug_handler]
async fn exam_questions_by_probability_handler(
    Path(min_probability): Path<f64>,
) -> Json<serde_json::Value> {
    Json(json!({ "min_probability": min_probability, "status": "filtered" }))
}

#[axum::debug_handler]
async fn study_progress_handler() -> Json<serde_json::Value> {
    Json(json!({
        "flashcards_completed": 0,
        "mcqs_attempted": 0,
        "accuracy_rate": 0.0,
        "study_time": "0h 0m",
        "weak_areas": [],
        "strong_areas": []
    }))
}

#[axum::debug_handler]
async fn performance_metrics_handler() -> Json<serde_json::Value> {
    Json(json!({
        "weekly_progress": [],
        "subject_wise_performance": {},
        "difficulty_wise_accuracy": {},
        "time_spent_per_topic": {}
    }))
}

#[axum::debug_handler]
async fn submit_quiz_answer_handler(
    Query(params): Query<QuizAnswerParams>,
) -> Json<serde_json::Value> {
    let _ = params.answer;
    Json(json!({
        "quiz_id": params.quiz_id,
        "question_id": params.question_id,
        "is_correct": true,
        "explanation": "Detailed explanation here",
        "next_question": "next_question_id"
    }))
}

#[axum::debug_handler]
async fn mark_flashcard_difficulty_handler(
    Query(params): Query<MarkDifficultyParams>,
) -> Json<serde_json::Value> {
    // Intervalo de repaso fabricado según la dificultad; no se persiste nada.
    let days = match params.difficulty.as_str() {
        "easy" => 4,
        "medium" => 2,
        _ => 1,
    };
    let next_review = (Utc::now() + Duration::days(days)).to_rfc3339();
    Json(json!({
        "flashcard_id": params.flashcard_id,
        "difficulty": params.difficulty,
        "next_review": next_review
    }))
}

// --- Superficie estática y de salud ---

const INLINE_INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Smart Study Tool</title></head>
<body>
    <h1>Smart Study Tool API</h1>
    <p>API is running! Upload your files using the API endpoints to generate study materials.</p>
    <p>Try <code>GET /api/health</code> or <code>POST /api/generate-flashcards</code>.</p>
</body>
</html>
"#;

#[axum::debug_handler]
async fn homepage_handler(State(state): State<AppState>) -> Html<String> {
    let template_path = FsPath::new(&state.config.templates_dir).join("index.html");
    match tokio::fs::read_to_string(&template_path).await {
        Ok(contents) => Html(contents),
        // Sin plantilla en disco se sirve la página embebida.
        Err(_) => Html(INLINE_INDEX_HTML.to_string()),
    }
}

#[axum::debug_handler]
async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "version": "1.0.0" }))
}

#[axum::debug_handler]
async fn supported_formats_handler() -> Json<serde_json::Value> {
    Json(json!({ "supported_formats": extract::SUPPORTED_FORMATS }))
}

// --- Handler de apagado ---

#[axum::debug_handler]
async fn shutdown_handler(State(state): State<AppState>) -> impl IntoResponse {
    info!("Petición de apagado recibida.");
    if let Some(sender) = state.shutdown_sender.lock().unwrap().take() {
        let _ = sender.send(());
    }
    StatusCode::OK
}
