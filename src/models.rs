//! Modelos de dominio: los artefactos de estudio que devuelve la API.
//!
//! Todas las entidades son registros transitorios: se construyen por petición
//! a partir de la salida del LLM y se descartan tras la serialización.

use serde::{Deserialize, Serialize};

/// Nivel de dificultad compartido por flashcards, MCQs y preguntas de examen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Tarjeta de estudio pregunta/respuesta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashcard {
    #[serde(default)]
    pub id: String,
    pub question: String,
    pub answer: String,
    pub difficulty: Difficulty,
}

/// Pregunta de opción múltiple.
/// Invariante: `correct_answer < options.len()`, garantizado por el
/// generador antes de devolver la lista.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mcq {
    #[serde(default)]
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: String,
    pub difficulty: Difficulty,
}

/// Nodo recursivo de un mapa mental. `level` es la profundidad real del nodo
/// (raíz = 0); el generador renumera el árbol tras el parseo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MindMapNode {
    #[serde(default)]
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub children: Vec<MindMapNode>,
    #[serde(default)]
    pub level: u32,
    pub color: String,
}

/// Paso de una ruta de aprendizaje. Los `step_number` forman una secuencia
/// contigua ascendente que empieza en 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningStep {
    pub step_number: u32,
    pub title: String,
    pub description: String,
    pub estimated_time: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
}

/// Categoría semafórica de una nota adhesiva.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteCategory {
    Red,
    Yellow,
    Green,
}

/// Nota adhesiva con prioridad y etiquetas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StickyNote {
    #[serde(default)]
    pub id: String,
    pub content: String,
    pub category: NoteCategory,
    pub priority: i32,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Tipo de pregunta de examen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamQuestionKind {
    ShortAnswer,
    LongAnswer,
    Hots,
}

/// Pregunta de examen con probabilidad estimada de aparición en [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamQuestion {
    #[serde(default)]
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: ExamQuestionKind,
    pub probability_score: f64,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Origen del texto resumido de un vídeo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarySource {
    Transcript,
    Audio,
}

/// Respuesta final del pipeline de resumen de vídeos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSummaryResponse {
    pub video_id: String,
    pub title: String,
    pub thumbnail: String,
    pub summary: String,
    pub source: SummarySource,
    pub duration: Option<String>,
}
