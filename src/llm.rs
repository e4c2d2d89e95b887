//! Abstracción sobre Rig para generar material de estudio con distintos
//! proveedores de LLM. De momento se implementa OpenAI; Gemini/Ollama quedan
//! preparados para el futuro.
//!
//! Cada generador envía el contenido con un preámbulo que exige JSON estricto,
//! limpia las vallas markdown de la respuesta y la parsea a los modelos de
//! `crate::models`. Pequeñas normalizaciones (ids vacíos, niveles del mapa
//! mental, numeración de pasos) se aplican aquí, nunca en el router.

use crate::config::{AppConfig, LlmProvider};
use crate::models::{ExamQuestion, Flashcard, LearningStep, Mcq, MindMapNode, StickyNote};
use anyhow::{anyhow, Result};
use rig::completion::Prompt;
use serde::de::DeserializeOwned;
use tracing::warn;
use uuid::Uuid;

// --- Preambulos de generación ---

const FLASHCARDS_PROMPT: &str = r#"
You are a study assistant. From the provided study material, generate 8-12 flashcards.
The output MUST be a single valid JSON array. Each element is an object with keys:
- "id": short unique string
- "question": the prompt side of the card
- "answer": the answer side
- "difficulty": one of "easy", "medium", "hard"
Return ONLY the JSON array, no explanations.
"#;

const MCQS_PROMPT: &str = r#"
You are a study assistant. From the provided study material, generate 8-10 multiple-choice questions.
The output MUST be a single valid JSON array. Each element is an object with keys:
- "id": short unique string
- "question": the question text
- "options": an array of exactly 4 answer strings
- "correct_answer": the 0-based index into "options" of the right answer
- "explanation": why that option is correct
- "difficulty": one of "easy", "medium", "hard"
"correct_answer" must always be a valid index into "options".
Return ONLY the JSON array, no explanations.
"#;

const MIND_MAP_PROMPT: &str = r#"
You are a study assistant. From the provided study material, build a hierarchical mind map.
The output MUST be a single valid JSON object (the root node). Each node has keys:
- "id": short unique string
- "label": concise concept name
- "children": array of child nodes (same shape, may be empty)
- "level": depth of the node, 0 for the root
- "color": a hex color for the node
Use at most 3 levels below the root. Return ONLY the JSON object, no explanations.
"#;

const LEARNING_PATH_PROMPT: &str = r#"
You are a study assistant. From the provided study material, design a step-by-step learning path.
The output MUST be a single valid JSON array ordered from first to last step. Each element has keys:
- "step_number": position in the sequence, starting at 1
- "title": short step name
- "description": what to do in this step
- "estimated_time": human-readable estimate, e.g. "2 hours"
- "prerequisites": array of prior step titles (empty for the first step)
- "resources": array of suggested resources
Return ONLY the JSON array, no explanations.
"#;

const STICKY_NOTES_PROMPT: &str = r#"
You are a study assistant. From the provided study material, generate 6-10 color-coded sticky notes.
The output MUST be a single valid JSON array. Each element has keys:
- "id": short unique string
- "content": the note text, one key idea
- "category": "red" for must-memorize, "yellow" for review-again, "green" for understood
- "priority": integer 1 (highest) to 5 (lowest)
- "tags": array of topic tags
Return ONLY the JSON array, no explanations.
"#;

const EXAM_QUESTIONS_PROMPT: &str = r#"
You are a study assistant. From the provided study material, predict the most likely exam questions.
The output MUST be a single valid JSON array. Each element has keys:
- "id": short unique string
- "question": the question text
- "type": one of "short_answer", "long_answer", "hots"
- "probability_score": likelihood of appearing in an exam, a number between 0 and 1
- "difficulty": one of "easy", "medium", "hard"
- "keywords": array of key terms the answer should contain
Return ONLY the JSON array, no explanations.
"#;

const SUMMARY_PROMPT: &str = r#"
You are a study assistant. Summarize the provided video transcript for a student:
a short overview paragraph followed by the key points. Respond in plain text.
"#;

// Las transcripciones largas se recortan para caber en el contexto del modelo.
const MAX_TRANSCRIPT_CHARS: usize = 24_000;

/// Gestor de LLMs.
#[derive(Debug, Clone)]
pub struct LlmManager {
    pub provider: LlmProvider,
    pub chat_model: String,
}

impl LlmManager {
    /// Construye el manager a partir de la configuración.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        Ok(Self {
            provider: cfg.llm_provider.clone(),
            chat_model: cfg.llm_chat_model.clone(),
        })
    }

    // ---------------------------------------------------------------------
    // GENERADORES DE MATERIAL DE ESTUDIO
    // ---------------------------------------------------------------------

    pub async fn generate_flashcards(&self, content: &str) -> Result<Vec<Flashcard>> {
        let raw = self.complete(FLASHCARDS_PROMPT, content).await?;
        let mut cards: Vec<Flashcard> = parse_generated(&raw)?;
        for card in &mut cards {
            ensure_id(&mut card.id);
        }
        Ok(cards)
    }

    pub async fn generate_mcqs(&self, content: &str) -> Result<Vec<Mcq>> {
        let raw = self.complete(MCQS_PROMPT, content).await?;
        let mut mcqs: Vec<Mcq> = parse_generated(&raw)?;
        for mcq in &mut mcqs {
            ensure_id(&mut mcq.id);
        }
        check_mcq_bounds(&mcqs)?;
        Ok(mcqs)
    }

    pub async fn generate_mind_map(&self, content: &str) -> Result<MindMapNode> {
        let raw = self.complete(MIND_MAP_PROMPT, content).await?;
        let mut root: MindMapNode = parse_generated(&raw)?;
        normalize_tree(&mut root, 0);
        Ok(root)
    }

    pub async fn generate_learning_path(&self, content: &str) -> Result<Vec<LearningStep>> {
        let raw = self.complete(LEARNING_PATH_PROMPT, content).await?;
        let mut steps: Vec<LearningStep> = parse_generated(&raw)?;
        renumber_steps(&mut steps);
        Ok(steps)
    }

    pub async fn generate_sticky_notes(&self, content: &str) -> Result<Vec<StickyNote>> {
        let raw = self.complete(STICKY_NOTES_PROMPT, content).await?;
        let mut notes: Vec<StickyNote> = parse_generated(&raw)?;
        for note in &mut notes {
            ensure_id(&mut note.id);
        }
        Ok(notes)
    }

    pub async fn generate_exam_questions(&self, content: &str) -> Result<Vec<ExamQuestion>> {
        let raw = self.complete(EXAM_QUESTIONS_PROMPT, content).await?;
        let mut questions: Vec<ExamQuestion> = parse_generated(&raw)?;
        for question in &mut questions {
            ensure_id(&mut question.id);
        }
        Ok(questions)
    }

    /// Resume una transcripción de vídeo a texto plano.
    pub async fn summarize_transcript(&self, transcript: &str) -> Result<String> {
        let clipped = clip_chars(transcript, MAX_TRANSCRIPT_CHARS);
        self.complete(SUMMARY_PROMPT, clipped).await
    }

    // ---------------------------------------------------------------------
    // COMPLETION
    // ---------------------------------------------------------------------

    async fn complete(&self, preamble: &str, content: &str) -> Result<String> {
        match self.provider {
            LlmProvider::OpenAI => self.complete_with_openai(preamble, content).await,
            ref other => Err(anyhow!(
                "Proveedor LLM {:?} aún no implementado para generación",
                other
            )),
        }
    }

    async fn complete_with_openai(&self, preamble: &str, content: &str) -> Result<String> {
        use rig::providers::openai;
        // Trait para client.agent(...)
        use rig::client::CompletionClient as _;

        let client = openai::Client::from_env();

        // Modelo de chat por defecto si no se ha configurado otro
        let model_name = if self.chat_model.is_empty() {
            "gpt-4o-mini"
        } else {
            self.chat_model.as_str()
        };

        let agent = client.agent(model_name).preamble(preamble).build();
        let answer = agent.prompt(content).await?;
        Ok(answer)
    }
}

// --- Limpieza y normalización de la salida del modelo ---

/// Limpia la respuesta del LLM para asegurar que solo contenga el JSON.
fn clean_json_response(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

fn parse_generated<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let cleaned = clean_json_response(raw);
    serde_json::from_str(cleaned).map_err(|e| {
        warn!(
            "No se pudo parsear la salida del LLM: {}. Respuesta: '{}'",
            e,
            clip_chars(raw, 400)
        );
        anyhow!("the model returned malformed JSON: {e}")
    })
}

fn ensure_id(id: &mut String) {
    if id.trim().is_empty() {
        *id = Uuid::new_v4().to_string();
    }
}

/// Contrato del generador de MCQs: el índice correcto siempre apunta a una opción.
fn check_mcq_bounds(mcqs: &[Mcq]) -> Result<()> {
    if let Some(bad) = mcqs.iter().find(|m| m.correct_answer >= m.options.len()) {
        return Err(anyhow!(
            "question '{}' has correct_answer {} but only {} options",
            bad.id,
            bad.correct_answer,
            bad.options.len()
        ));
    }
    Ok(())
}

/// Renumera `level` con la profundidad real del árbol (raíz = 0) y rellena
/// ids ausentes.
fn normalize_tree(node: &mut MindMapNode, depth: u32) {
    ensure_id(&mut node.id);
    node.level = depth;
    for child in &mut node.children {
        normalize_tree(child, depth + 1);
    }
}

/// Ordena los pasos y fuerza una numeración contigua 1..=n.
fn renumber_steps(steps: &mut [LearningStep]) {
    steps.sort_by_key(|s| s.step_number);
    for (index, step) in steps.iter_mut().enumerate() {
        step.step_number = index as u32 + 1;
    }
}

fn clip_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
