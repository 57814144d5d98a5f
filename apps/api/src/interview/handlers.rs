//! Axum route handlers for questions, answer checks and interview sessions.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::classifier::{
    classify, is_low_knowledge, is_off_topic, is_profane, ClassificationResult,
};
use crate::interview::evaluation::{evaluate_answer, AnswerEvaluation};
use crate::interview::flow::{first_question, next_question_by_keywords};
use crate::interview::question_bank::{Question, QuestionBank};
use crate::interview::sessions::{
    attach_voice_call, create_interview, get_owned_interview, CreateInterviewRequest,
    CreateInterviewResponse, VoiceCallRequest,
};
use crate::models::interview::InterviewRow;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QuestionQuery {
    pub domain: String,
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct ShuffledQuery {
    pub domain: String,
    pub level: String,
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<Question>,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    /// domain → levels, both lowercase and sorted
    pub domains: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct NextQuestionRequest {
    pub domain: String,
    pub level: String,
    pub current_question_id: i64,
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct NextQuestionResponse {
    pub question: Option<Question>,
}

/// Points at a catalog question whose keywords / expected answers should be used.
#[derive(Debug, Deserialize)]
pub struct QuestionRef {
    pub domain: String,
    pub level: String,
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub answer: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub question: Option<QuestionRef>,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub profane: bool,
    pub low_knowledge: bool,
    pub off_topic: bool,
    pub verdict: ClassificationResult,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub answer: String,
    #[serde(default)]
    pub expected_answers: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub question: Option<QuestionRef>,
}

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn require_pair(domain: &str, level: &str) -> Result<(), AppError> {
    if domain.trim().is_empty() || level.trim().is_empty() {
        return Err(AppError::Validation(
            "domain and level cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn resolve_question<'a>(
    bank: &'a QuestionBank,
    question: &QuestionRef,
) -> Result<&'a Question, AppError> {
    require_pair(&question.domain, &question.level)?;
    bank.get_questions(&question.domain, &question.level)
        .iter()
        .find(|q| q.id() == Some(question.id))
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Question {} not found in {}/{}",
                question.id, question.domain, question.level
            ))
        })
}

// ────────────────────────────────────────────────────────────────────────────
// Question handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/questions?domain=&level=
pub async fn handle_get_questions(
    State(state): State<AppState>,
    Query(params): Query<QuestionQuery>,
) -> Result<Json<QuestionsResponse>, AppError> {
    require_pair(&params.domain, &params.level)?;
    let questions = state
        .question_bank
        .get_questions(&params.domain, &params.level)
        .to_vec();
    Ok(Json(QuestionsResponse { questions }))
}

/// GET /api/v1/questions/shuffled?domain=&level=&count=
///
/// Seeds a session with a random subset. `count` defaults to
/// `DEFAULT_QUESTION_COUNT`.
pub async fn handle_get_shuffled_questions(
    State(state): State<AppState>,
    Query(params): Query<ShuffledQuery>,
) -> Result<Json<QuestionsResponse>, AppError> {
    require_pair(&params.domain, &params.level)?;
    let count = params.count.unwrap_or(state.config.default_question_count);
    if count == 0 {
        return Err(AppError::Validation("count must be at least 1".to_string()));
    }

    let questions = state
        .question_bank
        .get_shuffled_questions(&params.domain, &params.level, count);
    Ok(Json(QuestionsResponse { questions }))
}

/// GET /api/v1/questions/catalog
pub async fn handle_get_catalog(State(state): State<AppState>) -> Json<CatalogResponse> {
    let bank = &state.question_bank;
    let domains = bank
        .domains()
        .into_iter()
        .map(|domain| {
            let levels = bank.levels(&domain);
            (domain, levels)
        })
        .collect();
    Json(CatalogResponse { domains })
}

/// GET /api/v1/questions/first?domain=&level=
pub async fn handle_first_question(
    State(state): State<AppState>,
    Query(params): Query<QuestionQuery>,
) -> Result<Json<Question>, AppError> {
    require_pair(&params.domain, &params.level)?;
    let questions = state
        .question_bank
        .get_questions(&params.domain, &params.level);
    first_question(questions).cloned().map(Json).ok_or_else(|| {
        AppError::NotFound(format!(
            "No questions for {}/{}",
            params.domain, params.level
        ))
    })
}

/// POST /api/v1/questions/next
///
/// Keyword-routed next question. `question: null` means the session is over.
pub async fn handle_next_question(
    State(state): State<AppState>,
    Json(request): Json<NextQuestionRequest>,
) -> Result<Json<NextQuestionResponse>, AppError> {
    require_pair(&request.domain, &request.level)?;
    let questions = state
        .question_bank
        .get_questions(&request.domain, &request.level);
    let question =
        next_question_by_keywords(questions, request.current_question_id, &request.answer)
            .cloned();
    Ok(Json(NextQuestionResponse { question }))
}

// ────────────────────────────────────────────────────────────────────────────
// Answer handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/answers/classify
///
/// Returns every flag plus the prioritized verdict. Keywords come from the
/// request, or from the referenced catalog question when none are given.
pub async fn handle_classify_answer(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, AppError> {
    let keywords = match (&request.question, request.keywords.is_empty()) {
        (Some(question), true) => resolve_question(&state.question_bank, question)?.keywords(),
        _ => request.keywords,
    };

    Ok(Json(ClassifyResponse {
        profane: is_profane(&request.answer),
        low_knowledge: is_low_knowledge(&request.answer),
        off_topic: is_off_topic(&request.answer, &keywords),
        verdict: classify(&request.answer, &keywords),
    }))
}

/// POST /api/v1/answers/evaluate
pub async fn handle_evaluate_answer(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<AnswerEvaluation>, AppError> {
    let (expected_answers, keywords) = match &request.question {
        Some(question_ref) => {
            let question = resolve_question(&state.question_bank, question_ref)?;
            let expected = if request.expected_answers.is_empty() {
                question.expected_answers()
            } else {
                request.expected_answers
            };
            let keywords = if request.keywords.is_empty() {
                question.keywords()
            } else {
                request.keywords
            };
            (expected, keywords)
        }
        None => (request.expected_answers, request.keywords),
    };

    Ok(Json(evaluate_answer(
        &request.answer,
        &expected_answers,
        &keywords,
    )))
}

// ────────────────────────────────────────────────────────────────────────────
// Interview session handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/interviews
pub async fn handle_create_interview(
    State(state): State<AppState>,
    Json(request): Json<CreateInterviewRequest>,
) -> Result<Json<CreateInterviewResponse>, AppError> {
    let response = create_interview(state.interviews.as_ref(), request, Utc::now()).await?;
    Ok(Json(response))
}

/// GET /api/v1/interviews/:id?user_id=
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<InterviewRow>, AppError> {
    let interview = get_owned_interview(state.interviews.as_ref(), id, params.user_id).await?;
    Ok(Json(interview))
}

/// PATCH /api/v1/interviews/:id/voice-call
pub async fn handle_attach_voice_call(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<VoiceCallRequest>,
) -> Result<Json<InterviewRow>, AppError> {
    let interview = attach_voice_call(state.interviews.as_ref(), id, request).await?;
    Ok(Json(interview))
}
