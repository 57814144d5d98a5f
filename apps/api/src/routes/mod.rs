pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Question bank
        .route("/api/v1/questions", get(handlers::handle_get_questions))
        .route(
            "/api/v1/questions/shuffled",
            get(handlers::handle_get_shuffled_questions),
        )
        .route("/api/v1/questions/catalog", get(handlers::handle_get_catalog))
        .route("/api/v1/questions/first", get(handlers::handle_first_question))
        .route("/api/v1/questions/next", post(handlers::handle_next_question))
        // Answer checks
        .route(
            "/api/v1/answers/classify",
            post(handlers::handle_classify_answer),
        )
        .route(
            "/api/v1/answers/evaluate",
            post(handlers::handle_evaluate_answer),
        )
        // Interview sessions
        .route("/api/v1/interviews", post(handlers::handle_create_interview))
        .route("/api/v1/interviews/:id", get(handlers::handle_get_interview))
        .route(
            "/api/v1/interviews/:id/voice-call",
            patch(handlers::handle_attach_voice_call),
        )
        .with_state(state)
}
