use std::sync::Arc;

use crate::config::Config;
use crate::interview::question_bank::QuestionBank;
use crate::interview::sessions::InterviewStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Process-wide question catalog, loaded once.
    pub question_bank: Arc<QuestionBank>,
    /// Interview session storage. Default: PgInterviewStore.
    pub interviews: Arc<dyn InterviewStore>,
}
