//! Interview sessions: creation with the free-tier daily limit, owner-only
//! reads, and opaque storage of voice-AI call identifiers.
//!
//! Storage sits behind the `InterviewStore` trait. `AppState` carries an
//! `Arc<dyn InterviewStore>`; production uses `PgInterviewStore`.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::flow::greeting_message;
use crate::models::interview::InterviewRow;
use crate::models::user::UserRow;

/// Interviews a free-tier user may start per UTC day.
pub const FREE_DAILY_INTERVIEW_LIMIT: i64 = 1;

// ────────────────────────────────────────────────────────────────────────────
// Enumerations stored as text
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
            Difficulty::Expert => "expert",
        }
    }
}

impl FromStr for Difficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            "expert" => Ok(Difficulty::Expert),
            other => Err(AppError::Validation(format!(
                "unknown difficulty '{other}'; expected beginner, intermediate, advanced or expert"
            ))),
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    InProgress,
    Completed,
    Cancelled,
}

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::InProgress => "in_progress",
            InterviewStatus::Completed => "completed",
            InterviewStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionTier {
    Free,
    Pro,
    Enterprise,
}

impl SubscriptionTier {
    /// Unknown tier labels are treated as free.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "pro" => SubscriptionTier::Pro,
            "enterprise" => SubscriptionTier::Enterprise,
            _ => SubscriptionTier::Free,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Storage seam
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewInterview {
    pub user_id: Uuid,
    pub role: String,
    pub difficulty: Difficulty,
    pub language: String,
    pub started_at: DateTime<Utc>,
}

/// At most `max` interviews may start in `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCap {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub max: i64,
}

impl DailyCap {
    pub fn check(&self, started: i64) -> Result<(), AppError> {
        if started >= self.max {
            return Err(AppError::Forbidden(
                "Daily interview limit reached. Upgrade to Pro for unlimited interviews."
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
pub trait InterviewStore: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserRow>, AppError>;

    /// Inserts a new interview. With a `cap`, the count of the user's
    /// interviews in the window and the insert happen atomically, so
    /// concurrent creates cannot both slip under the limit.
    async fn insert_interview(
        &self,
        new: NewInterview,
        cap: Option<DailyCap>,
    ) -> Result<InterviewRow, AppError>;

    async fn find_interview(&self, id: Uuid) -> Result<Option<InterviewRow>, AppError>;

    async fn set_voice_call(
        &self,
        id: Uuid,
        call_id: &str,
        assistant_id: Option<&str>,
    ) -> Result<InterviewRow, AppError>;
}

pub struct PgInterviewStore {
    pool: PgPool,
}

impl PgInterviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InterviewStore for PgInterviewStore {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserRow>, AppError> {
        let user = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, subscription_tier, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert_interview(
        &self,
        new: NewInterview,
        cap: Option<DailyCap>,
    ) -> Result<InterviewRow, AppError> {
        let mut tx = self.pool.begin().await?;

        if let Some(cap) = cap {
            // Row lock on the user serializes concurrent creates for them.
            sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
                .bind(new.user_id)
                .execute(&mut *tx)
                .await?;

            let started: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM interviews WHERE user_id = $1 AND started_at >= $2 AND started_at < $3",
            )
            .bind(new.user_id)
            .bind(cap.from)
            .bind(cap.to)
            .fetch_one(&mut *tx)
            .await?;
            cap.check(started)?;
        }

        let row = sqlx::query_as::<_, InterviewRow>(
            r#"
            INSERT INTO interviews
                (id, user_id, role, difficulty, language, status, started_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(&new.role)
        .bind(new.difficulty.as_str())
        .bind(&new.language)
        .bind(InterviewStatus::InProgress.as_str())
        .bind(new.started_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn find_interview(&self, id: Uuid) -> Result<Option<InterviewRow>, AppError> {
        let row = sqlx::query_as::<_, InterviewRow>("SELECT * FROM interviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn set_voice_call(
        &self,
        id: Uuid,
        call_id: &str,
        assistant_id: Option<&str>,
    ) -> Result<InterviewRow, AppError> {
        let row = sqlx::query_as::<_, InterviewRow>(
            r#"
            UPDATE interviews
            SET voice_call_id = $2,
                voice_assistant_id = COALESCE($3, voice_assistant_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(call_id)
        .bind(assistant_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Session operations
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateInterviewRequest {
    pub user_id: Uuid,
    pub role: String,
    pub difficulty: String,
    pub language: String,
    pub candidate_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateInterviewResponse {
    pub id: Uuid,
    pub message: String,
    pub greeting: String,
}

#[derive(Debug, Deserialize)]
pub struct VoiceCallRequest {
    pub user_id: Uuid,
    pub call_id: String,
    pub assistant_id: Option<String>,
}

/// `[00:00, 24:00)` of the UTC day containing `now`.
pub fn day_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

/// The creation cap for `tier` on the UTC day containing `now`; paid tiers have none.
pub fn daily_cap(tier: SubscriptionTier, now: DateTime<Utc>) -> Option<DailyCap> {
    if tier != SubscriptionTier::Free {
        return None;
    }
    let (from, to) = day_window(now);
    Some(DailyCap {
        from,
        to,
        max: FREE_DAILY_INTERVIEW_LIMIT,
    })
}

pub async fn create_interview(
    store: &dyn InterviewStore,
    request: CreateInterviewRequest,
    now: DateTime<Utc>,
) -> Result<CreateInterviewResponse, AppError> {
    if request.role.trim().is_empty() {
        return Err(AppError::Validation("role cannot be empty".to_string()));
    }
    if request.language.trim().is_empty() {
        return Err(AppError::Validation("language cannot be empty".to_string()));
    }
    let difficulty: Difficulty = request.difficulty.parse()?;

    let user = store
        .find_user(request.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", request.user_id)))?;

    let tier = SubscriptionTier::from_label(&user.subscription_tier);
    let new = NewInterview {
        user_id: user.id,
        role: request.role.trim().to_string(),
        difficulty,
        language: request.language.trim().to_string(),
        started_at: now,
    };
    let interview = store.insert_interview(new, daily_cap(tier, now)).await?;

    info!(
        "Interview {} started for user {} ({} / {})",
        interview.id,
        user.id,
        interview.role,
        difficulty.as_str()
    );

    Ok(CreateInterviewResponse {
        id: interview.id,
        message: "Interview started".to_string(),
        greeting: greeting_message(
            request.candidate_name.as_deref(),
            Some(&interview.role),
            Some(difficulty.as_str()),
        ),
    })
}

/// Fetches an interview, refusing access to anyone but its owner.
pub async fn get_owned_interview(
    store: &dyn InterviewStore,
    id: Uuid,
    user_id: Uuid,
) -> Result<InterviewRow, AppError> {
    let interview = store
        .find_interview(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))?;

    if interview.user_id != user_id {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }
    Ok(interview)
}

pub async fn attach_voice_call(
    store: &dyn InterviewStore,
    id: Uuid,
    request: VoiceCallRequest,
) -> Result<InterviewRow, AppError> {
    if request.call_id.trim().is_empty() {
        return Err(AppError::Validation("call_id cannot be empty".to_string()));
    }
    get_owned_interview(store, id, request.user_id).await?;
    store
        .set_voice_call(id, &request.call_id, request.assistant_id.as_deref())
        .await
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory store for tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod memory {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub(crate) struct MemoryInterviewStore {
        pub users: Mutex<Vec<UserRow>>,
        pub interviews: Mutex<Vec<InterviewRow>>,
    }

    impl MemoryInterviewStore {
        pub fn with_user(tier: &str) -> (Self, Uuid) {
            let store = Self::default();
            let id = store.add_user(tier);
            (store, id)
        }

        pub fn add_user(&self, tier: &str) -> Uuid {
            let id = Uuid::new_v4();
            self.users.lock().unwrap().push(UserRow {
                id,
                email: format!("{id}@example.com"),
                subscription_tier: tier.to_string(),
                created_at: Utc::now(),
            });
            id
        }
    }

    #[async_trait]
    impl InterviewStore for MemoryInterviewStore {
        async fn find_user(&self, user_id: Uuid) -> Result<Option<UserRow>, AppError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == user_id)
                .cloned())
        }

        async fn insert_interview(
            &self,
            new: NewInterview,
            cap: Option<DailyCap>,
        ) -> Result<InterviewRow, AppError> {
            let mut interviews = self.interviews.lock().unwrap();
            if let Some(cap) = cap {
                let started = interviews
                    .iter()
                    .filter(|i| {
                        i.user_id == new.user_id && i.started_at >= cap.from && i.started_at < cap.to
                    })
                    .count() as i64;
                cap.check(started)?;
            }

            let row = InterviewRow {
                id: Uuid::new_v4(),
                user_id: new.user_id,
                role: new.role,
                difficulty: new.difficulty.as_str().to_string(),
                language: new.language,
                status: InterviewStatus::InProgress.as_str().to_string(),
                overall_score: None,
                started_at: new.started_at,
                completed_at: None,
                duration_minutes: None,
                voice_call_id: None,
                voice_assistant_id: None,
                recording_url: None,
                transcript: None,
                created_at: new.started_at,
                updated_at: new.started_at,
            };
            interviews.push(row.clone());
            Ok(row)
        }

        async fn find_interview(&self, id: Uuid) -> Result<Option<InterviewRow>, AppError> {
            Ok(self
                .interviews
                .lock()
                .unwrap()
                .iter()
                .find(|i| i.id == id)
                .cloned())
        }

        async fn set_voice_call(
            &self,
            id: Uuid,
            call_id: &str,
            assistant_id: Option<&str>,
        ) -> Result<InterviewRow, AppError> {
            let mut interviews = self.interviews.lock().unwrap();
            let row = interviews
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))?;
            row.voice_call_id = Some(call_id.to_string());
            if let Some(assistant_id) = assistant_id {
                row.voice_assistant_id = Some(assistant_id.to_string());
            }
            row.updated_at = Utc::now();
            Ok(row.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryInterviewStore;
    use super::*;
    use chrono::TimeZone;

    fn request(user_id: Uuid) -> CreateInterviewRequest {
        CreateInterviewRequest {
            user_id,
            role: "Backend".to_string(),
            difficulty: "BEGINNER".to_string(),
            language: "english".to_string(),
            candidate_name: Some("Ada".to_string()),
        }
    }

    fn noon(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_difficulty_parse_is_case_insensitive() {
        assert_eq!("Expert".parse::<Difficulty>().unwrap(), Difficulty::Expert);
        assert_eq!(" beginner ".parse::<Difficulty>().unwrap(), Difficulty::Beginner);
        assert!(matches!(
            "wizard".parse::<Difficulty>(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_tier_is_free() {
        assert_eq!(SubscriptionTier::from_label("PRO"), SubscriptionTier::Pro);
        assert_eq!(
            SubscriptionTier::from_label("enterprise"),
            SubscriptionTier::Enterprise
        );
        assert_eq!(SubscriptionTier::from_label("trial"), SubscriptionTier::Free);
    }

    #[test]
    fn test_day_window_spans_utc_calendar_day() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 23, 59, 59).unwrap();
        let (from, to) = day_window(now);
        assert_eq!(from, Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_daily_cap_only_applies_to_free_tier() {
        let now = noon(2);
        let cap = daily_cap(SubscriptionTier::Free, now).unwrap();
        assert_eq!((cap.from, cap.to), day_window(now));
        assert!(cap.check(0).is_ok());
        assert!(matches!(cap.check(1), Err(AppError::Forbidden(_))));
        assert!(daily_cap(SubscriptionTier::Pro, now).is_none());
        assert!(daily_cap(SubscriptionTier::Enterprise, now).is_none());
    }

    #[tokio::test]
    async fn test_create_interview_returns_greeting() {
        let (store, user_id) = MemoryInterviewStore::with_user("free");
        let response = create_interview(&store, request(user_id), noon(2)).await.unwrap();

        assert_eq!(response.message, "Interview started");
        assert!(response.greeting.starts_with("Hello Ada!"));
        assert!(response.greeting.contains("for the Backend position at beginner level"));

        let stored = store.interviews.lock().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].difficulty, "beginner");
        assert_eq!(stored[0].status, "in_progress");
    }

    #[tokio::test]
    async fn test_free_user_limited_to_one_per_day() {
        let (store, user_id) = MemoryInterviewStore::with_user("free");
        create_interview(&store, request(user_id), noon(2)).await.unwrap();

        let second = create_interview(&store, request(user_id), noon(2)).await;
        match second {
            Err(AppError::Forbidden(msg)) => assert!(msg.contains("Daily interview limit")),
            other => panic!("expected Forbidden, got {other:?}"),
        }

        // Next day is allowed again.
        assert!(create_interview(&store, request(user_id), noon(3)).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_respect_free_limit() {
        let (store, user_id) = MemoryInterviewStore::with_user("free");
        let store = std::sync::Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = std::sync::Arc::clone(&store);
                tokio::spawn(async move {
                    create_interview(store.as_ref(), request(user_id), noon(2)).await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(AppError::Forbidden(_)) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.interviews.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_pro_user_is_unlimited() {
        let (store, user_id) = MemoryInterviewStore::with_user("pro");
        for _ in 0..3 {
            create_interview(&store, request(user_id), noon(2)).await.unwrap();
        }
        assert_eq!(store.interviews.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_create_interview_unknown_user() {
        let store = MemoryInterviewStore::default();
        let result = create_interview(&store, request(Uuid::new_v4()), noon(2)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_interview_validates_input() {
        let (store, user_id) = MemoryInterviewStore::with_user("free");
        let mut bad = request(user_id);
        bad.difficulty = "legendary".to_string();
        assert!(matches!(
            create_interview(&store, bad, noon(2)).await,
            Err(AppError::Validation(_))
        ));

        let mut blank_role = request(user_id);
        blank_role.role = "  ".to_string();
        assert!(matches!(
            create_interview(&store, blank_role, noon(2)).await,
            Err(AppError::Validation(_))
        ));
        assert!(store.interviews.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_only_owner_can_read_interview() {
        let (store, owner) = MemoryInterviewStore::with_user("pro");
        let intruder = store.add_user("pro");
        let created = create_interview(&store, request(owner), noon(2)).await.unwrap();

        let row = get_owned_interview(&store, created.id, owner).await.unwrap();
        assert_eq!(row.user_id, owner);

        assert!(matches!(
            get_owned_interview(&store, created.id, intruder).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            get_owned_interview(&store, Uuid::new_v4(), owner).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_attach_voice_call_stores_ids_opaquely() {
        let (store, owner) = MemoryInterviewStore::with_user("pro");
        let created = create_interview(&store, request(owner), noon(2)).await.unwrap();

        let row = attach_voice_call(
            &store,
            created.id,
            VoiceCallRequest {
                user_id: owner,
                call_id: "call_9f8e-opaque".to_string(),
                assistant_id: Some("asst-1".to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(row.voice_call_id.as_deref(), Some("call_9f8e-opaque"));
        assert_eq!(row.voice_assistant_id.as_deref(), Some("asst-1"));
    }

    #[tokio::test]
    async fn test_attach_voice_call_requires_owner() {
        let (store, owner) = MemoryInterviewStore::with_user("pro");
        let intruder = store.add_user("free");
        let created = create_interview(&store, request(owner), noon(2)).await.unwrap();

        let result = attach_voice_call(
            &store,
            created.id,
            VoiceCallRequest {
                user_id: intruder,
                call_id: "call-x".to_string(),
                assistant_id: None,
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
