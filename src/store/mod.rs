use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDateTime;
use diesel::sqlite::SqliteConnection;
use diesel::QueryableByName;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::RunQueryDsl;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use serde::{Deserialize, Serialize};

use crate::error::{ReachPosterError, Result};

mod pending;
mod posts;
pub mod schema;
mod schedules;

pub use pending::NewPending;
pub use posts::NewPost;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

type SqliteAsyncConn = SyncConnectionWrapper<SqliteConnection>;
type SqlitePool = Pool<SqliteAsyncConn>;
type SqlitePooledConn<'a> = PooledConnection<'a, SqliteAsyncConn>;

pub const DEFAULT_SCHEDULE_NAME: &str = "My Schedule";
pub const DEFAULT_TIME_OF_DAY: &str = "09:00";
pub const DEFAULT_DAYS_OF_WEEK: &str = "0,1,2,3,4,5,6";
pub const LOCAL_MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Posted,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Posted => "posted",
        }
    }
}

impl std::str::FromStr for PostStatus {
    type Err = ReachPosterError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "draft" => Ok(PostStatus::Draft),
            "scheduled" => Ok(PostStatus::Scheduled),
            "posted" => Ok(PostStatus::Posted),
            other => Err(ReachPosterError::Validation(format!(
                "unknown post status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    Same,
    Different,
    Mixed,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Same => "same",
            ThemeMode::Different => "different",
            ThemeMode::Mixed => "mixed",
        }
    }
}

impl std::str::FromStr for ThemeMode {
    type Err = ReachPosterError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "same" => Ok(ThemeMode::Same),
            "different" => Ok(ThemeMode::Different),
            "mixed" => Ok(ThemeMode::Mixed),
            other => Err(ReachPosterError::Validation(format!(
                "theme_mode must be one of same, different, mixed (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingStatus {
    PendingReview,
    Approved,
    Rejected,
}

impl PendingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PendingStatus::PendingReview => "pending_review",
            PendingStatus::Approved => "approved",
            PendingStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for PendingStatus {
    type Err = ReachPosterError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "pending_review" => Ok(PendingStatus::PendingReview),
            "approved" => Ok(PendingStatus::Approved),
            "rejected" => Ok(PendingStatus::Rejected),
            other => Err(ReachPosterError::Validation(format!(
                "unknown pending status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: i32,
    pub theme: String,
    pub caption: String,
    pub image_url: String,
    pub scheduled_time: Option<String>,
    pub status: PostStatus,
    pub created_at: i64,
    pub schedule_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleTime {
    pub id: i32,
    pub time_of_day: String,
    pub days_of_week: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Schedule {
    pub id: i32,
    pub name: String,
    pub is_active: bool,
    pub theme_mode: ThemeMode,
    pub auto_post: bool,
    pub created_at: i64,
    pub times: Vec<ScheduleTime>,
    /// Ordered by `use_order`.
    pub themes: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeSlotInput {
    pub time: Option<String>,
    pub days: Option<String>,
}

/// Create/update payload for a schedule. Omitted fields take the documented defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleInput {
    pub name: Option<String>,
    pub theme_mode: Option<String>,
    #[serde(default)]
    pub auto_post: bool,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub times: Vec<TimeSlotInput>,
    #[serde(default)]
    pub themes: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct ValidatedSchedule {
    pub name: String,
    pub theme_mode: ThemeMode,
    pub auto_post: bool,
    pub is_active: bool,
    pub times: Vec<(String, String)>,
    pub themes: Vec<String>,
}

impl ScheduleInput {
    pub(crate) fn validate(&self) -> Result<ValidatedSchedule> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_SCHEDULE_NAME)
            .to_string();
        let theme_mode = match self.theme_mode.as_deref().map(str::trim) {
            None | Some("") => ThemeMode::Same,
            Some(raw) => raw.parse()?,
        };

        let mut times = Vec::with_capacity(self.times.len());
        for slot in &self.times {
            let time = slot
                .time
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_TIME_OF_DAY);
            let days = slot
                .days
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or(DEFAULT_DAYS_OF_WEEK);
            times.push((
                crate::scheduler::due::normalize_time_of_day(time)?,
                crate::scheduler::due::normalize_days_of_week(days)?,
            ));
        }

        let themes = self
            .themes
            .iter()
            .map(|theme| theme.trim().to_string())
            .filter(|theme| !theme.is_empty())
            .collect();

        Ok(ValidatedSchedule {
            name,
            theme_mode,
            auto_post: self.auto_post,
            is_active: self.is_active.unwrap_or(true),
            times,
            themes,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingPost {
    pub id: i32,
    pub schedule_id: Option<i32>,
    pub schedule_name: Option<String>,
    pub theme: String,
    pub caption: String,
    pub image_url: String,
    pub scheduled_for: String,
    pub status: PendingStatus,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarEventKind {
    Post,
    Pending,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarEvent {
    pub id: i32,
    pub theme: String,
    pub scheduled_time: String,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: CalendarEventKind,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardCounts {
    pub total_posts: i64,
    pub scheduled_posts: i64,
    pub draft_posts: i64,
    pub pending_count: i64,
    pub active_schedules: i64,
    pub posts_this_week: i64,
}

pub struct ContentStore {
    pool: SqlitePool,
}

impl ContentStore {
    pub async fn new(sqlite_path: impl AsRef<str>) -> Result<Self> {
        let sqlite_path = sqlite_path.as_ref();
        ensure_parent_dir(sqlite_path)?;
        run_migrations(sqlite_path).await?;

        let manager = AsyncDieselConnectionManager::<SqliteAsyncConn>::new(sqlite_path);
        let pool: SqlitePool = Pool::builder()
            .build(manager)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        tracing::debug!(db_path = sqlite_path, "Content store ready");
        Ok(Self { pool })
    }

    pub async fn dashboard_counts(&self, now_ts: i64) -> Result<DashboardCounts> {
        let week_ago = now_ts - 7 * 24 * 60 * 60;
        Ok(DashboardCounts {
            total_posts: self.count_posts(None).await?,
            scheduled_posts: self.count_posts(Some(PostStatus::Scheduled)).await?,
            draft_posts: self.count_posts(Some(PostStatus::Draft)).await?,
            pending_count: self.count_pending_review().await?,
            active_schedules: self.count_active_schedules().await?,
            posts_this_week: self.count_posts_since(week_ago).await?,
        })
    }

    async fn conn(&self) -> Result<SqlitePooledConn<'_>> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        crate::db::apply_pragmas_async(&mut conn).await?;
        Ok(conn)
    }
}

#[derive(QueryableByName)]
struct RowId {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    id: i64,
}

/// Id of the row just inserted on `conn`. Must run on the connection that did the insert.
async fn last_insert_id(conn: &mut SqlitePooledConn<'_>) -> Result<i32> {
    let row: RowId = diesel::sql_query("SELECT last_insert_rowid() as id")
        .get_result(conn)
        .await
        .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
    i32::try_from(row.id).map_err(|e| ReachPosterError::Runtime(e.to_string()))
}

/// Accepts `YYYY-MM-DD HH:MM`, the `T`-separated browser form, and either with seconds.
pub fn normalize_scheduled_time(raw: &str) -> Result<String> {
    let raw = raw.trim();
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|parsed| parsed.format(LOCAL_MINUTE_FORMAT).to_string())
        .ok_or_else(|| {
            ReachPosterError::Validation(format!(
                "scheduled_time must look like YYYY-MM-DD HH:MM (got '{raw}')"
            ))
        })
}

pub(crate) fn now_ts() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

fn ensure_parent_dir(path: &str) -> Result<()> {
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        }
    }
    Ok(())
}

async fn run_migrations(database_url: &str) -> Result<()> {
    let database_url = database_url.to_string();
    tokio::task::spawn_blocking(move || {
        let mut conn = crate::db::open_connection_sync(&database_url)?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        Ok::<_, ReachPosterError>(())
    })
    .await
    .map_err(|e| ReachPosterError::Runtime(e.to_string()))??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduled_time_accepts_browser_and_plain_forms() {
        assert_eq!(
            normalize_scheduled_time("2026-10-19T09:30").expect("T form"),
            "2026-10-19 09:30"
        );
        assert_eq!(
            normalize_scheduled_time(" 2026-10-19 09:30:59 ").expect("seconds"),
            "2026-10-19 09:30"
        );
        assert!(normalize_scheduled_time("tomorrow at nine").is_err());
    }

    #[test]
    fn schedule_input_applies_defaults() {
        let input = ScheduleInput {
            times: vec![TimeSlotInput::default()],
            themes: vec!["  Hope lives here ".to_string(), "   ".to_string()],
            ..ScheduleInput::default()
        };
        let validated = input.validate().expect("valid");
        assert_eq!(validated.name, DEFAULT_SCHEDULE_NAME);
        assert_eq!(validated.theme_mode, ThemeMode::Same);
        assert!(validated.is_active);
        assert_eq!(
            validated.times,
            vec![(
                DEFAULT_TIME_OF_DAY.to_string(),
                DEFAULT_DAYS_OF_WEEK.to_string()
            )]
        );
        assert_eq!(validated.themes, vec!["Hope lives here".to_string()]);
    }

    #[test]
    fn schedule_input_rejects_unknown_mode_and_bad_time() {
        let bad_mode = ScheduleInput {
            theme_mode: Some("random".to_string()),
            ..ScheduleInput::default()
        };
        assert!(matches!(
            bad_mode.validate(),
            Err(ReachPosterError::Validation(_))
        ));

        let bad_time = ScheduleInput {
            times: vec![TimeSlotInput {
                time: Some("25:00".to_string()),
                days: None,
            }],
            ..ScheduleInput::default()
        };
        assert!(matches!(
            bad_time.validate(),
            Err(ReachPosterError::Validation(_))
        ));
    }
}
