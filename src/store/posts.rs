use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::schema::{pending_posts, posts};
use super::{
    last_insert_id, now_ts, CalendarEvent, CalendarEventKind, ContentStore, PendingStatus, Post,
    PostStatus,
};
use crate::error::{ReachPosterError, Result};

#[derive(Queryable)]
pub(super) struct PostRow {
    id: i32,
    theme: String,
    caption: String,
    image_url: String,
    scheduled_time: Option<String>,
    status: String,
    created_at: i64,
    schedule_id: Option<i32>,
}

#[derive(Insertable)]
#[diesel(table_name = posts)]
struct NewPostRow<'a> {
    theme: &'a str,
    caption: &'a str,
    image_url: &'a str,
    scheduled_time: Option<&'a str>,
    status: &'a str,
    created_at: i64,
    schedule_id: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub theme: String,
    pub caption: String,
    pub image_url: String,
    pub scheduled_time: Option<String>,
    pub status: PostStatus,
    pub schedule_id: Option<i32>,
}

impl NewPost {
    /// Manual save: `scheduled` when a time is given, otherwise `draft`.
    pub fn manual(
        theme: String,
        caption: String,
        image_url: String,
        scheduled_time: Option<String>,
    ) -> Self {
        let status = if scheduled_time.is_some() {
            PostStatus::Scheduled
        } else {
            PostStatus::Draft
        };
        Self {
            theme,
            caption,
            image_url,
            scheduled_time,
            status,
            schedule_id: None,
        }
    }
}

impl ContentStore {
    pub async fn create_post(&self, new: &NewPost) -> Result<Post> {
        let mut conn = self.conn().await?;
        let row = NewPostRow {
            theme: &new.theme,
            caption: &new.caption,
            image_url: &new.image_url,
            scheduled_time: new.scheduled_time.as_deref(),
            status: new.status.as_str(),
            created_at: now_ts(),
            schedule_id: new.schedule_id,
        };
        diesel::insert_into(posts::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;

        let id = last_insert_id(&mut conn).await?;
        let row: PostRow = posts::table
            .filter(posts::id.eq(id))
            .first(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        map_post(row)
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        let mut conn = self.conn().await?;
        let rows: Vec<PostRow> = posts::table
            .order((posts::created_at.desc(), posts::id.desc()))
            .load(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        rows.into_iter().map(map_post).collect()
    }

    pub async fn get_post(&self, id: i32) -> Result<Option<Post>> {
        let mut conn = self.conn().await?;
        let row: Option<PostRow> = posts::table
            .filter(posts::id.eq(id))
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        row.map(map_post).transpose()
    }

    pub async fn delete_post(&self, id: i32) -> Result<bool> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(posts::table.filter(posts::id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        Ok(deleted > 0)
    }

    pub async fn recent_posts(&self, limit: i64) -> Result<Vec<Post>> {
        let mut conn = self.conn().await?;
        let rows: Vec<PostRow> = posts::table
            .order((posts::created_at.desc(), posts::id.desc()))
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        rows.into_iter().map(map_post).collect()
    }

    /// Scheduled posts at or after `from` (local `YYYY-MM-DD HH:MM`), soonest first.
    pub async fn upcoming_posts(&self, from: &str, limit: i64) -> Result<Vec<Post>> {
        let mut conn = self.conn().await?;
        let rows: Vec<PostRow> = posts::table
            .filter(posts::status.eq(PostStatus::Scheduled.as_str()))
            .filter(posts::scheduled_time.ge(from))
            .order(posts::scheduled_time.asc())
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        rows.into_iter().map(map_post).collect()
    }

    pub async fn count_posts(&self, status: Option<PostStatus>) -> Result<i64> {
        let mut conn = self.conn().await?;
        let mut query = posts::table.into_boxed();
        if let Some(status) = status {
            query = query.filter(posts::status.eq(status.as_str()));
        }
        query
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))
    }

    pub async fn count_posts_since(&self, since_ts: i64) -> Result<i64> {
        let mut conn = self.conn().await?;
        posts::table
            .filter(posts::created_at.ge(since_ts))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))
    }

    /// Posts plus pending items already produced for a schedule. Feeds `different` rotation.
    pub async fn count_schedule_generations(&self, schedule_id: i32) -> Result<i64> {
        let mut conn = self.conn().await?;
        let post_count: i64 = posts::table
            .filter(posts::schedule_id.eq(schedule_id))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        let pending_count: i64 = pending_posts::table
            .filter(pending_posts::schedule_id.eq(schedule_id))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        Ok(post_count + pending_count)
    }

    pub async fn calendar_events(&self) -> Result<Vec<CalendarEvent>> {
        let mut conn = self.conn().await?;
        let post_rows: Vec<(i32, String, Option<String>, String)> = posts::table
            .filter(posts::scheduled_time.is_not_null())
            .filter(posts::scheduled_time.ne(""))
            .select((posts::id, posts::theme, posts::scheduled_time, posts::status))
            .load(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        let pending_rows: Vec<(i32, String, String, String)> = pending_posts::table
            .filter(pending_posts::status.eq(PendingStatus::PendingReview.as_str()))
            .select((
                pending_posts::id,
                pending_posts::theme,
                pending_posts::scheduled_for,
                pending_posts::status,
            ))
            .load(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;

        let mut events: Vec<CalendarEvent> = post_rows
            .into_iter()
            .filter_map(|(id, theme, scheduled_time, status)| {
                scheduled_time.map(|scheduled_time| CalendarEvent {
                    id,
                    theme,
                    scheduled_time,
                    status,
                    kind: CalendarEventKind::Post,
                })
            })
            .collect();
        events.extend(
            pending_rows
                .into_iter()
                .map(|(id, theme, scheduled_time, status)| CalendarEvent {
                    id,
                    theme,
                    scheduled_time,
                    status,
                    kind: CalendarEventKind::Pending,
                }),
        );
        Ok(events)
    }
}

pub(super) fn map_post(row: PostRow) -> Result<Post> {
    Ok(Post {
        id: row.id,
        theme: row.theme,
        caption: row.caption,
        image_url: row.image_url,
        scheduled_time: row.scheduled_time,
        status: row.status.parse()?,
        created_at: row.created_at,
        schedule_id: row.schedule_id,
    })
}
