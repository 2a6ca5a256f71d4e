use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::posts::NewPost;
use super::schema::{pending_posts, schedules};
use super::{last_insert_id, now_ts, ContentStore, PendingPost, PendingStatus, Post, PostStatus};
use crate::error::{ReachPosterError, Result};

#[derive(Queryable)]
struct PendingRow {
    id: i32,
    schedule_id: Option<i32>,
    theme: String,
    caption: String,
    image_url: String,
    scheduled_for: String,
    status: String,
    created_at: i64,
}

#[derive(Insertable)]
#[diesel(table_name = pending_posts)]
struct NewPendingRow<'a> {
    schedule_id: Option<i32>,
    theme: &'a str,
    caption: &'a str,
    image_url: &'a str,
    scheduled_for: &'a str,
    status: &'a str,
    created_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewPending {
    pub schedule_id: Option<i32>,
    pub theme: String,
    pub caption: String,
    pub image_url: String,
    pub scheduled_for: String,
}

impl ContentStore {
    pub async fn create_pending(&self, new: &NewPending) -> Result<PendingPost> {
        let mut conn = self.conn().await?;
        let row = NewPendingRow {
            schedule_id: new.schedule_id,
            theme: &new.theme,
            caption: &new.caption,
            image_url: &new.image_url,
            scheduled_for: &new.scheduled_for,
            status: PendingStatus::PendingReview.as_str(),
            created_at: now_ts(),
        };
        diesel::insert_into(pending_posts::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        let id = last_insert_id(&mut conn).await?;
        let row: PendingRow = pending_posts::table
            .filter(pending_posts::id.eq(id))
            .first(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        map_pending(row, None)
    }

    /// Items awaiting review, soonest first, with the owning schedule's name.
    pub async fn list_pending(&self) -> Result<Vec<PendingPost>> {
        let mut conn = self.conn().await?;
        let rows: Vec<(PendingRow, Option<String>)> = pending_posts::table
            .left_join(schedules::table)
            .filter(pending_posts::status.eq(PendingStatus::PendingReview.as_str()))
            .order((pending_posts::scheduled_for.asc(), pending_posts::id.asc()))
            .select((pending_posts::all_columns, schedules::name.nullable()))
            .load(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        rows.into_iter()
            .map(|(row, name)| map_pending(row, name))
            .collect()
    }

    pub async fn get_pending(&self, id: i32) -> Result<Option<PendingPost>> {
        let mut conn = self.conn().await?;
        let row: Option<(PendingRow, Option<String>)> = pending_posts::table
            .left_join(schedules::table)
            .filter(pending_posts::id.eq(id))
            .select((pending_posts::all_columns, schedules::name.nullable()))
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        row.map(|(row, name)| map_pending(row, name)).transpose()
    }

    /// Copies the item into `posts` as `scheduled` and marks it `approved`.
    pub async fn approve_pending(&self, id: i32) -> Result<Post> {
        let pending = self.require_reviewable(id).await?;
        let post = self
            .create_post(&NewPost {
                theme: pending.theme,
                caption: pending.caption,
                image_url: pending.image_url,
                scheduled_time: Some(pending.scheduled_for),
                status: PostStatus::Scheduled,
                schedule_id: pending.schedule_id,
            })
            .await?;
        self.set_pending_status(id, PendingStatus::Approved).await?;
        tracing::info!(pending_id = id, post_id = post.id, "Pending post approved");
        Ok(post)
    }

    /// Marks the item `rejected`; nothing is copied.
    pub async fn reject_pending(&self, id: i32) -> Result<()> {
        self.require_reviewable(id).await?;
        self.set_pending_status(id, PendingStatus::Rejected).await?;
        tracing::info!(pending_id = id, "Pending post rejected");
        Ok(())
    }

    pub async fn edit_pending_caption(&self, id: i32, caption: &str) -> Result<PendingPost> {
        {
            let mut conn = self.conn().await?;
            let updated = diesel::update(pending_posts::table.filter(pending_posts::id.eq(id)))
                .set(pending_posts::caption.eq(caption))
                .execute(&mut conn)
                .await
                .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
            if updated == 0 {
                return Err(ReachPosterError::NotFound {
                    entity: "pending post",
                    id,
                });
            }
        }
        self.get_pending(id)
            .await?
            .ok_or(ReachPosterError::NotFound {
                entity: "pending post",
                id,
            })
    }

    pub async fn count_pending_review(&self) -> Result<i64> {
        let mut conn = self.conn().await?;
        pending_posts::table
            .filter(pending_posts::status.eq(PendingStatus::PendingReview.as_str()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))
    }

    async fn require_reviewable(&self, id: i32) -> Result<PendingPost> {
        let pending = self
            .get_pending(id)
            .await?
            .ok_or(ReachPosterError::NotFound {
                entity: "pending post",
                id,
            })?;
        if pending.status != PendingStatus::PendingReview {
            return Err(ReachPosterError::Validation(format!(
                "pending post {id} is already {}",
                pending.status.as_str()
            )));
        }
        Ok(pending)
    }

    async fn set_pending_status(&self, id: i32, status: PendingStatus) -> Result<()> {
        let mut conn = self.conn().await?;
        diesel::update(pending_posts::table.filter(pending_posts::id.eq(id)))
            .set(pending_posts::status.eq(status.as_str()))
            .execute(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        Ok(())
    }
}

fn map_pending(row: PendingRow, schedule_name: Option<String>) -> Result<PendingPost> {
    Ok(PendingPost {
        id: row.id,
        schedule_id: row.schedule_id,
        schedule_name,
        theme: row.theme,
        caption: row.caption,
        image_url: row.image_url,
        scheduled_for: row.scheduled_for,
        status: row.status.parse()?,
        created_at: row.created_at,
    })
}
