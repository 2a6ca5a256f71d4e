use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::due::DueSlot;
use super::themes::select_theme;
use crate::capabilities::Capabilities;
use crate::error::Result;
use crate::interfaces::scheduler::ScheduledJob;
use crate::pipeline::GeneratedContent;
use crate::store::{ContentStore, NewPending, NewPost, PendingPost, Post, PostStatus, Schedule};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Queued for review.
    Pending { pending: PendingPost },
    /// Published through the Graph API.
    Posted { post: Post, media_id: String },
    /// Auto-post requested but Instagram was unavailable or rejected it.
    Scheduled { post: Post },
}

/// Fires due schedules, one minute at a time.
pub struct ScheduleRunner {
    store: Arc<ContentStore>,
    capabilities: Arc<Capabilities>,
    last_minute: Mutex<Option<String>>,
}

impl ScheduleRunner {
    pub fn new(store: Arc<ContentStore>, capabilities: Arc<Capabilities>) -> Self {
        Self {
            store,
            capabilities,
            last_minute: Mutex::new(None),
        }
    }

    pub async fn tick(&self) -> Result<usize> {
        self.tick_at(&DueSlot::now()).await
    }

    /// Runs every schedule due at `slot`, sequentially. A minute already
    /// handled is skipped, so a sub-minute poll interval fires each slot once.
    pub async fn tick_at(&self, slot: &DueSlot) -> Result<usize> {
        {
            let mut last = self.last_minute.lock().await;
            if last.as_deref() == Some(slot.minute_key.as_str()) {
                return Ok(0);
            }
            *last = Some(slot.minute_key.clone());
        }

        let due = self.store.due_schedules(slot).await?;
        if due.is_empty() {
            return Ok(0);
        }
        info!(minute = %slot.minute_key, count = due.len(), "Schedules due");

        let mut fired = 0;
        for schedule in &due {
            match self.run_schedule(schedule, slot).await {
                Ok(outcome) => {
                    fired += 1;
                    info!(schedule_id = schedule.id, outcome = outcome.label(), "Schedule fired");
                }
                Err(err) => {
                    warn!(
                        schedule_id = schedule.id,
                        theme_mode = schedule.theme_mode.as_str(),
                        error = %err,
                        "Schedule run failed"
                    );
                }
            }
        }
        Ok(fired)
    }

    pub async fn next_theme(&self, schedule: &Schedule) -> Result<String> {
        let generated = self.store.count_schedule_generations(schedule.id).await?;
        let theme = select_theme(
            schedule.theme_mode,
            &schedule.themes,
            generated.max(0) as u64,
            &mut rand::thread_rng(),
        )?
        .to_string();
        Ok(theme)
    }

    /// Generates content for the schedule's next theme without storing it.
    pub async fn preview(&self, schedule: &Schedule) -> Result<GeneratedContent> {
        let theme = self.next_theme(schedule).await?;
        let pipeline = self.capabilities.pipeline()?;
        pipeline.generate(&theme).await
    }

    pub async fn run_schedule(&self, schedule: &Schedule, slot: &DueSlot) -> Result<RunOutcome> {
        let pipeline = self.capabilities.pipeline()?;
        let theme = self.next_theme(schedule).await?;
        info!(
            schedule_id = schedule.id,
            theme_mode = schedule.theme_mode.as_str(),
            theme = %theme,
            "Generating scheduled content"
        );
        let content = pipeline.generate(&theme).await?;

        if !schedule.auto_post {
            let pending = self
                .store
                .create_pending(&NewPending {
                    schedule_id: Some(schedule.id),
                    theme: content.theme,
                    caption: content.caption,
                    image_url: content.image_url,
                    scheduled_for: slot.minute_key.clone(),
                })
                .await?;
            return Ok(RunOutcome::Pending { pending });
        }

        let published = match &self.capabilities.publisher {
            Some(publisher) => match publisher.publish(&content.image_url, &content.caption).await {
                Ok(published) => Some(published),
                Err(err) => {
                    warn!(schedule_id = schedule.id, error = %err, "Auto-post failed, keeping post scheduled");
                    None
                }
            },
            None => {
                warn!(schedule_id = schedule.id, "Auto-post requested but Instagram is not configured");
                None
            }
        };

        let status = if published.is_some() {
            PostStatus::Posted
        } else {
            PostStatus::Scheduled
        };
        let post = self
            .store
            .create_post(&NewPost {
                theme: content.theme,
                caption: content.caption,
                image_url: content.image_url,
                scheduled_time: Some(slot.minute_key.clone()),
                status,
                schedule_id: Some(schedule.id),
            })
            .await?;
        Ok(match published {
            Some(published) => RunOutcome::Posted {
                post,
                media_id: published.media_id,
            },
            None => RunOutcome::Scheduled { post },
        })
    }
}

impl RunOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Pending { .. } => "pending",
            RunOutcome::Posted { .. } => "posted",
            RunOutcome::Scheduled { .. } => "scheduled",
        }
    }
}

pub struct ScheduleTickJob {
    runner: Arc<ScheduleRunner>,
    interval: Duration,
}

impl ScheduleTickJob {
    pub fn new(runner: Arc<ScheduleRunner>, interval: Duration) -> Self {
        Self { runner, interval }
    }
}

#[async_trait::async_trait]
impl ScheduledJob for ScheduleTickJob {
    fn name(&self) -> &str {
        "schedule_tick"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self) -> Result<()> {
        self.runner.tick().await?;
        Ok(())
    }
}
