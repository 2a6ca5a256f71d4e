mod marketing;
mod payload;

use std::future::Future;

use axum::{
    extract::{Json, Path, State},
    routing::{get, post},
    Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use self::payload::Payload;
use crate::config::Config;
use crate::context::AppContext;
use crate::discovery::{self, ScoreInput};
use crate::error::{ReachPosterError, Result};
use crate::store::{
    normalize_scheduled_time, NewPost, ScheduleInput, LOCAL_MINUTE_FORMAT,
};

type ApiResult = Result<Json<Value>>;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct ThemeRequest {
    #[serde(default)]
    theme: String,
}

#[derive(Debug, Default, Deserialize)]
struct SaveRequest {
    #[serde(default)]
    theme: String,
    #[serde(default)]
    caption: String,
    #[serde(default)]
    image_url: String,
    scheduled_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CaptionEdit {
    #[serde(default)]
    caption: String,
}

#[derive(Debug, Default, Deserialize)]
struct OptimizeRequest {
    #[serde(default)]
    caption: String,
    #[serde(default)]
    image_prompt: String,
    #[serde(default)]
    topic: String,
}

#[derive(Debug, Default, Deserialize)]
struct ScoreRequest {
    #[serde(default)]
    caption: String,
    #[serde(default)]
    hashtags: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct InstagramPostRequest {
    #[serde(default)]
    caption: String,
    #[serde(default)]
    image_url: String,
}

pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/api/dashboard", get(dashboard))
        .route("/generate", post(generate))
        .route("/regenerate/caption", post(regenerate_caption))
        .route("/regenerate/image", post(regenerate_image))
        .route("/save", post(save_post))
        .route("/posts", get(list_posts))
        .route("/post/{id}", get(get_post))
        .route("/post/{id}/delete", post(delete_post))
        .route("/post/{id}/copy", get(copy_post))
        .route("/schedules", get(list_schedules))
        .route("/schedule/create", post(create_schedule))
        .route("/schedule/{id}", get(get_schedule))
        .route("/schedule/{id}/update", post(update_schedule))
        .route("/schedule/{id}/delete", post(delete_schedule))
        .route("/schedule/{id}/toggle", post(toggle_schedule))
        .route("/schedule/{id}/generate", post(generate_for_schedule))
        .route("/pending", get(list_pending))
        .route("/pending/{id}/approve", post(approve_pending))
        .route("/pending/{id}/reject", post(reject_pending))
        .route("/pending/{id}/edit", post(edit_pending))
        .route("/api/calendar/events", get(calendar_events))
        .route("/api/optimize-content", post(optimize_content))
        .route("/api/discovery-score", post(discovery_score))
        .route("/api/instagram-status", get(instagram_status))
        .route("/api/post-to-instagram", post(post_to_instagram))
        .merge(marketing::routes())
        .with_state(ctx)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION,
    })
}

async fn status(State(ctx): State<AppContext>) -> Json<Value> {
    let status = ctx.capabilities.status(&ctx.config);
    let scheduler_running = ctx.scheduler_running().await;
    Json(json!({
        "success": true,
        "status": status.status,
        "generators_ready": status.generators_ready,
        "uploader_ready": status.uploader_ready,
        "instagram_ready": status.instagram_ready,
        "news_configured": status.news_configured,
        "scheduler_running": scheduler_running,
        "issues": status.issues,
    }))
}

async fn dashboard(State(ctx): State<AppContext>) -> ApiResult {
    let counts = ctx.store.dashboard_counts(crate::store::now_ts()).await?;
    let recent = ctx.store.recent_posts(5).await?;
    let now_minute = Local::now().format(LOCAL_MINUTE_FORMAT).to_string();
    let upcoming = ctx.store.upcoming_posts(&now_minute, 5).await?;
    Ok(Json(json!({
        "success": true,
        "stats": counts,
        "recent_posts": recent,
        "upcoming_posts": upcoming,
        "issues": ctx.capabilities.issues,
    })))
}

fn require_theme(theme: &str) -> Result<&str> {
    let theme = theme.trim();
    if theme.is_empty() {
        return Err(ReachPosterError::MissingTheme);
    }
    Ok(theme)
}

async fn generate(
    State(ctx): State<AppContext>,
    Payload(payload): Payload<ThemeRequest>,
) -> ApiResult {
    let theme = require_theme(&payload.theme)?;
    let pipeline = ctx.capabilities.pipeline()?;
    let content = pipeline.generate(theme).await?;
    let report = ctx
        .capabilities
        .amplify
        .optimize(&content.caption, &content.image_prompt, theme)
        .await;
    tracing::info!(
        theme,
        score = report.discovery_score.total,
        grade = ?report.discovery_score.grade,
        "Content generated"
    );
    Ok(Json(json!({
        "success": true,
        "theme": content.theme,
        "caption": content.caption,
        "image_url": content.image_url,
        "image_prompt": content.image_prompt,
        "reach_amplify": report,
    })))
}

async fn regenerate_caption(
    State(ctx): State<AppContext>,
    Payload(payload): Payload<ThemeRequest>,
) -> ApiResult {
    let theme = require_theme(&payload.theme)?;
    let pipeline = ctx.capabilities.pipeline()?;
    let caption = pipeline.caption(theme).await?;
    Ok(Json(json!({"success": true, "caption": caption})))
}

async fn regenerate_image(
    State(ctx): State<AppContext>,
    Payload(payload): Payload<ThemeRequest>,
) -> ApiResult {
    let theme = require_theme(&payload.theme)?;
    let pipeline = ctx.capabilities.pipeline()?;
    let image = pipeline.image(theme).await?;
    Ok(Json(json!({
        "success": true,
        "image_url": image.url,
        "image_prompt": image.prompt,
        "hosted": image.hosted,
    })))
}

async fn save_post(
    State(ctx): State<AppContext>,
    Payload(payload): Payload<SaveRequest>,
) -> ApiResult {
    let scheduled_time = match payload.scheduled_time.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(normalize_scheduled_time(raw)?),
    };
    let post = ctx
        .store
        .create_post(&NewPost::manual(
            payload.theme,
            payload.caption,
            payload.image_url,
            scheduled_time,
        ))
        .await?;
    Ok(Json(json!({
        "success": true,
        "post_id": post.id,
        "status": post.status,
    })))
}

async fn list_posts(State(ctx): State<AppContext>) -> ApiResult {
    let posts = ctx.store.list_posts().await?;
    Ok(Json(json!({"success": true, "posts": posts})))
}

async fn get_post(State(ctx): State<AppContext>, Path(id): Path<i32>) -> ApiResult {
    let post = ctx
        .store
        .get_post(id)
        .await?
        .ok_or(ReachPosterError::NotFound { entity: "post", id })?;
    Ok(Json(json!({"success": true, "post": post})))
}

async fn delete_post(State(ctx): State<AppContext>, Path(id): Path<i32>) -> ApiResult {
    if !ctx.store.delete_post(id).await? {
        return Err(ReachPosterError::NotFound { entity: "post", id });
    }
    Ok(Json(json!({"success": true})))
}

async fn copy_post(State(ctx): State<AppContext>, Path(id): Path<i32>) -> ApiResult {
    let post = ctx
        .store
        .get_post(id)
        .await?
        .ok_or(ReachPosterError::NotFound { entity: "post", id })?;
    Ok(Json(json!({
        "success": true,
        "caption": post.caption,
        "image_url": post.image_url,
    })))
}

async fn list_schedules(State(ctx): State<AppContext>) -> ApiResult {
    let schedules = ctx.store.list_schedules().await?;
    Ok(Json(json!({"success": true, "schedules": schedules})))
}

async fn create_schedule(
    State(ctx): State<AppContext>,
    Payload(input): Payload<ScheduleInput>,
) -> ApiResult {
    let schedule = ctx.store.create_schedule(&input).await?;
    Ok(Json(json!({
        "success": true,
        "schedule_id": schedule.id,
        "schedule": schedule,
    })))
}

async fn get_schedule(State(ctx): State<AppContext>, Path(id): Path<i32>) -> ApiResult {
    let schedule = ctx
        .store
        .get_schedule(id)
        .await?
        .ok_or(ReachPosterError::NotFound { entity: "schedule", id })?;
    Ok(Json(json!({"success": true, "schedule": schedule})))
}

async fn update_schedule(
    State(ctx): State<AppContext>,
    Path(id): Path<i32>,
    Payload(input): Payload<ScheduleInput>,
) -> ApiResult {
    let schedule = ctx.store.update_schedule(id, &input).await?;
    Ok(Json(json!({"success": true, "schedule": schedule})))
}

async fn delete_schedule(State(ctx): State<AppContext>, Path(id): Path<i32>) -> ApiResult {
    if !ctx.store.delete_schedule(id).await? {
        return Err(ReachPosterError::NotFound { entity: "schedule", id });
    }
    Ok(Json(json!({"success": true})))
}

async fn toggle_schedule(State(ctx): State<AppContext>, Path(id): Path<i32>) -> ApiResult {
    let is_active = ctx
        .store
        .toggle_schedule(id)
        .await?
        .ok_or(ReachPosterError::NotFound { entity: "schedule", id })?;
    Ok(Json(json!({"success": true, "is_active": is_active})))
}

/// Previews the schedule's next generation; nothing is stored.
async fn generate_for_schedule(State(ctx): State<AppContext>, Path(id): Path<i32>) -> ApiResult {
    let schedule = ctx
        .store
        .get_schedule(id)
        .await?
        .ok_or(ReachPosterError::NotFound { entity: "schedule", id })?;
    let content = ctx.runner.preview(&schedule).await?;
    Ok(Json(json!({
        "success": true,
        "schedule_id": schedule.id,
        "theme": content.theme,
        "caption": content.caption,
        "image_url": content.image_url,
    })))
}

async fn list_pending(State(ctx): State<AppContext>) -> ApiResult {
    let pending = ctx.store.list_pending().await?;
    Ok(Json(json!({"success": true, "pending": pending})))
}

async fn approve_pending(State(ctx): State<AppContext>, Path(id): Path<i32>) -> ApiResult {
    let post = ctx.store.approve_pending(id).await?;
    Ok(Json(json!({"success": true, "post_id": post.id})))
}

async fn reject_pending(State(ctx): State<AppContext>, Path(id): Path<i32>) -> ApiResult {
    ctx.store.reject_pending(id).await?;
    Ok(Json(json!({"success": true})))
}

async fn edit_pending(
    State(ctx): State<AppContext>,
    Path(id): Path<i32>,
    Payload(payload): Payload<CaptionEdit>,
) -> ApiResult {
    let pending = ctx.store.edit_pending_caption(id, &payload.caption).await?;
    Ok(Json(json!({"success": true, "pending": pending})))
}

async fn calendar_events(State(ctx): State<AppContext>) -> ApiResult {
    let events = ctx.store.calendar_events().await?;
    Ok(Json(json!({"success": true, "events": events})))
}

async fn optimize_content(
    State(ctx): State<AppContext>,
    Payload(payload): Payload<OptimizeRequest>,
) -> ApiResult {
    if payload.caption.trim().is_empty() {
        return Err(ReachPosterError::Validation("Caption is required".to_string()));
    }
    let topic = if payload.topic.trim().is_empty() {
        "domestic violence awareness"
    } else {
        payload.topic.trim()
    };
    let report = ctx
        .capabilities
        .amplify
        .optimize(&payload.caption, &payload.image_prompt, topic)
        .await;
    Ok(Json(json!({"success": true, "reach_amplify": report})))
}

async fn discovery_score(
    State(ctx): State<AppContext>,
    Payload(payload): Payload<ScoreRequest>,
) -> ApiResult {
    let score = discovery::score(&ScoreInput {
        caption: &payload.caption,
        hashtags: &payload.hashtags,
        keywords: &payload.keywords,
        local_terms: &ctx.config.organization.local_terms,
    });
    Ok(Json(json!({"success": true, "discovery_score": score})))
}

async fn instagram_status(State(ctx): State<AppContext>) -> Json<Value> {
    let instagram = ctx.config.instagram.clone().unwrap_or_default();
    let has_token = instagram
        .access_token
        .as_deref()
        .is_some_and(|token| !token.trim().is_empty());
    let has_account_id = instagram
        .account_id
        .as_deref()
        .is_some_and(|id| !id.trim().is_empty());
    Json(json!({
        "configured": has_token && has_account_id,
        "has_token": has_token,
        "has_account_id": has_account_id,
    }))
}

async fn post_to_instagram(
    State(ctx): State<AppContext>,
    Payload(payload): Payload<InstagramPostRequest>,
) -> ApiResult {
    let publisher = ctx.capabilities.publisher()?;
    let caption = payload.caption.trim();
    let image_url = payload.image_url.trim();
    if caption.is_empty() || image_url.is_empty() {
        return Err(ReachPosterError::Validation(
            "Caption and image URL are required".to_string(),
        ));
    }
    if image_url.starts_with("data:") {
        return Err(ReachPosterError::Validation(
            "Instagram requires a public image URL. Upload the image to a hosting service first."
                .to_string(),
        ));
    }
    let published = publisher.publish(image_url, caption).await?;
    Ok(Json(json!({
        "success": true,
        "post_id": published.media_id,
        "container_id": published.container_id,
        "message": "Successfully posted to Instagram!",
    })))
}

pub async fn run(host: &str, port: u16, config: Config) -> Result<()> {
    run_with_shutdown(host, port, config, futures::future::pending::<()>()).await
}

pub async fn run_with_shutdown<F>(host: &str, port: u16, config: Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let ctx = AppContext::new(config).await?;
    ctx.start().await;
    let app = build_router(ctx.clone());

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
    tracing::info!(addr = %addr, "Listening");

    let shutdown = async move {
        shutdown.await;
        ctx.stop().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;

    Ok(())
}
