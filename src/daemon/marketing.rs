//! Static marketing catalog routes. None of these need credentials except
//! the alt text in `/api/campaign-optimize`, which falls back to a template.

use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post},
    Router,
};
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::payload::Payload;
use super::ApiResult;
use crate::catalog::{
    self, adapt_for_platform, awareness_calendar, calculate_impact, giving_tuesday,
    upcoming_awareness, CampaignPlan, CAMPAIGN_MODES, DEFAULT_CAMPAIGN, DEFAULT_EVENT_LOCATION,
    DEFAULT_EVENT_TYPE, PLATFORMS, SUGGESTED_THEMES, VOLUNTEER_ROLES,
};
use crate::context::AppContext;
use crate::error::{ReachPosterError, Result};

const DEFAULT_UPCOMING_DAYS: i64 = 30;

#[derive(Debug, Default, Deserialize)]
struct SmartThemeQuery {
    preference: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CampaignRequest {
    #[serde(default)]
    caption: String,
    #[serde(default)]
    topic: String,
    campaign_mode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AdaptRequest {
    #[serde(default)]
    caption: String,
    #[serde(default)]
    platform: String,
}

#[derive(Debug, Default, Deserialize)]
struct EventRequest {
    #[serde(default)]
    event_name: String,
    event_type: Option<String>,
    event_date: Option<String>,
    location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ImpactRequest {
    amount: Option<f64>,
    impact_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CalendarQuery {
    month: Option<u32>,
    year: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
struct UpcomingQuery {
    days: Option<i64>,
}

pub(super) fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/themes", get(themes))
        .route("/api/smart-themes", get(smart_themes))
        .route("/api/campaign-modes", get(campaign_modes))
        .route("/api/campaign-optimize", post(campaign_optimize))
        .route("/api/platforms", get(platforms))
        .route("/api/platform-tips/{platform}", get(platform_tips))
        .route("/api/adapt-for-platform", post(adapt))
        .route("/api/event-optimize", post(event_optimize))
        .route("/api/fundraising", get(fundraising))
        .route("/api/fundraising/impact-calculator", post(impact_calculator))
        .route("/api/awareness/calendar", get(calendar))
        .route("/api/awareness/upcoming", get(upcoming))
        .route("/api/volunteer/roles", get(volunteer_roles))
        .route("/api/giving-tuesday/{year}", get(giving_tuesday_date))
}

/// Serializes `value` and adds `"success": true` to the resulting object.
fn success_with(value: impl Serialize) -> ApiResult {
    let value =
        serde_json::to_value(value).map_err(|e| ReachPosterError::Serialization(e.to_string()))?;
    let mut object = match value {
        Value::Object(object) => object,
        other => {
            let mut object = Map::new();
            object.insert("data".to_string(), other);
            object
        }
    };
    object.insert("success".to_string(), Value::Bool(true));
    Ok(Json(Value::Object(object)))
}

fn keyed<T: Serialize>(entries: &[(&str, T)]) -> Result<Map<String, Value>> {
    entries
        .iter()
        .map(|(key, entry)| {
            serde_json::to_value(entry)
                .map(|value| (key.to_string(), value))
                .map_err(|e| ReachPosterError::Serialization(e.to_string()))
        })
        .collect()
}

async fn themes() -> Json<Value> {
    Json(json!({"success": true, "themes": SUGGESTED_THEMES}))
}

async fn smart_themes(Query(query): Query<SmartThemeQuery>) -> Json<Value> {
    let themes = catalog::smart_themes(query.preference.as_deref());
    Json(json!({"success": true, "source": "static", "themes": themes}))
}

async fn campaign_modes() -> ApiResult {
    let modes = keyed(&CAMPAIGN_MODES)?;
    Ok(Json(json!({"success": true, "modes": modes})))
}

async fn campaign_optimize(
    State(ctx): State<AppContext>,
    Payload(payload): Payload<CampaignRequest>,
) -> ApiResult {
    let mode = payload.campaign_mode.as_deref().unwrap_or(DEFAULT_CAMPAIGN);
    let subject = CampaignPlan::alt_text_subject(&payload.topic, mode);
    let alt_text = ctx.capabilities.amplify.alt_text(&subject).await;
    let plan = CampaignPlan::build(&mut rand::thread_rng(), mode, alt_text);
    tracing::debug!(
        campaign_mode = plan.campaign_mode,
        caption_chars = payload.caption.chars().count(),
        "Campaign optimized"
    );
    success_with(plan)
}

async fn platforms() -> ApiResult {
    let platforms = keyed(&PLATFORMS)?;
    Ok(Json(json!({"success": true, "platforms": platforms})))
}

async fn platform_tips(Path(platform): Path<String>) -> Result<axum::response::Response> {
    use axum::response::IntoResponse;

    let Some((key, profile)) = catalog::platform(&platform) else {
        return Ok((
            axum::http::StatusCode::NOT_FOUND,
            Json(json!({"success": false, "error": "Platform not found"})),
        )
            .into_response());
    };
    let Json(mut body) = success_with(profile)?;
    if let Value::Object(object) = &mut body {
        object.insert("platform".to_string(), Value::String(key.to_string()));
    }
    Ok(Json(body).into_response())
}

async fn adapt(Payload(payload): Payload<AdaptRequest>) -> ApiResult {
    let adapted = adapt_for_platform(&payload.caption, &payload.platform)?;
    success_with(adapted)
}

async fn event_optimize(Payload(payload): Payload<EventRequest>) -> ApiResult {
    let name = payload.event_name.trim();
    if name.is_empty() {
        return Err(ReachPosterError::Validation("Event name required".to_string()));
    }
    let event_type = payload
        .event_type
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_EVENT_TYPE);
    let location = payload
        .location
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_EVENT_LOCATION);
    let event_date = payload
        .event_date
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    success_with(catalog::optimize_event(name, event_type, event_date, location))
}

async fn fundraising() -> ApiResult {
    success_with(catalog::fundraising_guide())
}

async fn impact_calculator(Payload(payload): Payload<ImpactRequest>) -> ApiResult {
    let report = calculate_impact(
        payload.amount.unwrap_or(0.0),
        payload.impact_type.as_deref(),
    )?;
    success_with(report)
}

async fn calendar(Query(query): Query<CalendarQuery>) -> ApiResult {
    if let Some(month) = query.month {
        if !(1..=12).contains(&month) {
            return Err(ReachPosterError::Validation(
                "Month must be between 1 and 12".to_string(),
            ));
        }
    }
    let year = query.year.unwrap_or_else(|| Local::now().year());
    success_with(awareness_calendar(year, query.month))
}

async fn upcoming(Query(query): Query<UpcomingQuery>) -> Json<Value> {
    let days_ahead = query.days.unwrap_or(DEFAULT_UPCOMING_DAYS);
    let upcoming = upcoming_awareness(Local::now().date_naive(), days_ahead);
    Json(json!({
        "success": true,
        "days_ahead": days_ahead,
        "upcoming": upcoming,
    }))
}

async fn volunteer_roles() -> ApiResult {
    let roles = keyed(&VOLUNTEER_ROLES)?;
    Ok(Json(json!({"success": true, "roles": roles})))
}

async fn giving_tuesday_date(Path(year): Path<i32>) -> ApiResult {
    let date = giving_tuesday(year)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .ok_or_else(|| ReachPosterError::Validation(format!("Invalid year: {year}")))?;
    Ok(Json(json!({"success": true, "year": year, "date": date})))
}
