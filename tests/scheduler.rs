mod common;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::tempdir;

use reach_poster::scheduler::{DueSlot, RunOutcome, ScheduleRunner};
use reach_poster::store::{PostStatus, ScheduleInput, TimeSlotInput};

fn monday(h: u32, min: u32) -> DueSlot {
    DueSlot::from_local(
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap(),
    )
}

fn schedule_input(mode: &str, auto_post: bool, time: &str) -> ScheduleInput {
    ScheduleInput {
        name: Some(format!("{mode} schedule")),
        theme_mode: Some(mode.to_string()),
        auto_post,
        times: vec![TimeSlotInput {
            time: Some(time.to_string()),
            days: Some("1".to_string()),
        }],
        themes: vec![
            "Hope".to_string(),
            "Healing".to_string(),
            "Strength".to_string(),
        ],
        ..ScheduleInput::default()
    }
}

#[tokio::test]
async fn review_schedules_queue_pending_items_once_per_minute() {
    let dir = tempdir().unwrap();
    let server = common::image_server().await;
    let store = common::temp_store(&dir).await;
    let capabilities = Arc::new(common::fake_capabilities(&server, &dir, None));
    let runner = ScheduleRunner::new(Arc::clone(&store), capabilities);

    let schedule = store
        .create_schedule(&schedule_input("same", false, "09:00"))
        .await
        .unwrap();

    assert_eq!(runner.tick_at(&monday(9, 0)).await.unwrap(), 1);
    assert_eq!(runner.tick_at(&monday(9, 0)).await.unwrap(), 0);
    assert_eq!(runner.tick_at(&monday(9, 1)).await.unwrap(), 0);

    let pending = store.list_pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].schedule_id, Some(schedule.id));
    assert_eq!(pending[0].theme, "Hope");
    assert_eq!(pending[0].caption, common::CAPTION);
    assert_eq!(pending[0].scheduled_for, "2026-10-19 09:00");
    assert_eq!(pending[0].image_url, server.url("/render.png"));
    assert!(store.list_posts().await.unwrap().is_empty());
}

#[tokio::test]
async fn different_mode_rotates_through_themes() {
    let dir = tempdir().unwrap();
    let server = common::image_server().await;
    let store = common::temp_store(&dir).await;
    let capabilities = Arc::new(common::fake_capabilities(&server, &dir, None));
    let runner = ScheduleRunner::new(Arc::clone(&store), capabilities);

    let schedule = store
        .create_schedule(&schedule_input("different", false, "09:00"))
        .await
        .unwrap();

    let mut themes = Vec::new();
    for minute in 0..4 {
        let outcome = runner
            .run_schedule(&schedule, &monday(9, minute))
            .await
            .unwrap();
        match outcome {
            RunOutcome::Pending { pending } => themes.push(pending.theme),
            other => panic!("expected pending, got {}", other.label()),
        }
    }
    assert_eq!(themes, vec!["Hope", "Healing", "Strength", "Hope"]);
}

#[tokio::test]
async fn mixed_mode_reaches_every_theme() {
    let dir = tempdir().unwrap();
    let server = common::image_server().await;
    let store = common::temp_store(&dir).await;
    let capabilities = Arc::new(common::fake_capabilities(&server, &dir, None));
    let runner = ScheduleRunner::new(Arc::clone(&store), capabilities);

    let schedule = store
        .create_schedule(&schedule_input("mixed", false, "09:00"))
        .await
        .unwrap();

    let mut seen = HashSet::new();
    for _ in 0..50 {
        seen.insert(runner.next_theme(&schedule).await.unwrap());
    }
    assert_eq!(seen.len(), 3);
}

#[tokio::test]
async fn auto_post_publishes_when_instagram_accepts() {
    let dir = tempdir().unwrap();
    let server = common::image_server().await;
    let store = common::temp_store(&dir).await;
    let publisher = Arc::new(common::RecordingPublisher::new(false));
    let capabilities = Arc::new(common::fake_capabilities(
        &server,
        &dir,
        Some(Arc::clone(&publisher)),
    ));
    let runner = ScheduleRunner::new(Arc::clone(&store), capabilities);

    let schedule = store
        .create_schedule(&schedule_input("same", true, "12:30"))
        .await
        .unwrap();
    let outcome = runner.run_schedule(&schedule, &monday(12, 30)).await.unwrap();

    let RunOutcome::Posted { post, media_id } = outcome else {
        panic!("expected a published post");
    };
    assert_eq!(media_id, "media-1");
    assert_eq!(post.status, PostStatus::Posted);
    assert_eq!(post.schedule_id, Some(schedule.id));
    assert_eq!(post.scheduled_time.as_deref(), Some("2026-10-19 12:30"));

    let calls = publisher.calls.lock().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, server.url("/render.png"));
    assert_eq!(calls[0].1, common::CAPTION);
    assert!(store.list_pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_auto_post_keeps_the_post_scheduled() {
    let dir = tempdir().unwrap();
    let server = common::image_server().await;
    let store = common::temp_store(&dir).await;
    let publisher = Arc::new(common::RecordingPublisher::new(true));
    let capabilities = Arc::new(common::fake_capabilities(
        &server,
        &dir,
        Some(Arc::clone(&publisher)),
    ));
    let runner = ScheduleRunner::new(Arc::clone(&store), capabilities);

    store
        .create_schedule(&schedule_input("same", true, "12:30"))
        .await
        .unwrap();
    assert_eq!(runner.tick_at(&monday(12, 30)).await.unwrap(), 1);

    let posts = store.list_posts().await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].status, PostStatus::Scheduled);
    assert_eq!(publisher.calls.lock().await.len(), 1);
}

#[tokio::test]
async fn auto_post_without_instagram_is_scheduled() {
    let dir = tempdir().unwrap();
    let server = common::image_server().await;
    let store = common::temp_store(&dir).await;
    let capabilities = Arc::new(common::fake_capabilities(&server, &dir, None));
    let runner = ScheduleRunner::new(Arc::clone(&store), capabilities);

    let schedule = store
        .create_schedule(&schedule_input("same", true, "12:30"))
        .await
        .unwrap();
    let outcome = runner.run_schedule(&schedule, &monday(12, 30)).await.unwrap();
    assert_eq!(outcome.label(), "scheduled");
}

#[tokio::test]
async fn preview_does_not_store_anything() {
    let dir = tempdir().unwrap();
    let server = common::image_server().await;
    let store = common::temp_store(&dir).await;
    let capabilities = Arc::new(common::fake_capabilities(&server, &dir, None));
    let runner = ScheduleRunner::new(Arc::clone(&store), capabilities);

    let schedule = store
        .create_schedule(&schedule_input("different", false, "09:00"))
        .await
        .unwrap();
    let first = runner.preview(&schedule).await.unwrap();
    let second = runner.preview(&schedule).await.unwrap();
    assert_eq!(first.theme, "Hope");
    assert_eq!(second.theme, "Hope");
    assert_eq!(store.count_schedule_generations(schedule.id).await.unwrap(), 0);
}

#[tokio::test]
async fn schedules_without_themes_fail_without_stopping_the_tick() {
    let dir = tempdir().unwrap();
    let server = common::image_server().await;
    let store = common::temp_store(&dir).await;
    let capabilities = Arc::new(common::fake_capabilities(&server, &dir, None));
    let runner = ScheduleRunner::new(Arc::clone(&store), capabilities);

    store
        .create_schedule(&ScheduleInput {
            themes: Vec::new(),
            ..schedule_input("same", false, "09:00")
        })
        .await
        .unwrap();
    store
        .create_schedule(&schedule_input("same", false, "09:00"))
        .await
        .unwrap();

    assert_eq!(runner.tick_at(&monday(9, 0)).await.unwrap(), 1);
    assert_eq!(store.list_pending().await.unwrap().len(), 1);
}
