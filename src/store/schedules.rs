use std::collections::HashMap;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::schema::{schedule_themes, schedule_times, schedules};
use super::{
    last_insert_id, now_ts, ContentStore, Schedule, ScheduleInput, ScheduleTime, ValidatedSchedule,
};
use crate::error::{ReachPosterError, Result};
use crate::scheduler::due::{is_due, DueSlot};

#[derive(Queryable)]
struct ScheduleRow {
    id: i32,
    name: String,
    is_active: bool,
    theme_mode: String,
    auto_post: bool,
    created_at: i64,
}

#[derive(Queryable)]
struct ScheduleTimeRow {
    id: i32,
    schedule_id: i32,
    time_of_day: String,
    days_of_week: String,
}

#[derive(Queryable)]
struct ScheduleThemeRow {
    _id: i32,
    schedule_id: i32,
    theme: String,
    _use_order: i32,
}

#[derive(Insertable)]
#[diesel(table_name = schedules)]
struct NewScheduleRow<'a> {
    name: &'a str,
    is_active: bool,
    theme_mode: &'a str,
    auto_post: bool,
    created_at: i64,
}

#[derive(Insertable)]
#[diesel(table_name = schedule_times)]
struct NewScheduleTimeRow<'a> {
    schedule_id: i32,
    time_of_day: &'a str,
    days_of_week: &'a str,
}

#[derive(Insertable)]
#[diesel(table_name = schedule_themes)]
struct NewScheduleThemeRow<'a> {
    schedule_id: i32,
    theme: &'a str,
    use_order: i32,
}

impl ContentStore {
    pub async fn create_schedule(&self, input: &ScheduleInput) -> Result<Schedule> {
        let validated = input.validate()?;
        let schedule_id = {
            let mut conn = self.conn().await?;
            let row = NewScheduleRow {
                name: &validated.name,
                is_active: validated.is_active,
                theme_mode: validated.theme_mode.as_str(),
                auto_post: validated.auto_post,
                created_at: now_ts(),
            };
            diesel::insert_into(schedules::table)
                .values(&row)
                .execute(&mut conn)
                .await
                .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
            last_insert_id(&mut conn).await?
        };
        self.replace_children(schedule_id, &validated).await?;
        tracing::info!(
            schedule_id,
            theme_mode = validated.theme_mode.as_str(),
            times = validated.times.len(),
            themes = validated.themes.len(),
            "Schedule created"
        );
        self.get_schedule(schedule_id)
            .await?
            .ok_or(ReachPosterError::NotFound {
                entity: "schedule",
                id: schedule_id,
            })
    }

    /// Replaces the schedule's fields and its whole set of times and themes.
    pub async fn update_schedule(&self, id: i32, input: &ScheduleInput) -> Result<Schedule> {
        let validated = input.validate()?;
        {
            let mut conn = self.conn().await?;
            let updated = diesel::update(schedules::table.filter(schedules::id.eq(id)))
                .set((
                    schedules::name.eq(&validated.name),
                    schedules::theme_mode.eq(validated.theme_mode.as_str()),
                    schedules::auto_post.eq(validated.auto_post),
                    schedules::is_active.eq(validated.is_active),
                ))
                .execute(&mut conn)
                .await
                .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
            if updated == 0 {
                return Err(ReachPosterError::NotFound {
                    entity: "schedule",
                    id,
                });
            }
        }
        self.replace_children(id, &validated).await?;
        self.get_schedule(id)
            .await?
            .ok_or(ReachPosterError::NotFound {
                entity: "schedule",
                id,
            })
    }

    /// Deletes times and themes first, then the schedule row.
    pub async fn delete_schedule(&self, id: i32) -> Result<bool> {
        let mut conn = self.conn().await?;
        diesel::delete(schedule_times::table.filter(schedule_times::schedule_id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        diesel::delete(schedule_themes::table.filter(schedule_themes::schedule_id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        let deleted = diesel::delete(schedules::table.filter(schedules::id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        Ok(deleted > 0)
    }

    /// Flips `is_active` and returns the new value, `None` when the schedule is missing.
    pub async fn toggle_schedule(&self, id: i32) -> Result<Option<bool>> {
        let mut conn = self.conn().await?;
        let current: Option<bool> = schedules::table
            .filter(schedules::id.eq(id))
            .select(schedules::is_active)
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        let Some(current) = current else {
            return Ok(None);
        };
        diesel::update(schedules::table.filter(schedules::id.eq(id)))
            .set(schedules::is_active.eq(!current))
            .execute(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        Ok(Some(!current))
    }

    pub async fn get_schedule(&self, id: i32) -> Result<Option<Schedule>> {
        let row: Option<ScheduleRow> = {
            let mut conn = self.conn().await?;
            schedules::table
                .filter(schedules::id.eq(id))
                .first(&mut conn)
                .await
                .optional()
                .map_err(|e| ReachPosterError::Runtime(e.to_string()))?
        };
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    pub async fn list_schedules(&self) -> Result<Vec<Schedule>> {
        let rows: Vec<ScheduleRow> = {
            let mut conn = self.conn().await?;
            schedules::table
                .order((schedules::created_at.desc(), schedules::id.desc()))
                .load(&mut conn)
                .await
                .map_err(|e| ReachPosterError::Runtime(e.to_string()))?
        };
        self.hydrate(rows).await
    }

    pub async fn active_schedules(&self) -> Result<Vec<Schedule>> {
        let rows: Vec<ScheduleRow> = {
            let mut conn = self.conn().await?;
            schedules::table
                .filter(schedules::is_active.eq(true))
                .order(schedules::id.asc())
                .load(&mut conn)
                .await
                .map_err(|e| ReachPosterError::Runtime(e.to_string()))?
        };
        self.hydrate(rows).await
    }

    /// Active schedules with at least one time slot matching `slot`. Each schedule appears once.
    pub async fn due_schedules(&self, slot: &DueSlot) -> Result<Vec<Schedule>> {
        let schedules = self.active_schedules().await?;
        Ok(schedules
            .into_iter()
            .filter(|schedule| {
                schedule
                    .times
                    .iter()
                    .any(|time| is_due(&time.time_of_day, &time.days_of_week, slot))
            })
            .collect())
    }

    pub async fn count_active_schedules(&self) -> Result<i64> {
        let mut conn = self.conn().await?;
        schedules::table
            .filter(schedules::is_active.eq(true))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))
    }

    async fn replace_children(&self, schedule_id: i32, validated: &ValidatedSchedule) -> Result<()> {
        let mut conn = self.conn().await?;
        diesel::delete(schedule_times::table.filter(schedule_times::schedule_id.eq(schedule_id)))
            .execute(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        diesel::delete(
            schedule_themes::table.filter(schedule_themes::schedule_id.eq(schedule_id)),
        )
        .execute(&mut conn)
        .await
        .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;

        for (time_of_day, days_of_week) in &validated.times {
            let row = NewScheduleTimeRow {
                schedule_id,
                time_of_day,
                days_of_week,
            };
            diesel::insert_into(schedule_times::table)
                .values(&row)
                .execute(&mut conn)
                .await
                .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        }
        for (index, theme) in validated.themes.iter().enumerate() {
            let row = NewScheduleThemeRow {
                schedule_id,
                theme,
                use_order: index as i32,
            };
            diesel::insert_into(schedule_themes::table)
                .values(&row)
                .execute(&mut conn)
                .await
                .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        }
        Ok(())
    }

    async fn hydrate(&self, rows: Vec<ScheduleRow>) -> Result<Vec<Schedule>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
        let mut conn = self.conn().await?;
        let time_rows: Vec<ScheduleTimeRow> = schedule_times::table
            .filter(schedule_times::schedule_id.eq_any(&ids))
            .order(schedule_times::id.asc())
            .load(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        let theme_rows: Vec<ScheduleThemeRow> = schedule_themes::table
            .filter(schedule_themes::schedule_id.eq_any(&ids))
            .order((schedule_themes::use_order.asc(), schedule_themes::id.asc()))
            .load(&mut conn)
            .await
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;

        let mut times: HashMap<i32, Vec<ScheduleTime>> = HashMap::new();
        for row in time_rows {
            times.entry(row.schedule_id).or_default().push(ScheduleTime {
                id: row.id,
                time_of_day: row.time_of_day,
                days_of_week: row.days_of_week,
            });
        }
        let mut themes: HashMap<i32, Vec<String>> = HashMap::new();
        for row in theme_rows {
            themes.entry(row.schedule_id).or_default().push(row.theme);
        }

        rows.into_iter()
            .map(|row| {
                Ok(Schedule {
                    id: row.id,
                    name: row.name,
                    is_active: row.is_active,
                    theme_mode: row.theme_mode.parse()?,
                    auto_post: row.auto_post,
                    created_at: row.created_at,
                    times: times.remove(&row.id).unwrap_or_default(),
                    themes: themes.remove(&row.id).unwrap_or_default(),
                })
            })
            .collect()
    }
}
