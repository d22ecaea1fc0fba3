use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::db::store::HabitStore;
use crate::error::{AppError, AppResult};
use crate::models::habit::{
    CheckIn, CheckInRequest, CreateHabitRequest, Frequency, Habit, HabitQuery, HabitWithStatus,
    UpdateHabitRequest,
};
use crate::streak::{dates, recompute};
use crate::AppState;

/// Streaks are recomputed and written back on every read, so a habit the
/// user opens never shows a stale number.
pub async fn list_habits(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(filter): Query<HabitQuery>,
) -> AppResult<Json<Vec<HabitWithStatus>>> {
    let today = Utc::now().date_naive();
    let habits = state.store.list_for_user(auth_user.id, &filter).await?;

    let mut result = Vec::with_capacity(habits.len());
    for mut habit in habits {
        recompute::refresh_streak(&state.store, &mut habit, today).await?;
        let is_due_today = habit.is_due_on(today);
        let completed_today = habit.completed_on(today);
        result.push(HabitWithStatus {
            habit,
            is_due_today,
            completed_today,
        });
    }

    Ok(Json(result))
}

pub async fn get_habit(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(habit_id): Path<Uuid>,
) -> AppResult<Json<Habit>> {
    let mut habit = state
        .store
        .find_for_user(habit_id, auth_user.id)
        .await?
        .ok_or(AppError::NotFound("Habit not found".into()))?;

    let today = Utc::now().date_naive();
    recompute::refresh_streak(&state.store, &mut habit, today).await?;

    Ok(Json(habit))
}

pub async fn create_habit(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateHabitRequest>,
) -> AppResult<Json<Habit>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    body.validate_schedule().map_err(AppError::Validation)?;

    let habit = state.store.insert(auth_user.id, &body).await?;

    Ok(Json(habit))
}

pub async fn update_habit(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(habit_id): Path<Uuid>,
    Json(body): Json<UpdateHabitRequest>,
) -> AppResult<Json<Habit>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let mut habit = state
        .store
        .find_for_user(habit_id, auth_user.id)
        .await?
        .ok_or(AppError::NotFound("Habit not found".into()))?;

    if let Some(title) = body.title {
        habit.title = title;
    }
    if let Some(description) = body.description {
        habit.description = Some(description);
    }
    if let Some(color) = body.color {
        habit.color = color;
    }
    if let Some(icon) = body.icon {
        habit.icon = icon;
    }
    if let Some(frequency) = body.frequency {
        habit.frequency = frequency;
    }
    if let Some(schedule) = body.schedule {
        habit.schedule = schedule;
    }
    if let Some(start_date) = body.start_date {
        habit.start_date = start_date;
    }
    if let Some(end_date) = body.end_date {
        // Explicit null clears the end date; a missing key leaves it alone.
        habit.end_date = end_date;
    }
    if let Some(active) = body.active {
        habit.active = active;
    }

    for day in &habit.schedule {
        if !(1..=7).contains(day) {
            return Err(AppError::Validation(format!(
                "Day {} is invalid; must be 1-7 (Mon-Sun)",
                day
            )));
        }
    }
    if matches!(habit.frequency, Frequency::Weekly | Frequency::Custom)
        && habit.schedule.is_empty()
    {
        return Err(AppError::Validation(
            "Weekly and custom habits require at least one scheduled day".into(),
        ));
    }

    state.store.persist(&habit).await?;

    Ok(Json(habit))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(habit_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let deleted = state.store.delete(habit_id, auth_user.id).await?;
    if !deleted {
        return Err(AppError::NotFound("Habit not found".into()));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Marks the habit done for a date. At most one check-in exists per calendar
/// date: a second check-in for the same date updates it in place.
pub async fn add_check_in(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(habit_id): Path<Uuid>,
    Json(body): Json<CheckInRequest>,
) -> AppResult<Json<Habit>> {
    let mut habit = state
        .store
        .find_for_user(habit_id, auth_user.id)
        .await?
        .ok_or(AppError::NotFound("Habit not found".into()))?;

    let date = dates::normalize(body.date);

    let existing = habit.check_ins.iter().position(|c| c.date == date);
    match existing {
        Some(idx) => {
            let check_in = &mut habit.check_ins[idx];
            check_in.completed = true;
            check_in.notes = body.notes;
        }
        None => habit.check_ins.push(CheckIn {
            id: Uuid::new_v4(),
            date,
            completed: true,
            notes: body.notes,
        }),
    }
    habit.check_ins.sort_by(|a, b| b.date.cmp(&a.date));

    let today = Utc::now().date_naive();
    recompute::refresh_streak(&state.store, &mut habit, today).await?;

    Ok(Json(habit))
}

pub async fn remove_check_in(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((habit_id, check_in_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Habit>> {
    let mut habit = state
        .store
        .find_for_user(habit_id, auth_user.id)
        .await?
        .ok_or(AppError::NotFound("Habit not found".into()))?;

    let before = habit.check_ins.len();
    habit.check_ins.retain(|c| c.id != check_in_id);
    if habit.check_ins.len() == before {
        return Err(AppError::NotFound("Check-in not found".into()));
    }

    let today = Utc::now().date_naive();
    recompute::refresh_streak(&state.store, &mut habit, today).await?;

    Ok(Json(habit))
}
