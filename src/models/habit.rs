use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::streak::dates;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: String,
    pub frequency: Frequency,
    /// ISO weekdays (1=Mon .. 7=Sun); consulted for weekly/custom habits only.
    pub schedule: Vec<i16>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub active: bool,
    pub current_streak: i32,
    pub best_streak: i32,
    pub last_completed_date: Option<NaiveDate>,
    pub check_ins: Json<Vec<CheckIn>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "habit_frequency", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl Default for Frequency {
    fn default() -> Self {
        Self::Daily
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckIn {
    pub id: Uuid,
    pub date: NaiveDate,
    pub completed: bool,
    pub notes: Option<String>,
}

/// How a habit's completion is judged. `weekly` and `custom` share the
/// scheduled-days rule; every other frequency is judged day by day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cadence {
    Daily,
    Weekly { schedule: BTreeSet<u8> },
}

impl Habit {
    pub fn cadence(&self) -> Cadence {
        match self.frequency {
            Frequency::Weekly | Frequency::Custom => Cadence::Weekly {
                // Out-of-range entries are dropped rather than rejected;
                // corrupt historical data must not break reads.
                schedule: self
                    .schedule
                    .iter()
                    .copied()
                    .filter(|d| (1..=7).contains(d))
                    .map(|d| d as u8)
                    .collect(),
            },
            Frequency::Daily | Frequency::Monthly => Cadence::Daily,
        }
    }

    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        match self.cadence() {
            Cadence::Daily => true,
            Cadence::Weekly { schedule } => {
                schedule.contains(&(dates::to_iso_day(dates::day_of_week(date))))
            }
        }
    }

    pub fn completed_on(&self, date: NaiveDate) -> bool {
        self.check_ins.iter().any(|c| c.date == date && c.completed)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateHabitRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be under 2000 characters"))]
    pub description: Option<String>,

    pub color: Option<String>,
    pub icon: Option<String>,
    pub frequency: Option<Frequency>,
    pub schedule: Option<Vec<i16>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl CreateHabitRequest {
    /// Schedule days must be ISO weekdays, and weekly/custom habits need at
    /// least one of them.
    pub fn validate_schedule(&self) -> Result<(), String> {
        let freq = self.frequency.clone().unwrap_or_default();
        let days = self.schedule.as_deref().unwrap_or(&[]);
        for d in days {
            if !(1..=7).contains(d) {
                return Err(format!("Day {} is invalid; must be 1-7 (Mon-Sun)", d));
            }
        }
        if matches!(freq, Frequency::Weekly | Frequency::Custom) && days.is_empty() {
            return Err("Weekly and custom habits require at least one scheduled day".into());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHabitRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description must be under 2000 characters"))]
    pub description: Option<String>,

    pub color: Option<String>,
    pub icon: Option<String>,
    pub frequency: Option<Frequency>,
    pub schedule: Option<Vec<i16>>,
    pub start_date: Option<NaiveDate>,
    /// Missing key leaves the end date alone; an explicit null clears it.
    #[serde(default, with = "serde_with::rust::double_option")]
    pub end_date: Option<Option<NaiveDate>>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    /// Full timestamp from the client; truncated to a calendar date before
    /// it is stored or compared.
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HabitQuery {
    pub active: Option<bool>,
    pub frequency: Option<Frequency>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitWithStatus {
    #[serde(flatten)]
    pub habit: Habit,
    pub is_due_today: bool,
    pub completed_today: bool,
}
