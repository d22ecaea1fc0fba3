//! Habit persistence behind a small trait seam.
//!
//! Request handlers and the nightly sweep both talk to [`HabitStore`], so
//! the recompute paths can be exercised against an in-memory store in tests.
//! The Postgres implementation also carries the user-scoped CRUD queries
//! the HTTP layer needs; those sit outside the trait because only the
//! recompute machinery has to be storage-agnostic.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::habit::{CreateHabitRequest, Habit, HabitQuery};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("habit not found")]
    NotFound,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// The three operations streak recomputation needs from storage.
#[async_trait]
pub trait HabitStore: Send + Sync {
    /// Every habit still being tracked, across all users.
    async fn list_active(&self) -> Result<Vec<Habit>, StoreError>;

    /// One habit by id, regardless of owner.
    async fn find(&self, id: Uuid) -> Result<Option<Habit>, StoreError>;

    /// Writes the habit's state back. `best_streak` can only rise; the
    /// stored value wins if it is already higher.
    async fn persist(&self, habit: &Habit) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgHabitStore {
    pool: PgPool,
}

impl PgHabitStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        user_id: Uuid,
        req: &CreateHabitRequest,
    ) -> Result<Habit, StoreError> {
        let habit = sqlx::query_as::<_, Habit>(
            r#"
            INSERT INTO habits (id, user_id, title, description, color, icon, frequency, schedule, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.color.as_deref().unwrap_or("#3B82F6"))
        .bind(req.icon.as_deref().unwrap_or("check-circle"))
        .bind(req.frequency.clone().unwrap_or_default())
        .bind(req.schedule.clone().unwrap_or_default())
        .bind(req.start_date.unwrap_or_else(|| Utc::now().date_naive()))
        .bind(req.end_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(habit)
    }

    pub async fn find_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Habit>, StoreError> {
        let habit = sqlx::query_as::<_, Habit>(
            "SELECT * FROM habits WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(habit)
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: &HabitQuery,
    ) -> Result<Vec<Habit>, StoreError> {
        let habits = sqlx::query_as::<_, Habit>(
            r#"
            SELECT * FROM habits
            WHERE user_id = $1
              AND ($2::boolean IS NULL OR active = $2)
              AND ($3::habit_frequency IS NULL OR frequency = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(filter.active)
        .bind(filter.frequency.clone())
        .fetch_all(&self.pool)
        .await?;

        Ok(habits)
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM habits WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl HabitStore for PgHabitStore {
    async fn list_active(&self) -> Result<Vec<Habit>, StoreError> {
        let habits = sqlx::query_as::<_, Habit>(
            "SELECT * FROM habits WHERE active = TRUE ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(habits)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Habit>, StoreError> {
        let habit = sqlx::query_as::<_, Habit>("SELECT * FROM habits WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(habit)
    }

    async fn persist(&self, habit: &Habit) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE habits SET
                title = $2,
                description = $3,
                color = $4,
                icon = $5,
                frequency = $6,
                schedule = $7,
                start_date = $8,
                end_date = $9,
                active = $10,
                current_streak = $11,
                best_streak = GREATEST(best_streak, $12),
                last_completed_date = $13,
                check_ins = $14,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(habit.id)
        .bind(&habit.title)
        .bind(&habit.description)
        .bind(&habit.color)
        .bind(&habit.icon)
        .bind(habit.frequency.clone())
        .bind(&habit.schedule)
        .bind(habit.start_date)
        .bind(habit.end_date)
        .bind(habit.active)
        .bind(habit.current_streak)
        .bind(habit.best_streak)
        .bind(habit.last_completed_date)
        .bind(&habit.check_ins)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
pub mod memory {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;

    /// In-memory [`HabitStore`] with injectable failures, mirroring the
    /// Postgres store's contract (including the best-streak floor).
    pub struct MemoryHabitStore {
        habits: Mutex<Vec<Habit>>,
        listing_down: Mutex<bool>,
        persist_failures: Mutex<HashSet<Uuid>>,
    }

    impl MemoryHabitStore {
        pub fn with_habits(habits: Vec<Habit>) -> Self {
            Self {
                habits: Mutex::new(habits),
                listing_down: Mutex::new(false),
                persist_failures: Mutex::new(HashSet::new()),
            }
        }

        /// Makes every subsequent `list_active` fail, as if storage were down.
        pub fn fail_listing(&self) {
            *self.listing_down.lock().unwrap() = true;
        }

        /// Makes `persist` fail for one habit while others keep working.
        pub fn fail_persist_for(&self, id: Uuid) {
            self.persist_failures.lock().unwrap().insert(id);
        }
    }

    #[async_trait]
    impl HabitStore for MemoryHabitStore {
        async fn list_active(&self) -> Result<Vec<Habit>, StoreError> {
            if *self.listing_down.lock().unwrap() {
                return Err(StoreError::Unavailable("habit listing is down".into()));
            }
            Ok(self
                .habits
                .lock()
                .unwrap()
                .iter()
                .filter(|h| h.active)
                .cloned()
                .collect())
        }

        async fn find(&self, id: Uuid) -> Result<Option<Habit>, StoreError> {
            Ok(self
                .habits
                .lock()
                .unwrap()
                .iter()
                .find(|h| h.id == id)
                .cloned())
        }

        async fn persist(&self, habit: &Habit) -> Result<(), StoreError> {
            if self.persist_failures.lock().unwrap().contains(&habit.id) {
                return Err(StoreError::Unavailable(format!(
                    "persist rejected for habit {}",
                    habit.id
                )));
            }
            let mut habits = self.habits.lock().unwrap();
            let slot = habits
                .iter_mut()
                .find(|h| h.id == habit.id)
                .ok_or(StoreError::NotFound)?;
            let mut updated = habit.clone();
            updated.best_streak = slot.best_streak.max(habit.best_streak);
            *slot = updated;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryHabitStore;
    use super::*;
    use crate::models::habit::{CheckIn, Frequency};
    use chrono::NaiveDate;
    use sqlx::types::Json;

    fn habit(active: bool) -> Habit {
        Habit {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Journal".into(),
            description: None,
            color: "#3B82F6".into(),
            icon: "check-circle".into(),
            frequency: Frequency::Daily,
            schedule: vec![],
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
            active,
            current_streak: 0,
            best_streak: 0,
            last_completed_date: None,
            check_ins: Json(Vec::<CheckIn>::new()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_list_active_skips_paused_habits() {
        let active = habit(true);
        let paused = habit(false);
        let store = MemoryHabitStore::with_habits(vec![active.clone(), paused]);

        let listed = store.list_active().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, active.id);
    }

    #[tokio::test]
    async fn test_persist_keeps_best_streak_floor() {
        let mut h = habit(true);
        h.best_streak = 9;
        let store = MemoryHabitStore::with_habits(vec![h.clone()]);

        // A lower candidate must not lower the stored maximum.
        h.current_streak = 2;
        h.best_streak = 2;
        store.persist(&h).await.unwrap();

        let stored = store.find(h.id).await.unwrap().unwrap();
        assert_eq!(stored.current_streak, 2);
        assert_eq!(stored.best_streak, 9);
    }

    #[tokio::test]
    async fn test_persist_unknown_habit_is_not_found() {
        let store = MemoryHabitStore::with_habits(vec![]);
        let err = store.persist(&habit(true)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}
