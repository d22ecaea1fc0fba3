//! Writes calculator output back onto a habit and into the store.
//!
//! Both call sites share this path: request handlers refresh on every read
//! and check-in mutation, and the nightly sweep refreshes every active
//! habit. Keeping the mutation in one place is what keeps the two paths
//! from drifting.

use chrono::NaiveDate;

use crate::db::store::{HabitStore, StoreError};
use crate::models::habit::Habit;
use crate::streak::calculator::{self, StreakResult};

/// Applies a calculator result to the habit's derived fields.
/// `best_streak` is a historic maximum and only ever rises;
/// `last_completed_date` takes the result verbatim, so a broken streak
/// still records when the habit was last satisfied.
pub fn apply(habit: &mut Habit, result: &StreakResult) {
    habit.current_streak = result.streak;
    habit.best_streak = habit.best_streak.max(result.streak);
    habit.last_completed_date = result.last_completed_date;
}

/// Recomputes the habit's streak as of `today` and persists the outcome.
pub async fn refresh_streak<S: HabitStore + ?Sized>(
    store: &S,
    habit: &mut Habit,
    today: NaiveDate,
) -> Result<(), StoreError> {
    let result = calculator::compute_streak(habit, today);
    apply(habit, &result);
    store.persist(habit).await
}
