//! Nightly sweep that recomputes every active habit's streak.
//!
//! User-facing reads already refresh streaks on demand, but a habit nobody
//! opens would keep a stale streak forever. The sweep walks all active
//! habits once per day so streaks that should break in silence do break.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::db::store::{HabitStore, PgHabitStore, StoreError};
use crate::streak::{calculator, recompute};

/// Aggregate outcome of one sweep run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepSummary {
    /// Habits whose recomputed state was written back successfully.
    pub updated_count: u32,
    /// Habits whose streak went from positive to zero purely by elapsed
    /// time. Counted even when the subsequent write fails.
    pub broken_streaks_count: u32,
}

/// Recomputes and persists streaks for all active habits as of `today`.
///
/// Per-habit persistence failures are logged and skipped; one bad record
/// must never abort the sweep. Only a failure to list the active habits in
/// the first place is fatal.
pub async fn run_streak_sweep<S: HabitStore + ?Sized>(
    store: &S,
    today: NaiveDate,
) -> Result<SweepSummary, StoreError> {
    tracing::info!("Starting daily habit streak sweep");

    let habits = store.list_active().await?;
    tracing::info!(count = habits.len(), "Found active habits to check");

    let mut summary = SweepSummary {
        updated_count: 0,
        broken_streaks_count: 0,
    };

    for mut habit in habits {
        let previous_streak = habit.current_streak;
        let result = calculator::compute_streak(&habit, today);

        if previous_streak > 0 && result.streak == 0 {
            summary.broken_streaks_count += 1;
            tracing::info!(
                habit_id = %habit.id,
                title = %habit.title,
                previous_streak,
                "Streak broken by elapsed time"
            );
        }

        recompute::apply(&mut habit, &result);
        match store.persist(&habit).await {
            Ok(()) => summary.updated_count += 1,
            Err(e) => {
                tracing::error!(
                    habit_id = %habit.id,
                    error = %e,
                    "Failed to update streak, continuing sweep"
                );
            }
        }
    }

    tracing::info!(
        updated = summary.updated_count,
        broken = summary.broken_streaks_count,
        "Daily streak sweep complete"
    );

    Ok(summary)
}

/// Time left until the next UTC midnight, when the sweep is due.
pub fn duration_until_next_midnight(now: DateTime<Utc>) -> std::time::Duration {
    let tomorrow = now.date_naive() + Duration::days(1);
    let next_midnight = Utc.from_utc_datetime(&tomorrow.and_time(NaiveTime::MIN));
    (next_midnight - now).to_std().unwrap_or_default()
}

/// Runs the sweep once per day at UTC midnight for the lifetime of the
/// process.
pub fn spawn_streak_sweep_worker(store: PgHabitStore) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(duration_until_next_midnight(Utc::now())).await;
            let today = Utc::now().date_naive();
            if let Err(e) = run_streak_sweep(&store, today).await {
                tracing::error!(error = %e, "Daily streak sweep failed");
            }
        }
    });
}
