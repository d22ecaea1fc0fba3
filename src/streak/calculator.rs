//! Streak computation over a habit's check-in history.
//!
//! The calculator is pure: it reads check-ins plus the habit's cadence and
//! returns a [`StreakResult`] without touching the habit or doing any I/O.
//! Daily habits count consecutive completed days ending today or yesterday.
//! Weekly and custom habits count consecutive Sunday-anchored weeks in which
//! every scheduled day was completed, judging the in-progress week only on
//! days already due.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};

use crate::models::habit::{Cadence, CheckIn, Habit};
use crate::streak::dates;

/// What the calculator reports back to its caller. `last_completed_date`
/// survives a broken streak: it records the most recent satisfied date even
/// when `streak` is zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakResult {
    pub streak: i32,
    pub last_completed_date: Option<NaiveDate>,
}

impl StreakResult {
    fn none() -> Self {
        Self {
            streak: 0,
            last_completed_date: None,
        }
    }
}

pub fn compute_streak(habit: &Habit, today: NaiveDate) -> StreakResult {
    match habit.cadence() {
        Cadence::Daily => daily_streak(habit.check_ins.as_slice(), today),
        Cadence::Weekly { schedule } => {
            weekly_streak(&schedule, habit.check_ins.as_slice(), today)
        }
    }
}

fn daily_streak(check_ins: &[CheckIn], today: NaiveDate) -> StreakResult {
    // Only completed check-ins count, and a date logged ahead of today can
    // never seed a live streak.
    let mut completed: Vec<NaiveDate> = check_ins
        .iter()
        .filter(|c| c.completed && c.date <= today)
        .map(|c| c.date)
        .collect();
    completed.sort_unstable_by(|a, b| b.cmp(a));

    if completed.is_empty() {
        return StreakResult::none();
    }

    let latest = completed[0];

    // Two or more silent days break the chain outright; the last completion
    // is still reported so the UI can show when the streak died.
    if dates::days_between(today, latest) > 1 {
        return StreakResult {
            streak: 0,
            last_completed_date: Some(latest),
        };
    }

    let mut streak = 1;
    let mut cursor = latest;
    for &candidate in &completed[1..] {
        if dates::days_between(cursor, candidate) == 1 {
            streak += 1;
            cursor = candidate;
        } else {
            // First gap ends the walk; gaps are never skipped over.
            break;
        }
    }

    StreakResult {
        streak,
        last_completed_date: Some(latest),
    }
}

fn weekly_streak(
    schedule: &BTreeSet<u8>,
    check_ins: &[CheckIn],
    today: NaiveDate,
) -> StreakResult {
    let valid: Vec<&CheckIn> = check_ins.iter().filter(|c| c.date <= today).collect();
    if valid.is_empty() || schedule.is_empty() {
        return StreakResult::none();
    }

    // Bucket check-ins by their week's Sunday anchor. Uncompleted check-ins
    // still create their week's bucket, so that week gets judged (and fails)
    // instead of being invisible to the walk.
    let mut weeks: BTreeMap<NaiveDate, Vec<&CheckIn>> = BTreeMap::new();
    for check_in in valid {
        weeks
            .entry(dates::week_start(check_in.date))
            .or_default()
            .push(check_in);
    }

    let current_week = dates::week_start(today);

    let mut streak = 0;
    let mut last_completed_date: Option<NaiveDate> = None;
    let mut prev_anchor: Option<NaiveDate> = None;

    // Newest week first. Only weeks that have at least one check-in appear
    // here; a fully silent week is caught by the anchor-adjacency check.
    for (&anchor, week_check_ins) in weeks.iter().rev() {
        let is_current_week = anchor == current_week;
        let mut all_due_days_satisfied = true;

        for &day in schedule {
            let scheduled_date = anchor + Duration::days(dates::iso_day_offset(day));

            // A week in progress is judged only on days already due.
            if is_current_week && scheduled_date > today {
                continue;
            }

            let satisfied = week_check_ins
                .iter()
                .any(|c| c.date == scheduled_date && c.completed);
            if !satisfied {
                all_due_days_satisfied = false;
                break;
            }

            // Runs for every satisfied day, so a week that fails on a later
            // scheduled day still leaves its earlier completions recorded.
            if last_completed_date.map_or(true, |d| scheduled_date > d) {
                last_completed_date = Some(scheduled_date);
            }
        }

        if !all_due_days_satisfied {
            // Any unsatisfied week ends the walk, the in-progress week
            // included. Matches the long-shipped behavior that existing
            // streak numbers depend on.
            break;
        }

        streak += 1;

        // A satisfied week counts before its adjacency is checked; a week
        // separated by more than 7 days still scores, the walk just ends.
        if let Some(prev) = prev_anchor {
            if dates::days_between(prev, anchor) != 7 {
                break;
            }
        }
        prev_anchor = Some(anchor);
    }

    StreakResult {
        streak,
        last_completed_date,
    }
}
