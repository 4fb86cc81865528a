use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::calendar::{month_of, week_of, DateRange};
use crate::models::Task;
use crate::utils::{format_date, parse_date};

pub const IDENTITY_SENTENCES: [&str; 7] = [
    "Today is a new opportunity for clarity.",
    "Small actions lead to consistent results.",
    "Focus on the process, not the outcome.",
    "Discipline is the foundation of freedom.",
    "Observe without judgment, act with intent.",
    "Simplicity is the ultimate sophistication.",
    "One task at a time, with full presence.",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub pct: u32,
    pub completed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub reputation: i64,
    pub week: Completion,
    pub month: Completion,
    pub sentence: &'static str,
}

/// A task failed if it is still open and its day is before `today`.
fn is_failed(task: &Task, today: &str) -> bool {
    !task.completed && task.date.as_str() < today
}

/// +10 per completed task, -5 per failed one.
pub fn reputation(tasks: &[Task], today: NaiveDate) -> i64 {
    let today = format_date(today);
    let completed = tasks.iter().filter(|t| t.completed).count() as i64;
    let failed = tasks.iter().filter(|t| is_failed(t, &today)).count() as i64;
    completed * 10 - failed * 5
}

pub fn completion(tasks: &[Task], range: DateRange, today: NaiveDate) -> Completion {
    let today = format_date(today);
    let in_range: Vec<&Task> = tasks
        .iter()
        .filter(|t| parse_date(&t.date).is_ok_and(|d| range.contains(d)))
        .collect();
    let completed = in_range.iter().filter(|t| t.completed).count();
    let failed = in_range.iter().filter(|t| is_failed(t, &today)).count();
    let pct = if in_range.is_empty() {
        0
    } else {
        ((completed as f64 / in_range.len() as f64) * 100.0).round() as u32
    };
    Completion {
        pct,
        completed,
        failed,
    }
}

pub fn daily_sentence(today: NaiveDate) -> &'static str {
    IDENTITY_SENTENCES[today.ordinal() as usize % IDENTITY_SENTENCES.len()]
}

pub fn summarize(tasks: &[Task], today: NaiveDate) -> Summary {
    Summary {
        reputation: reputation(tasks, today),
        week: completion(tasks, week_of(today), today),
        month: completion(tasks, month_of(today), today),
        sentence: daily_sentence(today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(date: &str, completed: bool) -> Task {
        Task {
            id: 0,
            user_id: "alice".to_string(),
            date: date.to_string(),
            content: "x".to_string(),
            completed,
            created_at: String::new(),
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn reputation_rewards_done_and_penalizes_overdue() {
        let today = d(2026, 3, 10);
        let tasks = vec![
            task("2026-03-01", true),
            task("2026-03-02", true),
            task("2026-03-09", false), // failed
            task("2026-03-10", false), // due today, not failed
            task("2026-03-20", false),
        ];
        assert_eq!(reputation(&tasks, today), 15);
    }

    #[test]
    fn completion_counts_only_tasks_in_range() {
        let today = d(2026, 3, 10);
        let tasks = vec![
            task("2026-03-08", true),
            task("2026-03-09", false),
            task("2026-03-11", true),
            task("2026-02-28", true),
        ];
        let week = completion(&tasks, week_of(today), today);
        assert_eq!(week, Completion { pct: 67, completed: 2, failed: 1 });

        let empty = completion(&[], week_of(today), today);
        assert_eq!(empty.pct, 0);
    }

    #[test]
    fn sentence_rotates_by_day_of_year() {
        assert_ne!(daily_sentence(d(2026, 1, 1)), daily_sentence(d(2026, 1, 2)));
        assert_eq!(daily_sentence(d(2026, 1, 1)), daily_sentence(d(2026, 1, 8)));
    }
}
